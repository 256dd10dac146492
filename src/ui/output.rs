use crate::ui::{stderr_theme, theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().title));
}

pub fn success(message: &str) {
    println!("{} {}", Icons::CHECK, message.style(theme().ok));
}

pub fn error(message: &str) {
    eprintln!("{} {}", Icons::CROSS, message.style(stderr_theme().failure));
}

pub fn info(label: &str, value: &str) {
    let theme = theme();
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme.accent),
        label.style(theme.label),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().title));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label), value);
}
