//! Colour roles for CLI output.
//!
//! Styling is decided per stream: `export` can pipe CSV from stdout while
//! errors still go to a terminal on stderr. `NO_COLOR` (any non-empty value)
//! turns styling off everywhere.

use console::Term;
use owo_colors::Style;
use std::ffi::OsString;
use std::sync::OnceLock;

static STDOUT: OnceLock<Theme> = OnceLock::new();
static STDERR: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    /// Banner and section titles
    pub title: Style,
    /// Completed actions (init, export)
    pub ok: Style,
    /// Fatal problems reported before exiting
    pub failure: Style,
    /// Left-hand labels of summary rows
    pub label: Style,
    /// Icons and highlighted values
    pub accent: Style,
}

impl Theme {
    pub fn new(styled: bool) -> Self {
        let pick = |style: Style| if styled { style } else { Style::new() };
        Self {
            title: pick(Style::new().cyan().bold()),
            ok: pick(Style::new().green().bold()),
            failure: pick(Style::new().red().bold()),
            label: pick(Style::new().dimmed()),
            accent: pick(Style::new().magenta()),
        }
    }

    fn for_term(term: &Term) -> Self {
        Self::new(wants_color(term.is_term(), std::env::var_os("NO_COLOR")))
    }
}

fn wants_color(is_term: bool, no_color: Option<OsString>) -> bool {
    is_term && no_color.is_none_or(|v| v.is_empty())
}

/// Theme for text written to stdout
pub fn theme() -> &'static Theme {
    STDOUT.get_or_init(|| Theme::for_term(&Term::stdout()))
}

/// Theme for text written to stderr
pub fn stderr_theme() -> &'static Theme {
    STDERR.get_or_init(|| Theme::for_term(&Term::stderr()))
}
