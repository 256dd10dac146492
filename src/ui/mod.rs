pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, section, success, summary_row};
pub use table::{distribution_table, stats_table};
pub use theme::{stderr_theme, theme, Theme};
