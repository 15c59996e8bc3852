//! Terminal output: theme, spinners and tables.

pub mod spinner;
pub mod table;
pub mod theme;

pub use spinner::{live_output_callback, ProgressSpinner};
pub use table::{outcome_table, package_table, source_table, Table};
pub use theme::{should_use_colors, Theme};
