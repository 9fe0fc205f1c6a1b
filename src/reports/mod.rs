//! Report generation for analysis results.
//!
//! Three generators are provided, each accessed through a `generate` function:
//! - **Console**: human-readable terminal output with optional ANSI colors
//! - **JSON**: the full result as machine-readable structured data
//! - **CSV**: one row per matched issue for spreadsheet import

mod console;
mod csv;
mod json;

pub use console::generate as generate_console;
pub use csv::generate as generate_csv;
pub use json::generate as generate_json;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}
