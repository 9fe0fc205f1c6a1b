//! Command-line surface of the issuelens tool.

mod analyze;
mod common;
mod progress_bar;
mod run;

pub use run::run;
