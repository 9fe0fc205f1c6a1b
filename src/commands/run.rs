//! Command dispatch logic for issuelens

use super::analyze::{self, AnalyzeArgs};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use issuelens::Result;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "issuelens", version, author)]
#[command(about = "Analyze issue activity in a GitHub repository")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    args: AnalyzeArgs,
}

/// Parse command-line arguments and run the analysis.
///
/// # Errors
///
/// Returns an error if argument parsing fails or if the analysis fails
pub async fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    analyze::analyze(&cli.args).await
}
