//! The analyze command: resolve the repository, run the pipeline, and emit
//! the selected report.

use super::common::{self, ColorMode, LogLevel};
use super::progress_bar::ProgressReporter;
use chrono::{DateTime, Utc};
use clap::Args;
use issuelens::Result;
use issuelens::analysis::{Analyzer, CancelFlag};
use issuelens::github::{Client, DEFAULT_BASE_URL, IssueSource, RepoRef};
use issuelens::models::{
    AnalysisResult, DEFAULT_PAGE_SIZE, FilterCriteria, MatchMode, Phase, ProgressTracker, StateFilter,
};
use issuelens::reports::{OutputFormat, generate_console, generate_csv, generate_json};
use ohno::IntoAppError;
use std::fs;
use std::io::{IsTerminal, Write, stderr, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Repository to analyze, as OWNER/REPO or a GitHub URL
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN")]
    pub github_token: Option<String>,

    /// Which issue states to include
    #[arg(long, value_name = "STATE", default_value = "open", help_heading = "Filters")]
    pub state: StateFilter,

    /// Only include issues carrying this label (repeatable)
    #[arg(long = "label", value_name = "LABEL", help_heading = "Filters")]
    pub labels: Vec<String>,

    /// How multiple --label values combine
    #[arg(long, value_name = "MODE", default_value = "any", help_heading = "Filters")]
    pub label_mode: MatchMode,

    /// Only include issues assigned to this user (repeatable)
    #[arg(long = "assignee", value_name = "USER", help_heading = "Filters")]
    pub assignees: Vec<String>,

    /// How multiple --assignee values combine
    #[arg(long, value_name = "MODE", default_value = "any", help_heading = "Filters")]
    pub assignee_mode: MatchMode,

    /// Only include issues with at least this many comments
    #[arg(long, value_name = "N", help_heading = "Filters")]
    pub min_comments: Option<u32>,

    /// Only include issues with at most this many comments
    #[arg(long, value_name = "N", help_heading = "Filters")]
    pub max_comments: Option<u32>,

    /// Only issues created on or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = common::parse_utc_date, help_heading = "Filters")]
    pub created_after: Option<DateTime<Utc>>,

    /// Only issues created on or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = common::parse_utc_date, help_heading = "Filters")]
    pub created_before: Option<DateTime<Utc>>,

    /// Only issues updated on or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = common::parse_utc_date, help_heading = "Filters")]
    pub updated_after: Option<DateTime<Utc>>,

    /// Only issues updated on or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", value_parser = common::parse_utc_date, help_heading = "Filters")]
    pub updated_before: Option<DateTime<Utc>>,

    /// Stop after this many matching issues
    #[arg(long, value_name = "N", help_heading = "Filters")]
    pub limit: Option<u32>,

    /// Fetch comment bodies for matching issues
    #[arg(long)]
    pub include_comments: bool,

    /// Issues to request per API page
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Report format
    #[arg(long, value_name = "FORMAT", default_value = "table", help_heading = "Report Output")]
    pub format: OutputFormat,

    /// Write the report to a file instead of the terminal
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub output: Option<PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

impl AnalyzeArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            state: self.state,
            min_comments: self.min_comments,
            max_comments: self.max_comments,
            labels: self.labels.clone(),
            label_mode: self.label_mode,
            assignees: self.assignees.clone(),
            assignee_mode: self.assignee_mode,
            created_after: self.created_after,
            created_before: self.created_before,
            updated_after: self.updated_after,
            updated_before: self.updated_before,
            limit: self.limit,
            include_comments: self.include_comments,
            page_size: self.page_size,
        }
    }
}

pub async fn analyze(args: &AnalyzeArgs) -> Result<()> {
    common::init_logging(args.log_level);

    let repo = RepoRef::parse(&args.repo)?;
    let criteria = args.criteria();

    let progress_colors = match args.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => stderr().is_terminal(),
    };
    let reporter = ProgressReporter::new(progress_colors);
    let tracker = Arc::new(ProgressTracker::new(Some(reporter.listener())));

    let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        let _ = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let client = Client::new(args.github_token.as_deref(), DEFAULT_BASE_URL)?;
    let analyzer = Analyzer::new(IssueSource::new(client, repo), Arc::clone(&tracker), cancel);
    let result = analyzer.run(&criteria).await?;

    tracker.start_phase(Phase::GeneratingOutput, "rendering report");

    let report_colors = args.format == OutputFormat::Table
        && args.output.is_none()
        && match args.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        };

    let rendered = render(&result, args.format, report_colors)?;

    tracker.start_phase(Phase::Completed, "done");
    reporter.finish();

    if let Some(path) = &args.output {
        fs::write(path, rendered).into_app_err("writing report file")?;
    } else {
        stdout().write_all(rendered.as_bytes())?;
    }

    Ok(())
}

fn render(result: &AnalysisResult, format: OutputFormat, use_colors: bool) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut out = String::new();
            generate_console(result, use_colors, &mut out)?;
            Ok(out)
        }
        OutputFormat::Json => {
            let mut out = String::new();
            generate_json(result, &mut out)?;
            Ok(out)
        }
        OutputFormat::Csv => {
            let mut out = Vec::new();
            generate_csv(result, &mut out)?;
            String::from_utf8(out).into_app_err("encoding CSV output")
        }
    }
}
