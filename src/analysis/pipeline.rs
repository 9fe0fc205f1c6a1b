//! The analysis pipeline: validate, fetch, filter, enrich, and measure.

use super::filter::FilterEngine;
use super::metrics::compute_metrics;
use crate::Result;
use crate::github::{IssueSource, PageFetch, ServerFilter};
use crate::models::{AnalysisResult, FilterCriteria, Issue, Phase, ProgressTracker};
use chrono::Utc;
use ohno::bail;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const LOG_TARGET: &str = "analysis";

/// Give up fetching after this many failed pages in a row. The Link header
/// of a failed page never arrives, so this is the only way the loop can end
/// on a persistently broken remote.
const MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Issues created within this many days feed the label trend windows.
const TREND_RETENTION_DAYS: i64 = 60;

/// Shared cancellation signal, typically set from a Ctrl-C handler.
pub type CancelFlag = Arc<AtomicBool>;

/// Drives one analysis run from criteria to [`AnalysisResult`].
///
/// Issues stream in page by page and are filtered as they arrive, so a run
/// with a match limit stops fetching as soon as the limit is reached.
/// Cancellation stops retrieval at the next page or comment boundary and
/// yields whatever was accumulated, with a warning attached.
pub struct Analyzer {
    source: IssueSource,
    progress: Arc<ProgressTracker>,
    cancel: CancelFlag,
}

/// What the page loop accumulated.
struct Collected {
    matched: Vec<Issue>,
    trend_window: Vec<Issue>,
    examined: u64,
    limit_reached: bool,
}

impl Analyzer {
    pub fn new(source: IssueSource, progress: Arc<ProgressTracker>, cancel: CancelFlag) -> Self {
        Self {
            source,
            progress,
            cancel,
        }
    }

    pub async fn run(&self, criteria: &FilterCriteria) -> Result<AnalysisResult> {
        let started = Instant::now();

        self.progress.start_phase(Phase::Validating, "validating criteria");
        criteria.validate()?;

        let mut warnings = Vec::new();
        let mut collected = self.collect_matching(criteria, &mut warnings).await?;

        if criteria.include_comments {
            self.retrieve_comments(&mut collected.matched, &mut warnings).await;
        }

        self.progress.start_phase(Phase::CalculatingMetrics, "calculating metrics");
        let metrics = compute_metrics(&collected.matched, &collected.trend_window, collected.examined, Utc::now());

        log::info!(
            target: LOG_TARGET,
            "Matched {} of {} issues in '{}'",
            collected.matched.len(),
            collected.examined,
            self.source.repo()
        );

        Ok(AnalysisResult {
            repo: self.source.repo().descriptor(),
            criteria: criteria.clone(),
            issues: collected.matched,
            metrics,
            generated_at: Utc::now(),
            processing_time: started.elapsed(),
            warnings,
            limit_reached: collected.limit_reached,
        })
    }

    /// Streams pages and filters them, stopping at the match limit. Retains
    /// an unfiltered copy of recent issues for trend analysis.
    async fn collect_matching(&self, criteria: &FilterCriteria, warnings: &mut Vec<String>) -> Result<Collected> {
        let server_filter = ServerFilter::from_criteria(criteria);
        let mut engine = FilterEngine::new(criteria);
        let limit = criteria.limit.map(|l| l as usize);
        let trend_cutoff = Utc::now() - chrono::Duration::days(TREND_RETENTION_DAYS);

        let mut matched = Vec::new();
        let mut trend_window = Vec::new();
        let mut limit_reached = false;
        let mut consecutive_failures = 0u32;
        let mut page = 1u32;

        self.progress.start_phase(Phase::Fetching, "fetching issues");

        loop {
            if self.cancelled(warnings) {
                break;
            }

            self.progress.set_message(format!("fetching page {page}"));

            let fetched = match self.source.fetch_page(&server_filter, page).await {
                Ok(PageFetch::Page(p)) => {
                    consecutive_failures = 0;
                    p
                }
                Ok(PageFetch::NotFound) => bail!("repository '{}' not found", self.source.repo()),
                Err(e) => {
                    consecutive_failures += 1;
                    let warning =
                        format!("could not fetch issue page {page} for '{}': {e:#}", self.source.repo());
                    log::warn!(target: LOG_TARGET, "{warning}");
                    self.progress.warn(&warning);
                    warnings.push(warning);

                    if consecutive_failures >= MAX_CONSECUTIVE_PAGE_FAILURES {
                        log::warn!(
                            target: LOG_TARGET,
                            "Giving up after {consecutive_failures} consecutive page failures"
                        );
                        break;
                    }

                    page += 1;
                    continue;
                }
            };

            for issue in fetched.issues {
                if issue.created_at >= trend_cutoff {
                    trend_window.push(issue.clone());
                }

                if engine.matches(&issue) {
                    matched.push(issue);

                    if limit.is_some_and(|l| matched.len() >= l) {
                        limit_reached = true;
                        break;
                    }
                }
            }
            self.progress.advance(engine.examined());

            if limit_reached || !fetched.has_next {
                break;
            }

            page += 1;
        }

        // Filtering already happened inline; surface it as its own phase so
        // observers see the full sequence.
        self.progress.start_phase(Phase::Filtering, "applying filters");
        self.progress.set_total(engine.examined());
        self.progress.advance(engine.examined());

        Ok(Collected {
            matched,
            trend_window,
            examined: engine.examined(),
            limit_reached,
        })
    }

    /// Fetches comment bodies for each matched issue. A failed fetch keeps
    /// the issue in the result set, flagged as missing its comments.
    async fn retrieve_comments(&self, issues: &mut [Issue], warnings: &mut Vec<String>) {
        self.progress.start_phase(Phase::RetrievingComments, "retrieving comments");
        self.progress.set_total(issues.len() as u64);

        for (done, issue) in issues.iter_mut().enumerate() {
            if self.cancelled(warnings) {
                break;
            }

            if issue.comment_count > 0 {
                match self.source.fetch_comments(issue.number).await {
                    Ok(comments) => issue.comments = comments,
                    Err(e) => {
                        let warning = format!("could not fetch comments for issue #{}: {e:#}", issue.number);
                        log::warn!(target: LOG_TARGET, "{warning} ('{}')", self.source.repo());
                        self.progress.warn(&warning);
                        warnings.push(warning);
                        issue.comments_unavailable = true;
                    }
                }
            }

            self.progress.advance(done as u64 + 1);
        }
    }

    /// Checks the cancel flag, recording a warning the first time it trips.
    fn cancelled(&self, warnings: &mut Vec<String>) -> bool {
        if !self.cancel.load(Ordering::Relaxed) {
            return false;
        }

        if !warnings.iter().any(|w| w.contains("cancelled")) {
            let warning = "analysis cancelled, results are partial".to_string();
            log::warn!(target: LOG_TARGET, "{warning}");
            self.progress.warn(&warning);
            warnings.push(warning);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Client, RepoRef};

    fn analyzer(cancelled: bool) -> Analyzer {
        let client = Client::new(None, "http://127.0.0.1:1").unwrap();
        let repo = RepoRef::parse("o/r").unwrap();
        Analyzer::new(
            IssueSource::new(client, repo),
            Arc::new(ProgressTracker::new(None)),
            Arc::new(AtomicBool::new(cancelled)),
        )
    }

    #[tokio::test]
    async fn invalid_criteria_fails_before_any_fetch() {
        let criteria = FilterCriteria {
            limit: Some(0),
            ..FilterCriteria::default()
        };

        // The base URL is unroutable, so an error here proves validation
        // happened first.
        let err = analyzer(false).run(&criteria).await.unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[tokio::test]
    async fn cancellation_yields_partial_result() {
        let result = analyzer(true).run(&FilterCriteria::default()).await.unwrap();
        assert!(result.issues.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("cancelled")));
    }
}
