use crate::Result;
use crate::models::{AnalysisResult, TrendDirection};
use core::fmt::Write;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

pub fn generate<W: Write>(result: &AnalysisResult, use_colors: bool, writer: &mut W) -> Result<()> {
    let heading = format!("Issue analysis for {}", result.repo);
    if use_colors {
        writeln!(writer, "{}", heading.bold())?;
    } else {
        writeln!(writer, "{heading}")?;
    }
    writeln!(writer, "{}", "═".repeat(heading.chars().count()))?;
    writeln!(writer)?;

    let metrics = &result.metrics;
    writeln!(writer, "  {:<22} : {}", "Issues matched", metrics.total_matched)?;
    writeln!(writer, "  {:<22} : {}", "Issues examined", metrics.total_analyzed)?;
    writeln!(writer, "  {:<22} : {}", "Open", metrics.open_issues)?;
    writeln!(writer, "  {:<22} : {}", "Closed", metrics.closed_issues)?;
    writeln!(writer, "  {:<22} : {:.1}", "Avg comments", metrics.avg_comment_count)?;

    if let Some(avg) = metrics.avg_resolution_days {
        writeln!(writer, "  {:<22} : {avg:.1} days", "Avg resolution time")?;
    }

    writeln!(writer, "  {:<22} : {:.1}s", "Processing time", result.processing_time.as_secs_f64())?;

    if result.limit_reached {
        writeln!(writer)?;
        let note = "Match limit reached; more issues may qualify.";
        if use_colors {
            writeln!(writer, "  {}", note.yellow())?;
        } else {
            writeln!(writer, "  {note}")?;
        }
    }

    if !result.warnings.is_empty() {
        section(writer, use_colors, "Warnings")?;
        for warning in &result.warnings {
            if use_colors {
                writeln!(writer, "  {}", warning.yellow())?;
            } else {
                writeln!(writer, "  {warning}")?;
            }
        }
    }

    if metrics.total_matched == 0 {
        writeln!(writer)?;
        writeln!(writer, "No issues matched the given criteria.")?;
        return Ok(());
    }

    section(writer, use_colors, "Comment activity")?;
    for bucket in &metrics.comment_histogram {
        writeln!(writer, "  {:<6} : {}", bucket.label, bucket.count)?;
    }

    if !metrics.top_labels.is_empty() {
        section(writer, use_colors, "Top labels")?;
        for label in &metrics.top_labels {
            writeln!(writer, "  {:<24} : {}", truncate(&label.label, 24), label.count)?;
        }
    }

    if !metrics.trending_labels.is_empty() {
        section(writer, use_colors, "Trending labels (last 30 days vs prior 30)")?;
        for trend in &metrics.trending_labels {
            let line = format!(
                "  ▲ {:<22} {:+.0}% ({} → {})",
                truncate(&trend.label, 22),
                trend.percent_change,
                trend.previous_count,
                trend.current_count
            );
            if use_colors {
                writeln!(writer, "{}", line.green())?;
            } else {
                writeln!(writer, "{line}")?;
            }
        }
    }

    if !metrics.new_labels.is_empty() {
        section(writer, use_colors, "New labels (no activity in prior 30 days)")?;
        for label in &metrics.new_labels {
            writeln!(writer, "  {:<24} : {}", truncate(&label.label, 24), label.count)?;
        }
    }

    if !metrics.most_active_users.is_empty() {
        section(writer, use_colors, "Most active users")?;
        for user in &metrics.most_active_users {
            writeln!(
                writer,
                "  {:<20} : {} comment(s), {} issue(s)",
                truncate(&user.username, 20),
                user.comments_written,
                user.issues_created
            )?;
        }
    }

    if !metrics.activity_timeline.is_empty() {
        let granularity = metrics
            .bucket_granularity
            .map_or_else(String::new, |g| format!(" ({g})"));
        section(writer, use_colors, &format!("Issues created over time{granularity}"))?;

        let max = metrics.activity_timeline.iter().map(|b| b.issue_count).max().unwrap_or(1).max(1);
        let bar_width = get_terminal_width().saturating_sub(44).clamp(10, 50);
        for bucket in &metrics.activity_timeline {
            let filled = (bucket.issue_count as usize * bar_width).div_ceil(max as usize);
            let glyph = match bucket.trend {
                TrendDirection::Up => "↑",
                TrendDirection::Down => "↓",
                TrendDirection::Flat => "→",
            };
            writeln!(
                writer,
                "  {:<10} {:>5} {glyph}  avg {:>4.1}, {:>3} commenter(s)  {}",
                bucket.period,
                bucket.issue_count,
                bucket.avg_comments,
                bucket.unique_commenters,
                "▇".repeat(filled)
            )?;
        }
    }

    section(writer, use_colors, "Matched issues")?;
    for issue in &result.issues {
        let mut line = format!("  #{:<6} {:<7} {}", issue.number, issue.state.as_str(), truncate(&issue.title, 60));
        if issue.comments_unavailable {
            line.push_str("  [comments unavailable]");
        }
        writeln!(writer, "{line}")?;
    }

    Ok(())
}

fn section<W: Write>(writer: &mut W, use_colors: bool, title: &str) -> Result<()> {
    writeln!(writer)?;
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }

    Ok(())
}

/// Get the terminal width, defaulting to 80 if not detectable
fn get_terminal_width() -> usize {
    terminal_size().map_or(80, |(Width(w), _)| w as usize)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }

    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityMetrics, FilterCriteria, Issue, IssueState, LabelCount, RepoDescriptor};
    use chrono::{TimeZone, Utc};
    use core::time::Duration;

    fn result(issues: Vec<Issue>) -> AnalysisResult {
        let metrics = crate::analysis::compute_metrics(&issues, &issues, issues.len() as u64, Utc::now());
        AnalysisResult {
            repo: RepoDescriptor {
                owner: "rust-lang".to_string(),
                name: "cargo".to_string(),
                url: "https://github.com/rust-lang/cargo".to_string(),
            },
            criteria: FilterCriteria::default(),
            issues,
            metrics,
            generated_at: Utc::now(),
            processing_time: Duration::from_millis(1500),
            warnings: Vec::new(),
            limit_reached: false,
        }
    }

    fn issue(number: u64, title: &str) -> Issue {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Issue {
            id: number + 1000,
            number,
            title: title.to_string(),
            body: None,
            state: IssueState::Open,
            author: Some("alice".to_string()),
            labels: vec!["bug".to_string()],
            assignees: vec![],
            comment_count: 3,
            created_at: at,
            updated_at: at,
            closed_at: None,
            url: String::new(),
            comments: vec![],
            comments_unavailable: false,
        }
    }

    #[test]
    fn empty_result_reports_no_matches() {
        let mut out = String::new();
        generate(&result(vec![]), false, &mut out).unwrap();
        assert!(out.contains("rust-lang/cargo"));
        assert!(out.contains("No issues matched"));
    }

    #[test]
    fn matched_issues_listed() {
        let mut out = String::new();
        generate(&result(vec![issue(7, "Broken build")]), false, &mut out).unwrap();
        assert!(out.contains("#7"));
        assert!(out.contains("Broken build"));
        assert!(out.contains("Top labels"));
        assert!(out.contains("bug"));
    }

    #[test]
    fn comments_unavailable_marker_shown() {
        let mut unavailable = issue(9, "Flaky test");
        unavailable.comments_unavailable = true;
        let mut out = String::new();
        generate(&result(vec![unavailable]), false, &mut out).unwrap();
        assert!(out.contains("[comments unavailable]"));
    }

    #[test]
    fn limit_note_shown() {
        let mut r = result(vec![issue(1, "a")]);
        r.limit_reached = true;
        let mut out = String::new();
        generate(&r, false, &mut out).unwrap();
        assert!(out.contains("Match limit reached"));
    }

    #[test]
    fn warnings_listed() {
        let mut r = result(vec![issue(1, "a")]);
        r.warnings.push("could not fetch comments for issue #1: boom".to_string());
        let mut out = String::new();
        generate(&r, false, &mut out).unwrap();
        assert!(out.contains("Warnings"));
        assert!(out.contains("issue #1"));
    }

    #[test]
    fn colored_output_still_contains_text() {
        let mut r = result(vec![issue(1, "a")]);
        r.metrics = ActivityMetrics {
            top_labels: vec![LabelCount {
                label: "bug".to_string(),
                count: 1,
            }],
            ..r.metrics
        };
        let mut out = String::new();
        generate(&r, true, &mut out).unwrap();
        assert!(out.contains("Issue analysis"));
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-much-longer-string", 8), "a-much-…");
    }
}
