//! Aggregate metric computation over a matched issue set.

use super::comments::CommentAggregator;
use crate::models::{
    ActivityBucket, ActivityMetrics, BucketGranularity, Issue, IssueState, LabelCount, LabelTrend,
    TrendDirection,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

const TOP_LIMIT: usize = 10;

/// Width of the two label trend windows.
const TREND_WINDOW_DAYS: i64 = 30;

/// A label needs at least this many occurrences across both windows before
/// its movement counts as a trend.
const TREND_MIN_TOTAL: u32 = 5;

const TREND_MIN_PERCENT: f64 = 25.0;

/// Below this many issues the timeline stays daily.
const DAILY_THRESHOLD: usize = 50;

/// Above this many issues the timeline goes monthly.
const MONTHLY_THRESHOLD: usize = 100;

/// Computes every aggregate metric.
///
/// `matched` drives everything except the trend windows, which are computed
/// over `trend_window`, a wider unfiltered set so that narrow criteria do
/// not distort label movement. `now` anchors the windows: the current one
/// covers the last [`TREND_WINDOW_DAYS`] days, the previous one the 30 days
/// before that. `examined` is the number of issues inspected overall.
#[must_use]
pub fn compute_metrics(
    matched: &[Issue],
    trend_window: &[Issue],
    examined: u64,
    now: DateTime<Utc>,
) -> ActivityMetrics {
    let open_issues = matched.iter().filter(|i| i.state == IssueState::Open).count() as u32;
    let closed_issues = matched.len() as u32 - open_issues;

    let (trending_labels, new_labels) = label_trends(trend_window, now);
    let granularity = pick_granularity(matched.len());

    let mut aggregator = CommentAggregator::new();
    for issue in matched {
        aggregator.record(issue);
    }

    ActivityMetrics {
        total_analyzed: examined,
        total_matched: matched.len() as u32,
        open_issues,
        closed_issues,
        avg_comment_count: avg_comment_count(matched),
        avg_resolution_days: avg_resolution_days(matched),
        comment_histogram: comment_histogram(matched),
        top_labels: top_labels(matched),
        trending_labels,
        new_labels,
        most_active_users: aggregator.most_active(TOP_LIMIT),
        bucket_granularity: (!matched.is_empty()).then_some(granularity),
        activity_timeline: timeline(matched, granularity),
    }
}

fn avg_comment_count(issues: &[Issue]) -> f64 {
    if issues.is_empty() {
        return 0.0;
    }

    issues.iter().map(|i| f64::from(i.comment_count)).sum::<f64>() / issues.len() as f64
}

fn avg_resolution_days(issues: &[Issue]) -> Option<f64> {
    let days: Vec<f64> = issues.iter().filter_map(Issue::resolution_days).collect();
    if days.is_empty() {
        return None;
    }

    Some(days.iter().sum::<f64>() / days.len() as f64)
}

/// Histogram over the fixed ranges 1-5, 6-10, and 11+. Issues without
/// comments are left out entirely.
fn comment_histogram(issues: &[Issue]) -> Vec<LabelCount> {
    let mut low = 0u32;
    let mut mid = 0u32;
    let mut high = 0u32;

    for issue in issues {
        match issue.comment_count {
            0 => {}
            1..=5 => low += 1,
            6..=10 => mid += 1,
            _ => high += 1,
        }
    }

    vec![
        LabelCount { label: "1-5".to_string(), count: low },
        LabelCount { label: "6-10".to_string(), count: mid },
        LabelCount { label: "11+".to_string(), count: high },
    ]
}

fn top_labels(issues: &[Issue]) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for issue in issues {
        for label in &issue.labels {
            *counts.entry(label).or_default() += 1;
        }
    }

    let mut labels: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();

    labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    labels.truncate(TOP_LIMIT);
    labels
}

/// Label usage growth between the two most recent 30-day windows, plus the
/// labels that only exist in the current window.
fn label_trends(issues: &[Issue], now: DateTime<Utc>) -> (Vec<LabelTrend>, Vec<LabelCount>) {
    let current_start = now - chrono::Duration::days(TREND_WINDOW_DAYS);
    let previous_start = now - chrono::Duration::days(TREND_WINDOW_DAYS * 2);

    let mut current: HashMap<&str, u32> = HashMap::new();
    let mut previous: HashMap<&str, u32> = HashMap::new();

    for issue in issues {
        let window = if issue.created_at >= current_start {
            &mut current
        } else if issue.created_at >= previous_start {
            &mut previous
        } else {
            continue;
        };

        for label in &issue.labels {
            *window.entry(label).or_default() += 1;
        }
    }

    let mut trends = Vec::new();
    let mut fresh = Vec::new();

    let mut labels: Vec<&str> = current.keys().chain(previous.keys()).copied().collect();
    labels.sort_unstable();
    labels.dedup();

    for label in labels {
        let cur = current.get(label).copied().unwrap_or(0);
        let prev = previous.get(label).copied().unwrap_or(0);

        if prev == 0 {
            // No baseline, so percentage change is undefined. Labels with
            // real volume still get surfaced separately.
            if cur >= TREND_MIN_TOTAL {
                fresh.push(LabelCount {
                    label: label.to_string(),
                    count: cur,
                });
            }
            continue;
        }

        if cur + prev < TREND_MIN_TOTAL {
            continue;
        }

        let percent_change = (f64::from(cur) - f64::from(prev)) / f64::from(prev) * 100.0;
        if percent_change < TREND_MIN_PERCENT {
            continue;
        }

        trends.push(LabelTrend {
            label: label.to_string(),
            current_count: cur,
            previous_count: prev,
            percent_change,
        });
    }

    trends.sort_by(|a, b| {
        b.percent_change
            .partial_cmp(&a.percent_change)
            .unwrap_or(core::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    trends.truncate(TOP_LIMIT);

    fresh.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    fresh.truncate(TOP_LIMIT);

    (trends, fresh)
}

const fn pick_granularity(issue_count: usize) -> BucketGranularity {
    if issue_count < DAILY_THRESHOLD {
        BucketGranularity::Daily
    } else if issue_count <= MONTHLY_THRESHOLD {
        BucketGranularity::Weekly
    } else {
        BucketGranularity::Monthly
    }
}

fn timeline(issues: &[Issue], granularity: BucketGranularity) -> Vec<ActivityBucket> {
    struct Accumulator<'a> {
        issue_count: u32,
        comment_total: u64,
        commenters: HashSet<&'a str>,
    }

    let mut buckets: HashMap<String, Accumulator<'_>> = HashMap::new();

    for issue in issues {
        let key = match granularity {
            BucketGranularity::Daily => issue.created_at.format("%Y-%m-%d").to_string(),
            BucketGranularity::Weekly => issue.created_at.format("%G-W%V").to_string(),
            BucketGranularity::Monthly => issue.created_at.format("%Y-%m").to_string(),
        };

        let acc = buckets.entry(key).or_insert_with(|| Accumulator {
            issue_count: 0,
            comment_total: 0,
            commenters: HashSet::new(),
        });

        acc.issue_count += 1;
        acc.comment_total += u64::from(issue.comment_count);
        acc.commenters
            .extend(issue.comments.iter().filter_map(|c| c.author.as_deref()));
    }

    let mut keys: Vec<String> = buckets.keys().cloned().collect();
    // Period keys are zero-padded, so lexical order is chronological order.
    keys.sort_unstable();

    let mut timeline = Vec::with_capacity(keys.len());
    let mut prev_count: Option<u32> = None;

    for key in keys {
        let Some(acc) = buckets.remove(&key) else {
            continue;
        };

        let trend = match prev_count {
            Some(prev) if acc.issue_count > prev => TrendDirection::Up,
            Some(prev) if acc.issue_count < prev => TrendDirection::Down,
            _ => TrendDirection::Flat,
        };
        prev_count = Some(acc.issue_count);

        timeline.push(ActivityBucket {
            period: key,
            issue_count: acc.issue_count,
            avg_comments: acc.comment_total as f64 / f64::from(acc.issue_count),
            unique_commenters: acc.commenters.len() as u32,
            trend,
        });
    }

    timeline
}
