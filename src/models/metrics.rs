use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Granularity chosen for the activity timeline, based on result set size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BucketGranularity {
    Daily,
    Weekly,
    Monthly,
}

/// Direction of a bucket's activity relative to the bucket before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

/// Activity within one time period of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityBucket {
    /// Period key, e.g. `2024-03-07`, `2024-W10`, or `2024-03`.
    pub period: String,

    pub issue_count: u32,

    pub avg_comments: f64,

    /// Distinct comment authors among the loaded comments of this period's
    /// issues. Zero when comments were not retrieved.
    pub unique_commenters: u32,

    /// Issue count movement against the previous bucket. The first bucket
    /// is flat by definition.
    pub trend: TrendDirection,
}

/// Per-user engagement across the matched issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    pub username: String,

    /// Issues this user authored.
    pub issues_created: u32,

    /// Comments this user wrote across the matched issues.
    pub comments_written: u32,

    /// Most recent activity attributable to this user.
    pub last_activity: Option<DateTime<Utc>>,
}

/// How many issues carry a given label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,

    pub count: u32,
}

/// A label whose usage grew significantly between the two most recent
/// 30-day windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTrend {
    pub label: String,

    /// Occurrences in the window covering the last 30 days.
    pub current_count: u32,

    /// Occurrences in the window covering 30 to 60 days ago.
    pub previous_count: u32,

    /// Percentage change from the previous to the current window.
    pub percent_change: f64,
}

/// Aggregate statistics computed over the matched issues.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityMetrics {
    /// Issues inspected during the run, matching or not.
    pub total_analyzed: u64,

    pub total_matched: u32,

    pub open_issues: u32,

    pub closed_issues: u32,

    /// Mean comment count over matched issues, 0.0 for an empty set.
    pub avg_comment_count: f64,

    /// Mean days from creation to closure, over closed issues only.
    pub avg_resolution_days: Option<f64>,

    /// Comment-count histogram over issues with at least one comment.
    /// Keys are the fixed ranges `1-5`, `6-10`, and `11+`.
    pub comment_histogram: Vec<LabelCount>,

    pub top_labels: Vec<LabelCount>,

    /// Labels whose usage rose between the trend windows, biggest rise first.
    pub trending_labels: Vec<LabelTrend>,

    /// Labels absent from the previous window but prominent in the current one.
    pub new_labels: Vec<LabelCount>,

    /// Most engaged users, at most ten.
    pub most_active_users: Vec<UserActivity>,

    pub bucket_granularity: Option<BucketGranularity>,

    /// Issue creation timeline, oldest period first.
    pub activity_timeline: Vec<ActivityBucket>,
}
