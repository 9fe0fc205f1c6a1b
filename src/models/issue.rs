use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// A single comment on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,

    /// Login of the comment author, absent when the account has been deleted.
    pub author: Option<String>,

    pub body: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Number of the issue this comment belongs to.
    pub issue_number: u64,
}

/// An issue with everything the analysis stages need.
///
/// Pull requests never appear here; the retrieval layer drops them before
/// they reach any downstream consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,

    pub number: u64,

    pub title: String,

    #[serde(default)]
    pub body: Option<String>,

    pub state: IssueState,

    pub author: Option<String>,

    pub labels: Vec<String>,

    pub assignees: Vec<String>,

    pub comment_count: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// When the issue was closed, if it has been.
    pub closed_at: Option<DateTime<Utc>>,

    pub url: String,

    /// Comment bodies, populated only when comment retrieval was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,

    /// Set when comment retrieval was requested but failed for this issue.
    /// The issue itself is still part of the result set.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub comments_unavailable: bool,
}

impl Issue {
    /// Days from creation to closure, `None` for issues still open.
    pub fn resolution_days(&self) -> Option<f64> {
        self.closed_at.map(|closed| {
            let secs = (closed - self.created_at).num_seconds().max(0) as f64;
            secs / 86_400.0
        })
    }
}
