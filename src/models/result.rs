use crate::models::{ActivityMetrics, FilterCriteria, Issue};
use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// The repository an analysis ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub owner: String,

    pub name: String,

    pub url: String,
}

impl std::fmt::Display for RepoDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything an analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub repo: RepoDescriptor,

    /// The criteria the run was filtered by.
    pub criteria: FilterCriteria,

    /// Issues that matched the criteria, in retrieval order.
    pub issues: Vec<Issue>,

    pub metrics: ActivityMetrics,

    pub generated_at: DateTime<Utc>,

    pub processing_time: Duration,

    /// Non-fatal problems encountered during the run.
    pub warnings: Vec<String>,

    /// True when retrieval stopped early because the match limit was reached.
    pub limit_reached: bool,
}
