use crate::Result;
use chrono::{DateTime, Utc};
use ohno::bail;
use serde::{Deserialize, Serialize};

/// How a multi-value filter combines its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// At least one of the listed values must be present.
    #[default]
    Any,

    /// Every listed value must be present.
    All,
}

/// Which issue states to include in the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    #[default]
    Open,
    Closed,
    All,
}

/// Everything that narrows down which issues an analysis run considers.
///
/// A default instance matches every open issue. Call [`validate`](Self::validate)
/// before handing a criteria to the pipeline; the retrieval and filtering
/// layers assume a validated instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub state: StateFilter,

    pub min_comments: Option<u32>,

    pub max_comments: Option<u32>,

    pub labels: Vec<String>,

    pub label_mode: MatchMode,

    pub assignees: Vec<String>,

    pub assignee_mode: MatchMode,

    pub created_after: Option<DateTime<Utc>>,

    pub created_before: Option<DateTime<Utc>>,

    pub updated_after: Option<DateTime<Utc>>,

    pub updated_before: Option<DateTime<Utc>>,

    /// Stop after this many matches. `None` means unbounded.
    pub limit: Option<u32>,

    /// Whether to fetch comment bodies for matching issues.
    pub include_comments: bool,

    /// Issues requested per API page.
    pub page_size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 100;

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            state: StateFilter::default(),
            min_comments: None,
            max_comments: None,
            labels: Vec::new(),
            label_mode: MatchMode::default(),
            assignees: Vec::new(),
            assignee_mode: MatchMode::default(),
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            limit: None,
            include_comments: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterCriteria {
    /// Checks the criteria for internal consistency.
    ///
    /// Returns an error for a zero limit, inverted comment or date ranges, or
    /// blank label and assignee values.
    pub fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            bail!("limit must be at least 1");
        }

        if let (Some(min), Some(max)) = (self.min_comments, self.max_comments)
            && min > max
        {
            bail!("min comment count {min} exceeds max comment count {max}");
        }

        if let (Some(after), Some(before)) = (self.created_after, self.created_before)
            && after > before
        {
            bail!("created-after bound {after} is later than created-before bound {before}");
        }

        if let (Some(after), Some(before)) = (self.updated_after, self.updated_before)
            && after > before
        {
            bail!("updated-after bound {after} is later than updated-before bound {before}");
        }

        if self.labels.iter().any(|l| l.trim().is_empty()) {
            bail!("label filters cannot be blank");
        }

        if self.assignees.iter().any(|a| a.trim().is_empty()) {
            bail!("assignee filters cannot be blank");
        }

        if self.page_size == 0 {
            bail!("page size must be at least 1");
        }

        Ok(())
    }
}
