//! Client-side predicate evaluation.
//!
//! Every criterion becomes one [`Predicate`]; an issue matches when all of
//! them hold. Predicates that the server already enforced are still checked
//! here, which keeps the result correct even when the server-side pushdown
//! was only partial.

use crate::models::{FilterCriteria, Issue, IssueState, MatchMode, StateFilter};
use chrono::{DateTime, Utc};

/// One filter condition on a single issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    MinComments(u32),
    MaxComments(u32),
    State(StateFilter),
    Labels { values: Vec<String>, mode: MatchMode },
    Assignees { values: Vec<String>, mode: MatchMode },
    CreatedAfter(DateTime<Utc>),
    CreatedBefore(DateTime<Utc>),
    UpdatedAfter(DateTime<Utc>),
    UpdatedBefore(DateTime<Utc>),
}

impl Predicate {
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Self::MinComments(min) => issue.comment_count >= *min,
            Self::MaxComments(max) => issue.comment_count <= *max,
            Self::State(filter) => match filter {
                StateFilter::Open => issue.state == IssueState::Open,
                StateFilter::Closed => issue.state == IssueState::Closed,
                StateFilter::All => true,
            },
            Self::Labels { values, mode } => multi_match(values, &issue.labels, *mode),
            Self::Assignees { values, mode } => multi_match(values, &issue.assignees, *mode),
            Self::CreatedAfter(bound) => issue.created_at >= *bound,
            Self::CreatedBefore(bound) => issue.created_at <= *bound,
            Self::UpdatedAfter(bound) => issue.updated_at >= *bound,
            Self::UpdatedBefore(bound) => issue.updated_at <= *bound,
        }
    }
}

fn multi_match(wanted: &[String], present: &[String], mode: MatchMode) -> bool {
    match mode {
        MatchMode::Any => wanted.iter().any(|w| present.contains(w)),
        MatchMode::All => wanted.iter().all(|w| present.contains(w)),
    }
}

fn build_predicates(criteria: &FilterCriteria) -> Vec<Predicate> {
    let mut predicates = vec![Predicate::State(criteria.state)];

    if let Some(min) = criteria.min_comments {
        predicates.push(Predicate::MinComments(min));
    }

    if let Some(max) = criteria.max_comments {
        predicates.push(Predicate::MaxComments(max));
    }

    if !criteria.labels.is_empty() {
        predicates.push(Predicate::Labels {
            values: criteria.labels.clone(),
            mode: criteria.label_mode,
        });
    }

    if !criteria.assignees.is_empty() {
        predicates.push(Predicate::Assignees {
            values: criteria.assignees.clone(),
            mode: criteria.assignee_mode,
        });
    }

    if let Some(bound) = criteria.created_after {
        predicates.push(Predicate::CreatedAfter(bound));
    }

    if let Some(bound) = criteria.created_before {
        predicates.push(Predicate::CreatedBefore(bound));
    }

    if let Some(bound) = criteria.updated_after {
        predicates.push(Predicate::UpdatedAfter(bound));
    }

    if let Some(bound) = criteria.updated_before {
        predicates.push(Predicate::UpdatedBefore(bound));
    }

    predicates
}

/// Runs the full predicate set against issues, counting what it sees.
#[derive(Debug)]
pub struct FilterEngine {
    predicates: Vec<Predicate>,
    examined: u64,
    matched: u64,
}

impl FilterEngine {
    #[must_use]
    pub fn new(criteria: &FilterCriteria) -> Self {
        Self {
            predicates: build_predicates(criteria),
            examined: 0,
            matched: 0,
        }
    }

    /// Evaluates one issue, updating the examined and matched counters.
    pub fn matches(&mut self, issue: &Issue) -> bool {
        self.examined += 1;
        let matched = self.predicates.iter().all(|p| p.matches(issue));
        if matched {
            self.matched += 1;
        }

        matched
    }

    #[must_use]
    pub const fn examined(&self) -> u64 {
        self.examined
    }

    #[must_use]
    pub const fn matched(&self) -> u64 {
        self.matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issue() -> Issue {
        Issue {
            id: 100,
            number: 1,
            title: "t".to_string(),
            body: None,
            state: IssueState::Open,
            author: Some("alice".to_string()),
            labels: vec!["bug".to_string(), "p1".to_string()],
            assignees: vec!["bob".to_string()],
            comment_count: 4,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
            closed_at: None,
            url: "https://example.com/1".to_string(),
            comments: vec![],
            comments_unavailable: false,
        }
    }

    #[test]
    fn comment_bounds() {
        assert!(Predicate::MinComments(4).matches(&issue()));
        assert!(!Predicate::MinComments(5).matches(&issue()));
        assert!(Predicate::MaxComments(4).matches(&issue()));
        assert!(!Predicate::MaxComments(3).matches(&issue()));
    }

    #[test]
    fn state_filter() {
        assert!(Predicate::State(StateFilter::Open).matches(&issue()));
        assert!(!Predicate::State(StateFilter::Closed).matches(&issue()));
        assert!(Predicate::State(StateFilter::All).matches(&issue()));
    }

    #[test]
    fn label_any_mode_needs_one() {
        let p = Predicate::Labels {
            values: vec!["docs".to_string(), "p1".to_string()],
            mode: MatchMode::Any,
        };
        assert!(p.matches(&issue()));

        let p = Predicate::Labels {
            values: vec!["docs".to_string()],
            mode: MatchMode::Any,
        };
        assert!(!p.matches(&issue()));
    }

    #[test]
    fn label_all_mode_needs_every() {
        let p = Predicate::Labels {
            values: vec!["bug".to_string(), "p1".to_string()],
            mode: MatchMode::All,
        };
        assert!(p.matches(&issue()));

        let p = Predicate::Labels {
            values: vec!["bug".to_string(), "docs".to_string()],
            mode: MatchMode::All,
        };
        assert!(!p.matches(&issue()));
    }

    #[test]
    fn assignee_modes() {
        let p = Predicate::Assignees {
            values: vec!["bob".to_string(), "carol".to_string()],
            mode: MatchMode::Any,
        };
        assert!(p.matches(&issue()));

        let p = Predicate::Assignees {
            values: vec!["bob".to_string(), "carol".to_string()],
            mode: MatchMode::All,
        };
        assert!(!p.matches(&issue()));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let created = issue().created_at;
        assert!(Predicate::CreatedAfter(created).matches(&issue()));
        assert!(Predicate::CreatedBefore(created).matches(&issue()));

        let updated = issue().updated_at;
        assert!(Predicate::UpdatedAfter(updated).matches(&issue()));
        assert!(Predicate::UpdatedBefore(updated).matches(&issue()));
    }

    #[test]
    fn engine_counts_examined_and_matched() {
        let criteria = FilterCriteria {
            min_comments: Some(5),
            ..FilterCriteria::default()
        };
        let mut engine = FilterEngine::new(&criteria);

        assert!(!engine.matches(&issue()));

        let mut busy = issue();
        busy.comment_count = 10;
        assert!(engine.matches(&busy));

        assert_eq!(engine.examined(), 2);
        assert_eq!(engine.matched(), 1);
    }

    #[test]
    fn default_criteria_matches_open_only() {
        let mut engine = FilterEngine::new(&FilterCriteria::default());
        assert!(engine.matches(&issue()));

        let mut closed = issue();
        closed.state = IssueState::Closed;
        closed.closed_at = Some(closed.updated_at);
        assert!(!engine.matches(&closed));
    }
}
