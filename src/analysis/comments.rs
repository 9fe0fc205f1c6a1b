//! Per-author activity aggregation.

use crate::models::{Issue, UserActivity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Accumulates who wrote issues and comments across the matched set.
///
/// The map is seeded from issue authorship, so a user who filed issues but
/// never commented still appears with a zero comment count. Comments whose
/// author account has been deleted carry no login and count toward nobody.
#[derive(Debug, Default)]
pub struct CommentAggregator {
    by_user: HashMap<String, UserActivity>,
}

impl CommentAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an issue's author and every attributable comment on it.
    pub fn record(&mut self, issue: &Issue) {
        if let Some(author) = &issue.author {
            let entry = self.entry(author);
            entry.issues_created += 1;
            bump_activity(entry, issue.updated_at);
        }

        for comment in &issue.comments {
            if let Some(author) = &comment.author {
                let entry = self.entry(author);
                entry.comments_written += 1;
                bump_activity(entry, comment.created_at);
            }
        }
    }

    fn entry(&mut self, username: &str) -> &mut UserActivity {
        self.by_user
            .entry(username.to_string())
            .or_insert_with(|| UserActivity {
                username: username.to_string(),
                issues_created: 0,
                comments_written: 0,
                last_activity: None,
            })
    }

    /// The most engaged users: comments first, then issues, then username,
    /// capped at `limit`.
    #[must_use]
    pub fn most_active(&self, limit: usize) -> Vec<UserActivity> {
        let mut users: Vec<UserActivity> = self.by_user.values().cloned().collect();
        users.sort_by(|a, b| {
            b.comments_written
                .cmp(&a.comments_written)
                .then_with(|| b.issues_created.cmp(&a.issues_created))
                .then_with(|| a.username.cmp(&b.username))
        });
        users.truncate(limit);
        users
    }
}

fn bump_activity(entry: &mut UserActivity, seen: DateTime<Utc>) {
    if entry.last_activity.is_none_or(|prev| seen > prev) {
        entry.last_activity = Some(seen);
    }
}
