//! Paginated issue and comment retrieval.
//!
//! Pages arrive one at a time so the caller can filter and stop early without
//! pulling the whole issue history. Filters the server understands are pushed
//! into the request; everything else is evaluated client-side.

use super::client::{ApiResult, Client, RateLimitInfo};
use super::repo::RepoRef;
use crate::Result;
use crate::models::{Comment, FilterCriteria, Issue, IssueState, MatchMode, StateFilter};
use chrono::{DateTime, SecondsFormat, Utc};
use core::time::Duration;
use ohno::bail;
use reqwest::header::LINK;
use serde::Deserialize;
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "github";

/// Never sleep on a rate limit longer than this, even if the reset header
/// says otherwise.
const MAX_RATE_LIMIT_WAIT_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

/// Present on issue records that are actually pull requests.
#[derive(Debug, Deserialize)]
struct PullRequestMarker {}

#[derive(Debug, Deserialize)]
struct RawIssue {
    id: u64,
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: IssueState,
    user: Option<RawUser>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    assignees: Vec<RawUser>,
    comments: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    html_url: String,
    pull_request: Option<PullRequestMarker>,
}

impl RawIssue {
    fn into_issue(self) -> Issue {
        Issue {
            id: self.id,
            number: self.number,
            title: self.title,
            body: self.body,
            state: self.state,
            author: self.user.map(|u| u.login),
            labels: self.labels.into_iter().map(|l| l.name).collect(),
            assignees: self.assignees.into_iter().map(|a| a.login).collect(),
            comment_count: self.comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
            closed_at: self.closed_at,
            url: self.html_url,
            comments: Vec::new(),
            comments_unavailable: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawComment {
    id: u64,
    user: Option<RawUser>,
    #[serde(default)]
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// The portion of a [`FilterCriteria`] the issues endpoint can evaluate
/// server-side.
///
/// GitHub's `labels` parameter requires every listed label, so it only
/// stands in for all-mode label filters. The `assignee` parameter takes a
/// single login, so it is used only when exactly one assignee is named,
/// where any-mode and all-mode coincide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFilter {
    state: StateFilter,
    labels: Option<String>,
    assignee: Option<String>,
    since: Option<DateTime<Utc>>,
    per_page: u32,
}

impl ServerFilter {
    #[must_use]
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let labels = (criteria.label_mode == MatchMode::All && !criteria.labels.is_empty())
            .then(|| criteria.labels.join(","));

        let assignee = match criteria.assignees.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };

        Self {
            state: criteria.state,
            labels,
            assignee,
            since: criteria.updated_after,
            per_page: criteria.page_size,
        }
    }

    fn query(&self, page: u32) -> String {
        let state = match self.state {
            StateFilter::Open => "open",
            StateFilter::Closed => "closed",
            StateFilter::All => "all",
        };

        let mut query = format!("state={state}&per_page={}&page={page}", self.per_page);

        if let Some(labels) = &self.labels {
            query.push_str("&labels=");
            query.push_str(&urlencode(labels));
        }

        if let Some(assignee) = &self.assignee {
            query.push_str("&assignee=");
            query.push_str(&urlencode(assignee));
        }

        if let Some(since) = self.since {
            query.push_str("&since=");
            query.push_str(&since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        query
    }
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// One page of issues, pull requests already removed.
#[derive(Debug)]
pub struct IssuePage {
    pub issues: Vec<Issue>,

    /// Whether the server advertised a further page.
    pub has_next: bool,
}

/// Outcome of a page request that is not a transport failure.
#[derive(Debug)]
pub enum PageFetch {
    Page(IssuePage),

    /// The repository does not exist or is not visible.
    NotFound,
}

enum Fetched<T> {
    Data(T, bool),
    NotFound,
}

/// Streams issues and comments for one repository.
#[derive(Debug, Clone)]
pub struct IssueSource {
    client: Client,
    repo: RepoRef,
}

impl IssueSource {
    pub const fn new(client: Client, repo: RepoRef) -> Self {
        Self { client, repo }
    }

    #[must_use]
    pub const fn repo(&self) -> &RepoRef {
        &self.repo
    }

    /// Fetch one page of issues, waiting out rate limits as needed.
    ///
    /// A transport failure comes back as an error; each page is its own
    /// failure domain and the caller decides whether to go on with the next
    /// page number.
    pub async fn fetch_page(&self, filter: &ServerFilter, page: u32) -> Result<PageFetch> {
        let url = format!(
            "{}/repos/{}/{}/issues?{}",
            self.client.base_url(),
            self.repo.owner(),
            self.repo.name(),
            filter.query(page)
        );

        match self.fetch_json::<Vec<RawIssue>>(&url).await? {
            Fetched::Data(raw, has_next) => {
                let issues = raw
                    .into_iter()
                    .filter(|i| i.pull_request.is_none())
                    .map(RawIssue::into_issue)
                    .collect();

                Ok(PageFetch::Page(IssuePage { issues, has_next }))
            }
            Fetched::NotFound => Ok(PageFetch::NotFound),
        }
    }

    /// Fetch every comment for one issue.
    pub async fn fetch_comments(&self, issue_number: u64) -> Result<Vec<Comment>> {
        let mut comments = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}/repos/{}/{}/issues/{issue_number}/comments?per_page=100&page={page}",
                self.client.base_url(),
                self.repo.owner(),
                self.repo.name()
            );

            let (raw, has_next) = match self.fetch_json::<Vec<RawComment>>(&url).await? {
                Fetched::Data(raw, has_next) => (raw, has_next),
                Fetched::NotFound => bail!("issue #{issue_number} in '{}' not found", self.repo),
            };

            comments.extend(raw.into_iter().map(|c| Comment {
                id: c.id,
                author: c.user.map(|u| u.login),
                body: c.body,
                created_at: c.created_at,
                updated_at: c.updated_at,
                issue_number,
            }));

            if !has_next {
                return Ok(comments);
            }

            page += 1;
        }
    }

    /// GET a URL and decode its JSON body, sleeping through rate limits and
    /// retrying the same URL afterward.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<Fetched<T>> {
        loop {
            match self.client.api_call(url).await {
                ApiResult::Success(resp, _) => {
                    let has_next = resp
                        .headers()
                        .get(LINK)
                        .and_then(|h| h.to_str().ok())
                        .is_some_and(|link_str| link_str.contains(r#"rel="next""#));

                    return match resp.json::<T>().await {
                        Ok(data) => Ok(Fetched::Data(data, has_next)),
                        Err(e) => Err(e.into()),
                    };
                }

                ApiResult::RateLimited(rate_limit) => {
                    wait_for_reset(&self.repo, rate_limit).await;
                }

                ApiResult::NotFound(_) => return Ok(Fetched::NotFound),

                ApiResult::Failed(e, _) => return Err(e),
            }
        }
    }
}

async fn wait_for_reset(repo: &RepoRef, rate_limit: RateLimitInfo) {
    let now = Utc::now();
    let wait_until = rate_limit.reset_at.min(now + chrono::Duration::seconds(MAX_RATE_LIMIT_WAIT_SECS));

    if wait_until <= now {
        return;
    }

    let wait = (wait_until - now).to_std().unwrap_or(Duration::ZERO);
    log::warn!(
        target: LOG_TARGET,
        "Hit GitHub rate limit for '{repo}', waiting until {}",
        wait_until.with_timezone(&chrono::Local).format("%T")
    );
    tokio::time::sleep(wait).await;
}
