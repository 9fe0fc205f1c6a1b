//! Integration tests for the analysis pipeline using wiremock

use issuelens::analysis::Analyzer;
use issuelens::github::{Client, IssueSource, RepoRef};
use issuelens::models::{FilterCriteria, ProgressTracker};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn issue_json(number: u64, title: &str, comments: u32) -> Value {
    json!({
        "id": number + 10_000,
        "number": number,
        "title": title,
        "body": "body text",
        "state": "open",
        "user": {"login": "alice"},
        "labels": [{"name": "bug"}],
        "assignees": [],
        "comments": comments,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-02T00:00:00Z",
        "closed_at": null,
        "html_url": format!("https://github.com/o/r/issues/{number}")
    })
}

fn pull_request_json(number: u64) -> Value {
    let mut value = issue_json(number, "a pull request", 0);
    value["pull_request"] = json!({"url": format!("https://api.github.com/repos/o/r/pulls/{number}")});
    value
}

async fn analyzer_for(server: &MockServer) -> Analyzer {
    let client = Client::new(None, server.uri()).expect("client should build");
    let repo = RepoRef::parse("o/r").expect("repo ref should parse");
    Analyzer::new(
        IssueSource::new(client, repo),
        Arc::new(ProgressTracker::new(None)),
        Arc::new(AtomicBool::new(false)),
    )
}

#[tokio::test]
async fn paginates_until_link_header_runs_out() {
    let server = MockServer::start().await;

    let next_link = format!("<{}/repos/o/r/issues?state=open&per_page=100&page=2>; rel=\"next\"", server.uri());
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([issue_json(1, "first", 0), pull_request_json(2)]))
                .insert_header("link", next_link.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(3, "third", 2)])))
        .mount(&server)
        .await;

    let result = analyzer_for(&server).await.run(&FilterCriteria::default()).await.expect("analysis should succeed");

    // The pull request on page one is not an issue.
    let numbers: Vec<u64> = result.issues.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 3]);
    assert_eq!(result.metrics.total_analyzed, 2);
    assert_eq!(result.metrics.total_matched, 2);
    assert!(!result.limit_reached);
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn limit_stops_fetching_further_pages() {
    let server = MockServer::start().await;

    let next_link = format!("<{}/repos/o/r/issues?state=open&per_page=100&page=2>; rel=\"next\"", server.uri());
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([issue_json(1, "first", 0), issue_json(2, "second", 0)]))
                .insert_header("link", next_link.as_str()),
        )
        .mount(&server)
        .await;

    // The limit is satisfied by page one, so page two must never be requested.
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(3, "third", 0)])))
        .expect(0)
        .mount(&server)
        .await;

    let criteria = FilterCriteria {
        limit: Some(2),
        ..FilterCriteria::default()
    };

    let result = analyzer_for(&server).await.run(&criteria).await.expect("analysis should succeed");

    assert_eq!(result.issues.len(), 2);
    assert!(result.limit_reached);
}

#[tokio::test]
async fn failed_page_is_skipped_with_warning() {
    let server = MockServer::start().await;

    let next_link = format!("<{}/repos/o/r/issues?state=open&per_page=100&page=2>; rel=\"next\"", server.uri());
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([issue_json(1, "first", 0)]))
                .insert_header("link", next_link.as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(5, "fifth", 0)])))
        .mount(&server)
        .await;

    let result = analyzer_for(&server).await.run(&FilterCriteria::default()).await.expect("analysis should succeed");

    let numbers: Vec<u64> = result.issues.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 5]);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("page 2"));
}

#[tokio::test]
async fn comment_failure_keeps_issue_and_warns() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(5, "needs comments", 3)])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/5/comments"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let criteria = FilterCriteria {
        include_comments: true,
        ..FilterCriteria::default()
    };

    let result = analyzer_for(&server).await.run(&criteria).await.expect("analysis should succeed");

    assert_eq!(result.issues.len(), 1);
    assert!(result.issues[0].comments_unavailable);
    assert!(result.issues[0].comments.is_empty());
    assert!(result.warnings.iter().any(|w| w.contains("issue #5")));
}

#[tokio::test]
async fn comments_are_attached_when_available() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(7, "discussed", 2)])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues/7/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 900,
                "user": {"login": "bob"},
                "body": "me too",
                "created_at": "2024-01-03T00:00:00Z",
                "updated_at": "2024-01-03T00:00:00Z"
            },
            {
                "id": 901,
                "user": null,
                "body": "ghost comment",
                "created_at": "2024-01-04T00:00:00Z",
                "updated_at": "2024-01-04T00:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let criteria = FilterCriteria {
        include_comments: true,
        ..FilterCriteria::default()
    };

    let result = analyzer_for(&server).await.run(&criteria).await.expect("analysis should succeed");

    let issue = &result.issues[0];
    assert_eq!(issue.comments.len(), 2);
    assert_eq!(issue.comments[0].author.as_deref(), Some("bob"));
    assert!(issue.comments[1].author.is_none());
    assert_eq!(issue.comments[0].issue_number, 7);
    assert!(result.metrics.most_active_users.iter().any(|u| u.username == "bob"));
}

#[tokio::test]
async fn missing_repository_is_a_fatal_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = analyzer_for(&server).await.run(&FilterCriteria::default()).await.expect_err("404 must be fatal");

    assert!(err.to_string().contains("o/r"));
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn rate_limited_request_is_retried_after_reset() {
    let server = MockServer::start().await;

    // Exhausted quota with a reset already in the past, so the retry happens
    // immediately.
    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1"),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(1, "after reset", 0)])))
        .mount(&server)
        .await;

    let result = analyzer_for(&server).await.run(&FilterCriteria::default()).await.expect("analysis should succeed");

    assert_eq!(result.issues.len(), 1);
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn empty_repository_yields_empty_metrics() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = analyzer_for(&server).await.run(&FilterCriteria::default()).await.expect("analysis should succeed");

    assert!(result.issues.is_empty());
    assert_eq!(result.metrics.total_matched, 0);
    assert!((result.metrics.avg_comment_count - 0.0).abs() < f64::EPSILON);
    assert!(result.metrics.activity_timeline.is_empty());
}

#[tokio::test]
async fn server_side_filters_appear_in_the_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(query_param("state", "closed"))
        .and(query_param("assignee", "alice"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let criteria = FilterCriteria {
        state: issuelens::models::StateFilter::Closed,
        assignees: vec!["alice".to_string()],
        page_size: 50,
        ..FilterCriteria::default()
    };

    // A query built without the pushed-down parameters would miss the mock,
    // hit wiremock's 404 fallback, and fail the run.
    let result = analyzer_for(&server).await.run(&criteria).await.expect("analysis should succeed");
    assert!(result.issues.is_empty());
    server.verify().await;
}
