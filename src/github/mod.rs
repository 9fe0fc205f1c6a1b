//! GitHub REST access: the HTTP client, wire formats, and paginated
//! issue retrieval.

mod client;
mod issues;
mod repo;

pub use client::{ApiResult, Client, RateLimitInfo};
pub use issues::{IssuePage, IssueSource, PageFetch, ServerFilter};
pub use repo::RepoRef;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
