use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of a single search request against the github graphql api.
///
/// The pagination layer only ever shows the display text of this error; the
/// variants exist for logging and for tests.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("github rate limit exhausted, resets at {reset}")]
    RateLimited { reset: DateTime<Utc> },
    #[error("graphql error: {}", .0.join("; "))]
    GraphQl(Vec<String>),
    #[error("failed to parse response: {0}")]
    Parse(String),
    /// The task running the request panicked or was cancelled.
    #[error("search task failed: {0}")]
    Task(String),
}
