use reqwest::StatusCode;
use thiserror::Error;

/// Any failure to obtain a report from upstream
///
/// Callers treat every variant the same way: serve the fallback summary.
/// The variants exist so the logs say what went wrong.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid service account credentials: {0}")]
    Credentials(String),
    #[error("token exchange failed: {0}")]
    Auth(String),
    #[error("request to analytics API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("analytics API returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode analytics report: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;
