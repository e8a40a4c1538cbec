//! Client error types.

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while fetching, caching or reading the rollout document.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unexpected status {status}: {body:?}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("server reported not modified but no cached document exists")]
    NotModifiedWithoutCache,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rollout document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Rollout(#[from] slowroll::RolloutError),
}
