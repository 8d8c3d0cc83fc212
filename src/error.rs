// Error types for lazyorg.
// Covers remote fetch failures, nested-map lookups, store errors and configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LazyOrgError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    /// Lookup of a nested-map path failed at this key.
    #[error("{0}")]
    Key(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Store error: {0}")]
    Store(#[from] mysql_async::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl LazyOrgError {
    /// Whether this error came from the remote transport (network, status, decoding).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LazyOrgError::Api(_)
                | LazyOrgError::Unauthorized
                | LazyOrgError::NotFound(_)
                | LazyOrgError::RateLimited { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LazyOrgError>;
