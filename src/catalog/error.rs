use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited by the catalog (retry after {0:?})")]
    RateLimited(Option<Duration>),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Batch of {size} ids exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },
}

impl CatalogError {
    /// Returns true if the failed call may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Network(_)
            | CatalogError::Timeout(_)
            | CatalogError::RateLimited(_)
            | CatalogError::Parse(_) => true,
            CatalogError::Api { status, .. } => *status >= 500,
            CatalogError::Auth(_) | CatalogError::NotFound(_) | CatalogError::BatchTooLarge { .. } => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout(e.to_string())
        } else if e.is_decode() {
            CatalogError::Parse(e.to_string())
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}
