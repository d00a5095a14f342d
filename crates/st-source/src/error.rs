//! Error types for st-source

use thiserror::Error;

/// Status codes worth retrying
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Source API errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transient HTTP status (S001)
    #[error("[S001] Retryable status {status} from {url}")]
    RetryableStatus { status: u16, url: String },

    /// Any other failing HTTP status (S002)
    #[error("[S002] Request to {url} failed with status {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Connection, timeout, or body read failure (S003)
    #[error("[S003] Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Redirect that cannot be normalized to a secure URL (S004)
    #[error("[S004] Unexpected redirect ({status}) to {}", .location.as_deref().unwrap_or("<no location>"))]
    Redirect {
        status: u16,
        location: Option<String>,
    },

    /// Response body is not valid JSON (S005)
    #[error("[S005] Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// HTTP client could not be built (S006)
    #[error("[S006] Failed to build HTTP client: {0}")]
    Client(String),

    /// Retry cap reached; carries the last failure (S007)
    #[error("[S007] Giving up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<SourceError>,
    },
}

impl SourceError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::RetryableStatus { .. } | SourceError::Transport(_)
        )
    }
}

/// Result type alias for SourceError
pub type SourceResult<T> = Result<T, SourceError>;
