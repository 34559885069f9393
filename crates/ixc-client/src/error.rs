//! Error types for vendor API operations

use thiserror::Error;

/// Result type alias for vendor API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the device API client.
///
/// The taxonomy is deliberately coarse: [`ApiError::Authentication`] changes
/// control flow (the host must re-enter credentials), while every other
/// network-side failure is an undifferentiated "try again on the next poll".
/// [`ApiError::ReadOnlyProperties`] is a local usage error raised before any
/// network I/O and is never retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server rejected the API key (HTTP 401)
    #[error("authentication failed: API key rejected")]
    Authentication,

    /// Server answered with a non-success status
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, DNS, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Attempted to write properties outside the writable set
    #[error("cannot set read-only properties: {}", keys.join(", "))]
    ReadOnlyProperties { keys: Vec<String> },

    /// Invalid base URL or API key at construction
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Response body could not be decoded
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// IO error (only raised by the test server helper)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Create a status error from code and captured body
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// True for the transient class that the next scheduled poll retries
    /// naturally; false for authentication and local usage errors.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Status { .. } | ApiError::Transport(_) | ApiError::Parse(_)
        )
    }
}
