//! Validator client errors.

use thiserror::Error;

/// Errors talking to the policy validator service.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("validator returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("invalid validator response: {0}")]
    InvalidResponse(String),

    /// Client configuration is unusable (bad URL, bad key characters).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for validator operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
