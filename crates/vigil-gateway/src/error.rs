//! Gateway error types.

use thiserror::Error;
use vigil_core::{ApprovalId, SessionId};

/// Errors raised by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// No model-provider token was supplied and none is configured.
    #[error(
        "missing model provider token; set MODEL_PROVIDER_TOKEN, ANTHROPIC_API_KEY, or VERTEX_API_KEY"
    )]
    MissingCredential,

    /// The session id is unknown.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The approval id is unknown, resolved, or expired.
    #[error("approval not found: {0}")]
    ApprovalNotFound(ApprovalId),

    /// Policy client construction failed.
    #[error(transparent)]
    Policy(#[from] vigil_policy::PolicyError),

    /// Server startup or runtime failure.
    #[error("server error: {0}")]
    Server(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
