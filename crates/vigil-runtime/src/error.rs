//! Runtime error types.

use thiserror::Error;

/// Errors raised while executing a session.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine could not open its execution context.
    #[error("failed to launch agent: {0}")]
    Launch(String),

    /// The engine failed during a step.
    #[error("agent step failed: {0}")]
    Engine(String),

    /// A collaborator panicked.
    #[error("{0} panicked: {1}")]
    Panicked(&'static str, String),

    /// A dry-run plan could not be loaded.
    #[error("invalid plan: {0}")]
    Plan(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
