//! Core error types.

use thiserror::Error;

use crate::types::SessionId;

/// Errors raised by core session plumbing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An observer is already attached to this session's event stream.
    #[error("observer already attached to {session_id}")]
    ObserverAttached {
        /// The session whose stream is taken.
        session_id: SessionId,
    },

    /// A model selection string did not name a supported model.
    #[error("unsupported model: {0}")]
    UnknownModel(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_observer_attached() {
        let id = SessionId::new();
        let err = CoreError::ObserverAttached {
            session_id: id.clone(),
        };
        assert_eq!(err.to_string(), format!("observer already attached to {id}"));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
    }
}
