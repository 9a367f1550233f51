use thiserror::Error;
use vigil_core::ApprovalId;

/// Errors raised inside the approval path.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The pending entry disappeared without a decision, e.g. the registry
    /// was cleared during teardown.
    #[error("approval {approval_id} abandoned without a decision")]
    Abandoned {
        /// The abandoned approval.
        approval_id: ApprovalId,
    },
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
