//! Vigil Approval - Human-in-the-loop gating of agent actions.
//!
//! Every action the agent proposes passes through an [`ActionInterceptor`]:
//!
//! 1. Actions outside the validated set run immediately.
//! 2. The [`ValidationGateway`] asks the policy validator for a verdict.
//! 3. Allowed actions run; denied actions are parked in the
//!    [`ApprovalRegistry`] until a reviewer resolves them, the approval
//!    times out, or the session is cancelled.
//!
//! # Example
//!
//! ```
//! use vigil_approval::ApprovalRegistry;
//! use vigil_core::ApprovalDecision;
//!
//! let registry = ApprovalRegistry::new();
//! let waiter = registry.register();
//! let id = waiter.id().clone();
//!
//! assert!(registry.resolve(&id, ApprovalDecision::Approve));
//! // A second resolution of the same id is a no-op.
//! assert!(!registry.resolve(&id, ApprovalDecision::Deny));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types and results for the approval module.
pub mod error;
pub mod gateway;
pub mod interceptor;
pub mod registry;

pub use error::{ApprovalError, ApprovalResult};
pub use gateway::{GATEWAY_ERROR_PREFIX, ValidationGateway};
pub use interceptor::{APPROVAL_TIMEOUT, ActionInterceptor, DENIED_BY_REVIEWER, SESSION_STOPPED};
pub use registry::{ApprovalRegistry, ApprovalWaiter, ClaimedApproval, WaitOutcome};
