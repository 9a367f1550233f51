//! Vigil Core - Shared types for the approval-gating agent supervisor.
//!
//! This crate provides the vocabulary every other Vigil crate speaks:
//!
//! - Identifiers: [`SessionId`], [`ApprovalId`], [`PolicyId`]
//! - Agent actions: [`ProposedAction`], [`ActionResult`], the validated action set
//! - Validation results: [`ValidationVerdict`], [`ValidationMode`]
//! - Observer events: [`SessionEvent`] and its payloads
//! - The single-observer [`EventStream`]
//! - The action boundary: [`ActionGate`] and [`ActionExecutor`]
//!
//! # Example
//!
//! ```
//! use vigil_core::{ProposedAction, SessionEvent, EventSink, EventStream, SessionId};
//!
//! let action = ProposedAction::new("navigate").with_arg("url", "https://example.com");
//! assert!(action.is_validated());
//!
//! let stream = EventStream::new(SessionId::new());
//! let mut rx = stream.attach().unwrap();
//! stream.emit(SessionEvent::Done { success: true });
//! assert!(rx.try_recv().is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod action;
pub mod error;
pub mod event;
pub mod gate;
pub mod stream;
pub mod types;
pub mod verdict;

pub use action::{ActionResult, ProposedAction, VALIDATED_ACTIONS, truncate_args};
pub use error::{CoreError, CoreResult};
pub use event::{
    ApprovalNotice, ApprovalResolution, DecisionRecord, EventSink, SessionEvent, StatusUpdate,
};
pub use gate::{ActionExecutor, ActionGate};
pub use stream::EventStream;
pub use types::{ApprovalDecision, ApprovalId, ModelSelection, PolicyId, SessionId, SessionState};
pub use verdict::{ValidationMode, ValidationVerdict, Verdict};
