//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identifiers and session vocabulary
pub use crate::{ApprovalDecision, ApprovalId, ModelSelection, PolicyId, SessionId, SessionState};

// Actions and verdicts
pub use crate::{ActionResult, ProposedAction, ValidationMode, ValidationVerdict, Verdict};

// Events
pub use crate::{EventSink, EventStream, SessionEvent};

// Action boundary
pub use crate::{ActionExecutor, ActionGate};
