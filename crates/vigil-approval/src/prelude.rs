//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_approval::prelude::*;` to import all essential types.

pub use crate::{ApprovalError, ApprovalResult};

pub use crate::ActionInterceptor;

pub use crate::{ApprovalRegistry, ApprovalWaiter, ValidationGateway, WaitOutcome};
