//! The action boundary between the agent engine and the approval core.

use async_trait::async_trait;

use crate::action::{ActionResult, ProposedAction};

/// Executes an action for real (the browser, in production).
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Run the action and report its result.
    async fn execute(&self, action: &ProposedAction) -> ActionResult;
}

/// Decides whether a proposed action reaches its executor.
///
/// The engine hands every proposed action to the gate together with the
/// executor that would run it. The gate either forwards the action or
/// returns a rejection without touching the executor.
#[async_trait]
pub trait ActionGate: Send + Sync {
    /// Gate one action.
    async fn intercept(&self, action: ProposedAction, executor: &dyn ActionExecutor)
    -> ActionResult;
}
