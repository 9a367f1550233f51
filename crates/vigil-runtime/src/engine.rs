//! Boundary to the external agent engine.

use async_trait::async_trait;
use vigil_core::{ActionGate, ModelSelection, SessionId};

use crate::error::RuntimeResult;

/// Everything an engine needs to start working on a task.
#[derive(Clone)]
pub struct AgentTask {
    /// Owning session.
    pub session_id: SessionId,
    /// Natural-language task description.
    pub task: String,
    /// Model driving the agent.
    pub model: ModelSelection,
    /// Credential for the model provider.
    pub model_provider_token: String,
}

impl std::fmt::Debug for AgentTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTask")
            .field("session_id", &self.session_id)
            .field("task", &self.task)
            .field("model", &self.model)
            .field("model_provider_token", &"[redacted]")
            .finish()
    }
}

/// Result of one agent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The agent wants another step.
    Continue,
    /// The agent declared the task finished.
    Done {
        /// Whether the agent reports success.
        success: bool,
    },
}

/// Opens execution contexts for sessions.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    /// Open a context (the browser, in production) for `task`.
    async fn launch(&self, task: &AgentTask) -> RuntimeResult<Box<dyn AgentDriver>>;
}

/// One open execution context.
///
/// The runner calls [`close`](AgentDriver::close) on every exit path.
#[async_trait]
pub trait AgentDriver: Send {
    /// Run one step. Every action the agent proposes must go through `gate`.
    async fn step(&mut self, gate: &dyn ActionGate) -> RuntimeResult<StepOutcome>;

    /// Release the context.
    async fn close(&mut self);
}
