//! Vigil Runtime - Drives one supervised session end to end.
//!
//! The agent engine (browser automation plus the model that proposes
//! actions) sits behind [`AgentLauncher`] and [`AgentDriver`]. The
//! [`SessionRunner`] provisions policies, launches the engine, steps it with
//! an [`ActionInterceptor`](vigil_approval::ActionInterceptor) as the action
//! gate, and reports progress as [`SessionEvent`](vigil_core::SessionEvent)s.
//!
//! [`ScriptedLauncher`] is a dry-run engine that replays a JSON plan.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod engine;
pub mod error;
pub mod runner;
pub mod scripted;

pub use engine::{AgentDriver, AgentLauncher, AgentTask, StepOutcome};
pub use error::{RuntimeError, RuntimeResult};
pub use runner::{
    MAX_STEPS, RunOutcome, RunReport, RunnerSettings, SessionRunner, SessionServices, panic_message,
};
pub use scripted::{DryRunExecutor, ScriptedLauncher, ScriptedPlan, ScriptedStep};
