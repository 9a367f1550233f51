//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_runtime::prelude::*;` to import all essential types.

pub use crate::{RuntimeError, RuntimeResult};

pub use crate::{AgentDriver, AgentLauncher, AgentTask, StepOutcome};

pub use crate::{RunOutcome, RunReport, RunnerSettings, SessionRunner, SessionServices};

pub use crate::{ScriptedLauncher, ScriptedPlan};
