//! Dry-run engine that replays a fixed plan of proposed actions.
//!
//! A plan is JSON:
//!
//! ```json
//! {
//!   "steps": [
//!     {"actions": [{"name": "navigate", "args": {"url": "https://example.com"}}]},
//!     {"actions": [{"name": "done", "args": {"text": "finished"}}]}
//!   ],
//!   "success": true
//! }
//! ```
//!
//! Every action goes through the gate. A `done` action that reaches the
//! executor ends the run.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vigil_core::{ActionExecutor, ActionGate, ActionResult, ProposedAction};

use crate::engine::{AgentDriver, AgentLauncher, AgentTask, StepOutcome};
use crate::error::{RuntimeError, RuntimeResult};

/// One step of a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedStep {
    /// Actions proposed during this step, in order.
    #[serde(default)]
    pub actions: Vec<ProposedAction>,
    /// Pause before proposing, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    /// Fail the step with this message instead of proposing anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail: Option<String>,
}

impl ScriptedStep {
    /// A step proposing `actions`.
    #[must_use]
    pub fn new(actions: Vec<ProposedAction>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    /// A step that fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail: Some(message.into()),
            ..Self::default()
        }
    }

    /// Pause before proposing.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// A replayable run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScriptedPlan {
    /// Steps, in order.
    pub steps: Vec<ScriptedStep>,
    /// Success flag reported when the plan runs out without a `done`.
    #[serde(default = "default_success")]
    pub success: bool,
    /// Fail at launch with this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl Default for ScriptedPlan {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            success: default_success(),
            launch_error: None,
        }
    }
}

impl ScriptedPlan {
    /// A plan from steps.
    #[must_use]
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Parse a JSON plan.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Plan`] if the JSON does not describe a plan.
    pub fn from_json(json: &str) -> RuntimeResult<Self> {
        serde_json::from_str(json).map_err(|e| RuntimeError::Plan(e.to_string()))
    }

    /// Load a JSON plan from disk.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Io`] if the file cannot be read and
    /// [`RuntimeError::Plan`] if it does not parse.
    pub async fn load(path: &Path) -> RuntimeResult<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    /// A short demo plan touching allowed and blocked actions.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(vec![
            ScriptedStep::new(vec![
                ProposedAction::new("navigate").with_arg("url", "https://www.google.com"),
            ]),
            ScriptedStep::new(vec![
                ProposedAction::new("search").with_arg("query", "checking account fees"),
            ]),
            ScriptedStep::new(vec![
                ProposedAction::new("navigate").with_arg("url", "https://www.chase.com"),
            ]),
            ScriptedStep::new(vec![
                ProposedAction::new("done").with_arg("text", "Compared checking account fees"),
            ]),
        ])
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    executed: Mutex<Vec<ProposedAction>>,
    launches: AtomicUsize,
    closes: AtomicUsize,
}

/// [`AgentLauncher`] replaying a [`ScriptedPlan`].
#[derive(Debug, Clone)]
pub struct ScriptedLauncher {
    plan: ScriptedPlan,
    state: Arc<ScriptState>,
}

impl ScriptedLauncher {
    /// Create a launcher for `plan`.
    #[must_use]
    pub fn new(plan: ScriptedPlan) -> Self {
        Self {
            plan,
            state: Arc::new(ScriptState::default()),
        }
    }

    /// Actions that reached the executor, across all launches.
    #[must_use]
    pub fn executed(&self) -> Vec<ProposedAction> {
        self.state
            .executed
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    /// How many contexts were opened.
    #[must_use]
    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    /// How many contexts were closed.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentLauncher for ScriptedLauncher {
    async fn launch(&self, task: &AgentTask) -> RuntimeResult<Box<dyn AgentDriver>> {
        if let Some(message) = &self.plan.launch_error {
            return Err(RuntimeError::Launch(message.clone()));
        }
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        info!(
            session_id = %task.session_id,
            model = %task.model,
            steps = self.plan.steps.len(),
            "Launching scripted agent"
        );
        Ok(Box::new(ScriptedDriver {
            steps: self.plan.steps.clone().into_iter(),
            success: self.plan.success,
            executor: DryRunExecutor {
                state: Arc::clone(&self.state),
            },
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedDriver {
    steps: std::vec::IntoIter<ScriptedStep>,
    success: bool,
    executor: DryRunExecutor,
    state: Arc<ScriptState>,
}

#[async_trait]
impl AgentDriver for ScriptedDriver {
    async fn step(&mut self, gate: &dyn ActionGate) -> RuntimeResult<StepOutcome> {
        let Some(step) = self.steps.next() else {
            return Ok(StepOutcome::Done {
                success: self.success,
            });
        };

        if let Some(delay) = step.delay_ms {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if let Some(message) = step.fail {
            return Err(RuntimeError::Engine(message));
        }

        for action in step.actions {
            let result = gate.intercept(action, &self.executor).await;
            if result.is_done {
                return Ok(StepOutcome::Done {
                    success: !result.is_error(),
                });
            }
        }
        Ok(StepOutcome::Continue)
    }

    async fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        debug!("Scripted agent closed");
    }
}

/// Executor that records actions instead of performing them.
///
/// A `done` action produces a final result.
#[derive(Debug, Clone)]
pub struct DryRunExecutor {
    state: Arc<ScriptState>,
}

#[async_trait]
impl ActionExecutor for DryRunExecutor {
    async fn execute(&self, action: &ProposedAction) -> ActionResult {
        info!(action = %action.name, args = ?action.args, "Dry-run execute");
        if let Ok(mut guard) = self.state.executed.lock() {
            guard.push(action.clone());
        }
        let result = ActionResult::ok(format!("dry run: {}", action.name));
        if action.name == "done" {
            result.done()
        } else {
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{ModelSelection, SessionId};

    struct PassGate;

    #[async_trait]
    impl ActionGate for PassGate {
        async fn intercept(
            &self,
            action: ProposedAction,
            executor: &dyn ActionExecutor,
        ) -> ActionResult {
            executor.execute(&action).await
        }
    }

    struct RejectGate;

    #[async_trait]
    impl ActionGate for RejectGate {
        async fn intercept(
            &self,
            _action: ProposedAction,
            _executor: &dyn ActionExecutor,
        ) -> ActionResult {
            ActionResult::rejected("no")
        }
    }

    fn task() -> AgentTask {
        AgentTask {
            session_id: SessionId::new(),
            task: "compare fees".to_string(),
            model: ModelSelection::default(),
            model_provider_token: "tok".to_string(),
        }
    }

    #[test]
    fn parses_plan_json() {
        let plan = ScriptedPlan::from_json(
            r#"{"steps": [{"actions": [{"name": "click", "args": {"index": 2}}]}, {"fail": "boom"}]}"#,
        )
        .unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].actions[0].name, "click");
        assert_eq!(plan.steps[1].fail.as_deref(), Some("boom"));
        assert!(plan.success);
    }

    #[test]
    fn rejects_bad_plan() {
        let err = ScriptedPlan::from_json("{\"steps\": 3}").unwrap_err();
        assert!(matches!(err, RuntimeError::Plan(_)));
    }

    #[tokio::test]
    async fn loads_plan_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, serde_json::to_string(&ScriptedPlan::demo()).unwrap()).unwrap();

        let plan = ScriptedPlan::load(&path).await.unwrap();
        assert_eq!(plan, ScriptedPlan::demo());
    }

    #[tokio::test]
    async fn replays_until_done() {
        let launcher = ScriptedLauncher::new(ScriptedPlan::demo());
        let mut driver = launcher.launch(&task()).await.unwrap();

        let mut outcomes = Vec::new();
        loop {
            let outcome = driver.step(&PassGate).await.unwrap();
            outcomes.push(outcome);
            if outcome != StepOutcome::Continue {
                break;
            }
        }
        driver.close().await;

        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[3], StepOutcome::Done { success: true });
        assert_eq!(launcher.executed().len(), 4);
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn rejected_actions_never_execute() {
        let launcher = ScriptedLauncher::new(ScriptedPlan::demo());
        let mut driver = launcher.launch(&task()).await.unwrap();
        for _ in 0..4 {
            assert_eq!(driver.step(&RejectGate).await.unwrap(), StepOutcome::Continue);
        }
        assert_eq!(
            driver.step(&RejectGate).await.unwrap(),
            StepOutcome::Done { success: true }
        );
        assert!(launcher.executed().is_empty());
    }

    #[tokio::test]
    async fn failing_step_is_an_engine_error() {
        let launcher = ScriptedLauncher::new(ScriptedPlan::new(vec![ScriptedStep::failing(
            "browser crashed",
        )]));
        let mut driver = launcher.launch(&task()).await.unwrap();
        let err = driver.step(&PassGate).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Engine(ref m) if m == "browser crashed"));
    }

    #[tokio::test]
    async fn launch_error() {
        let plan = ScriptedPlan {
            launch_error: Some("no display".to_string()),
            ..ScriptedPlan::default()
        };
        let launcher = ScriptedLauncher::new(plan);
        assert!(matches!(
            launcher.launch(&task()).await,
            Err(RuntimeError::Launch(_))
        ));
        assert_eq!(launcher.launches(), 0);
    }
}
