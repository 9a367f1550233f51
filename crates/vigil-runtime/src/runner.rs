//! Session lifecycle driver.
//!
//! ```text
//! initializing ─► [creating_policies] ─► running ─┬─► done{success}
//!                                                 ├─► status stopped   (cancelled)
//!                                                 └─► error{message}   (engine fault)
//! ```
//!
//! The engine context is closed and owned policies are released on every
//! path.

use std::any::Any;
use std::convert::identity;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_approval::{APPROVAL_TIMEOUT, ActionInterceptor, ApprovalRegistry, ValidationGateway};
use vigil_core::{EventSink, SessionEvent, SessionState};
use vigil_policy::{PolicyProvisioner, PolicyValidator, ProvisionedPolicies};

use crate::engine::{AgentDriver, AgentLauncher, AgentTask, StepOutcome};
use crate::error::{RuntimeError, RuntimeResult};

/// Step budget per session.
pub const MAX_STEPS: u32 = 100;

/// Tunables for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Step budget.
    pub max_steps: u32,
    /// How long a denied action waits for a reviewer.
    pub approval_timeout: Duration,
    /// Whether to provision the demo policy set first.
    pub provision_policies: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            approval_timeout: APPROVAL_TIMEOUT,
            provision_policies: true,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The agent finished (or ran out of steps, with `success: false`).
    Completed {
        /// Whether the agent reported success.
        success: bool,
    },
    /// Cancelled from outside.
    Stopped,
    /// The engine failed.
    Failed(String),
}

impl RunOutcome {
    /// Lifecycle state matching this outcome.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self {
            Self::Completed { .. } => SessionState::Done,
            Self::Stopped => SessionState::Stopped,
            Self::Failed(_) => SessionState::Error,
        }
    }
}

/// Summary returned when a run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Completed steps.
    pub steps: u32,
    /// Policies active during the run.
    pub policies: ProvisionedPolicies,
}

/// External collaborators of one session.
#[derive(Clone)]
pub struct SessionServices {
    /// Agent engine.
    pub launcher: Arc<dyn AgentLauncher>,
    /// Per-action validation.
    pub validator: Arc<dyn PolicyValidator>,
    /// Demo policy provisioning.
    pub provisioner: Arc<dyn PolicyProvisioner>,
}

impl std::fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionServices").finish_non_exhaustive()
    }
}

/// Drives one session.
pub struct SessionRunner {
    task: AgentTask,
    settings: RunnerSettings,
    services: SessionServices,
    registry: ApprovalRegistry,
    events: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl SessionRunner {
    /// Create a runner. `registry` is shared with whoever resolves
    /// approvals; `cancel` stops the run.
    #[must_use]
    pub fn new(
        task: AgentTask,
        settings: RunnerSettings,
        services: SessionServices,
        registry: ApprovalRegistry,
        events: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            task,
            settings,
            services,
            registry,
            events,
            cancel,
        }
    }

    /// Run to completion. Never fails; the outcome is reported as events
    /// and in the returned [`RunReport`].
    pub async fn run(self) -> RunReport {
        let session_id = self.task.session_id.clone();
        let max_steps = self.settings.max_steps;
        self.events.emit(SessionEvent::status(0, max_steps, SessionState::Initializing));

        let provisioned = if self.cancel.is_cancelled() || !self.settings.provision_policies {
            Ok(ProvisionedPolicies::default())
        } else {
            self.events.emit(SessionEvent::status(0, 0, SessionState::CreatingPolicies));
            guarded(
                "policy provisioning",
                self.services.provisioner.ensure_policies(),
            )
            .await
        };

        let (policies, (outcome, steps)) = match provisioned {
            Ok(policies) => {
                if !policies.is_empty() {
                    info!(
                        session_id = %session_id,
                        created = policies.created.len(),
                        reused = policies.reused.len(),
                        "Demo policies ready"
                    );
                }
                let result = if self.cancel.is_cancelled() {
                    (RunOutcome::Stopped, 0)
                } else {
                    self.execute().await
                };
                (policies, result)
            },
            Err(e) => (
                ProvisionedPolicies::default(),
                (RunOutcome::Failed(e.to_string()), 0),
            ),
        };

        match &outcome {
            RunOutcome::Completed { success } => {
                info!(session_id = %session_id, steps, success, "Session finished");
                self.events.emit(SessionEvent::Done { success: *success });
            },
            RunOutcome::Stopped => {
                info!(session_id = %session_id, steps, "Session stopped");
                self.events.emit(SessionEvent::status(0, 0, SessionState::Stopped));
            },
            RunOutcome::Failed(message) => {
                error!(session_id = %session_id, steps, error = %message, "Session failed");
                self.events.emit(SessionEvent::error(message.clone()));
            },
        }

        if !policies.owned().is_empty()
            && let Err(e) = guarded(
                "policy release",
                self.services.provisioner.delete_policies(policies.owned()),
            )
            .await
        {
            error!(session_id = %session_id, error = %e, "Failed to release policies");
        }

        RunReport {
            outcome,
            steps,
            policies,
        }
    }

    async fn execute(&self) -> (RunOutcome, u32) {
        let launched = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return (RunOutcome::Stopped, 0),
            launched = guarded("agent launch", self.services.launcher.launch(&self.task)) => {
                launched.and_then(identity)
            },
        };
        let mut driver = match launched {
            Ok(driver) => driver,
            Err(e) => return (RunOutcome::Failed(e.to_string()), 0),
        };

        let interceptor = ActionInterceptor::new(
            self.task.session_id.clone(),
            ValidationGateway::new(Arc::clone(&self.services.validator)),
            self.registry.clone(),
            Arc::clone(&self.events),
            self.cancel.clone(),
        )
        .with_approval_timeout(self.settings.approval_timeout);

        self.events
            .emit(SessionEvent::status(0, self.settings.max_steps, SessionState::Running));

        let result = self.drive(driver.as_mut(), &interceptor).await;
        if let Err(e) = guarded("agent close", driver.close()).await {
            warn!(session_id = %self.task.session_id, error = %e, "Failed to close agent");
        }
        result
    }

    async fn drive(
        &self,
        driver: &mut dyn AgentDriver,
        gate: &ActionInterceptor,
    ) -> (RunOutcome, u32) {
        let max_steps = self.settings.max_steps;
        let mut step: u32 = 0;

        while step < max_steps {
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return (RunOutcome::Stopped, step),
                result = guarded("agent step", driver.step(gate)) => result.and_then(identity),
            };

            step = step.saturating_add(1);
            match result {
                Ok(outcome) => {
                    self.events
                        .emit(SessionEvent::status(step, max_steps, SessionState::Running));
                    if let StepOutcome::Done { success } = outcome {
                        return (RunOutcome::Completed { success }, step);
                    }
                },
                Err(e) => return (RunOutcome::Failed(e.to_string()), step),
            }
        }

        warn!(session_id = %self.task.session_id, max_steps, "Step budget exhausted");
        (RunOutcome::Completed { success: false }, step)
    }
}

/// Await `fut`, turning a panic into [`RuntimeError::Panicked`].
async fn guarded<T>(what: &'static str, fut: impl Future<Output = T>) -> RuntimeResult<T> {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|payload| RuntimeError::Panicked(what, panic_message(payload.as_ref())))
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl std::fmt::Debug for SessionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRunner")
            .field("task", &self.task)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
