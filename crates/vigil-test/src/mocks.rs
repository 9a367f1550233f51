//! Mock collaborators for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use vigil_core::{
    ActionExecutor, ActionResult, ApprovalNotice, DecisionRecord, EventSink, PolicyId,
    ProposedAction, SessionEvent, StatusUpdate, ValidationMode, ValidationVerdict,
};
use vigil_policy::{PolicyError, PolicyProvisioner, PolicyResult, PolicyValidator, ProvisionedPolicies};

#[derive(Debug, Clone)]
enum Rule {
    Allow(ValidationMode),
    Deny { reason: String, mode: ValidationMode },
    Fail(String),
}

/// Scriptable [`PolicyValidator`].
///
/// Actions without a rule are allowed in deterministic mode.
#[derive(Debug, Clone, Default)]
pub struct MockValidator {
    rules: HashMap<String, Rule>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockValidator {
    /// Create a validator that allows everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `action` with the given mode.
    #[must_use]
    pub fn allow_with_mode(mut self, action: &str, mode: ValidationMode) -> Self {
        self.rules.insert(action.to_string(), Rule::Allow(mode));
        self
    }

    /// Deny `action` deterministically with `reason`.
    #[must_use]
    pub fn deny(self, action: &str, reason: &str) -> Self {
        self.deny_with_mode(action, reason, ValidationMode::Deterministic)
    }

    /// Deny `action` with `reason` and `mode`.
    #[must_use]
    pub fn deny_with_mode(mut self, action: &str, reason: &str, mode: ValidationMode) -> Self {
        self.rules.insert(
            action.to_string(),
            Rule::Deny {
                reason: reason.to_string(),
                mode,
            },
        );
        self
    }

    /// Fail the call for `action` as an unavailable service would.
    #[must_use]
    pub fn fail(mut self, action: &str, message: &str) -> Self {
        self.rules
            .insert(action.to_string(), Rule::Fail(message.to_string()));
        self
    }

    /// Sleep before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Names of the actions validated so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PolicyValidator for MockValidator {
    async fn validate(&self, action: &ProposedAction) -> PolicyResult<ValidationVerdict> {
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(action.name.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        debug!(action = %action.name, "MockValidator validating");

        match self.rules.get(&action.name) {
            None => Ok(ValidationVerdict::allow(ValidationMode::Deterministic)),
            Some(Rule::Allow(mode)) => Ok(ValidationVerdict::allow(*mode)),
            Some(Rule::Deny { reason, mode }) => Ok(ValidationVerdict::deny(reason.clone(), *mode)),
            Some(Rule::Fail(message)) => Err(PolicyError::Status {
                status: 503,
                body: message.clone(),
            }),
        }
    }
}

/// Recording [`PolicyProvisioner`].
#[derive(Debug, Clone, Default)]
pub struct MockProvisioner {
    provisioned: ProvisionedPolicies,
    ensure_calls: Arc<Mutex<usize>>,
    deleted: Arc<Mutex<Vec<PolicyId>>>,
}

impl MockProvisioner {
    /// Create a provisioner that provisions nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report these ids as created by the session.
    #[must_use]
    pub fn with_created(mut self, ids: &[&str]) -> Self {
        self.provisioned.created = ids.iter().map(|id| PolicyId::new(*id)).collect();
        self
    }

    /// Report these ids as pre-existing.
    #[must_use]
    pub fn with_reused(mut self, ids: &[&str]) -> Self {
        self.provisioned.reused = ids.iter().map(|id| PolicyId::new(*id)).collect();
        self
    }

    /// How often `ensure_policies` ran.
    #[must_use]
    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.lock().map(|g| *g).unwrap_or_default()
    }

    /// Every id passed to `delete_policies`.
    #[must_use]
    pub fn deleted(&self) -> Vec<PolicyId> {
        self.deleted.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PolicyProvisioner for MockProvisioner {
    async fn ensure_policies(&self) -> ProvisionedPolicies {
        if let Ok(mut guard) = self.ensure_calls.lock() {
            *guard = guard.saturating_add(1);
        }
        self.provisioned.clone()
    }

    async fn delete_policies(&self, ids: &[PolicyId]) {
        if let Ok(mut guard) = self.deleted.lock() {
            guard.extend(ids.iter().cloned());
        }
    }
}

/// [`ActionExecutor`] that records what it ran.
///
/// An action named `done` produces a final result.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    executed: Arc<Mutex<Vec<ProposedAction>>>,
}

impl RecordingExecutor {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every executed action, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<ProposedAction> {
        self.executed.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Names of executed actions, in order.
    #[must_use]
    pub fn executed_names(&self) -> Vec<String> {
        self.executed().into_iter().map(|a| a.name).collect()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, action: &ProposedAction) -> ActionResult {
        if let Ok(mut guard) = self.executed.lock() {
            guard.push(action.clone());
        }
        let result = ActionResult::ok(format!("executed {}", action.name));
        if action.name == "done" {
            result.done()
        } else {
            result
        }
    }
}

/// [`EventSink`] that keeps every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Event tags, in emission order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(SessionEvent::kind).collect()
    }

    /// Payloads of `status` events.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusUpdate> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Payloads of `decision` events.
    #[must_use]
    pub fn decisions(&self) -> Vec<DecisionRecord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Decision(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Payloads of `approval_needed` events.
    #[must_use]
    pub fn approval_requests(&self) -> Vec<ApprovalNotice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::ApprovalNeeded(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: SessionEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
