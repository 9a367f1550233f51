//! Per-action approval gate.
//!
//! ```text
//! proposed action
//!   ├─ outside validated set ──────────────────────────────► execute
//!   └─ validate ─► decision event
//!        ├─ allow ─────────────────────────────────────────► execute
//!        └─ deny ─► approval_needed ─► wait
//!             ├─ approve ──────────────────────────────────► execute
//!             ├─ deny ─────────► "Denied by reviewer"
//!             ├─ timeout ──────► "Approval timed out after 5 minutes"
//!             └─ cancelled ────► "Session stopped"
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_core::{
    ActionExecutor, ActionGate, ActionResult, ApprovalNotice, DecisionRecord, EventSink,
    ProposedAction, SessionEvent, SessionId,
};

use crate::error::ApprovalResult;
use crate::gateway::ValidationGateway;
use crate::registry::{ApprovalRegistry, WaitOutcome};

/// How long a denied action waits for a reviewer.
pub const APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);

/// Rejection reason when the reviewer denies.
pub const DENIED_BY_REVIEWER: &str = "Denied by reviewer";

/// Rejection reason when the session stops while an approval is pending.
pub const SESSION_STOPPED: &str = "Session stopped";

/// Gates every proposed action of one session.
pub struct ActionInterceptor {
    session_id: SessionId,
    gateway: ValidationGateway,
    registry: ApprovalRegistry,
    events: Arc<dyn EventSink>,
    cancel: CancellationToken,
    approval_timeout: Duration,
}

impl ActionInterceptor {
    /// Create an interceptor for `session_id`.
    #[must_use]
    pub fn new(
        session_id: SessionId,
        gateway: ValidationGateway,
        registry: ApprovalRegistry,
        events: Arc<dyn EventSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            gateway,
            registry,
            events,
            cancel,
            approval_timeout: APPROVAL_TIMEOUT,
        }
    }

    /// Override the approval timeout.
    #[must_use]
    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    /// The registry reviewers resolve against.
    #[must_use]
    pub fn registry(&self) -> &ApprovalRegistry {
        &self.registry
    }

    async fn gate(
        &self,
        action: ProposedAction,
        executor: &dyn ActionExecutor,
    ) -> ApprovalResult<ActionResult> {
        let verdict = self.gateway.validate(&action).await;
        self.events
            .emit(SessionEvent::Decision(DecisionRecord::new(&action, &verdict)));

        if verdict.allowed {
            info!(
                session_id = %self.session_id,
                action = %action.name,
                latency_ms = verdict.latency_ms(),
                mode = %verdict.mode,
                "Action allowed"
            );
            return Ok(executor.execute(&action).await);
        }

        let reason = verdict.deny_reason();
        let waiter = self.registry.register();
        let approval_id = waiter.id().clone();
        info!(
            session_id = %self.session_id,
            approval_id = %approval_id,
            action = %action.name,
            reason = %reason,
            "Action denied, awaiting reviewer"
        );
        self.events.emit(SessionEvent::ApprovalNeeded(ApprovalNotice {
            id: approval_id.clone(),
            action: action.name.clone(),
            args: action.display_args(),
            reason,
        }));

        let outcome = waiter.wait(self.approval_timeout, &self.cancel).await?;
        info!(
            session_id = %self.session_id,
            approval_id = %approval_id,
            outcome = ?outcome,
            "Approval settled"
        );

        Ok(match outcome {
            WaitOutcome::Resolved(decision) if decision.is_approved() => {
                executor.execute(&action).await
            },
            WaitOutcome::Resolved(_) => ActionResult::rejected(DENIED_BY_REVIEWER),
            WaitOutcome::TimedOut => ActionResult::rejected(format!(
                "Approval timed out after {}",
                describe_duration(self.approval_timeout)
            )),
            WaitOutcome::Cancelled => {
                warn!(session_id = %self.session_id, approval_id = %approval_id, "Session stopped during approval");
                ActionResult::rejected(SESSION_STOPPED)
            },
        })
    }
}

#[async_trait]
impl ActionGate for ActionInterceptor {
    async fn intercept(
        &self,
        action: ProposedAction,
        executor: &dyn ActionExecutor,
    ) -> ActionResult {
        if !action.is_validated() {
            return executor.execute(&action).await;
        }

        let name = action.name.clone();
        match self.gate(action, executor).await {
            Ok(result) => result,
            Err(e) => {
                error!(session_id = %self.session_id, action = %name, error = %e, "Validation error");
                ActionResult::rejected(format!("Validation error: {e}"))
            },
        }
    }
}

impl std::fmt::Debug for ActionInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionInterceptor")
            .field("session_id", &self.session_id)
            .field("approval_timeout", &self.approval_timeout)
            .finish_non_exhaustive()
    }
}

/// Human phrasing of a timeout, e.g. `5 minutes` or `90 seconds`.
fn describe_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s > 0 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{ApprovalDecision, ValidationMode};
    use vigil_test::{MockValidator, RecordingExecutor, RecordingSink};

    struct Harness {
        interceptor: ActionInterceptor,
        validator: Arc<MockValidator>,
        sink: Arc<RecordingSink>,
        executor: RecordingExecutor,
        cancel: CancellationToken,
    }

    fn harness(validator: MockValidator) -> Harness {
        let validator = Arc::new(validator);
        let sink = Arc::new(RecordingSink::new());
        let cancel = CancellationToken::new();
        let interceptor = ActionInterceptor::new(
            SessionId::new(),
            ValidationGateway::new(validator.clone()),
            ApprovalRegistry::new(),
            sink.clone(),
            cancel.clone(),
        );
        Harness {
            interceptor,
            validator,
            sink,
            executor: RecordingExecutor::new(),
            cancel,
        }
    }

    fn chase() -> ProposedAction {
        ProposedAction::new("navigate").with_arg("url", "https://chase.com")
    }

    /// Wait until the interceptor has published an approval id.
    async fn pending_approval(sink: &RecordingSink) -> vigil_core::ApprovalId {
        loop {
            if let Some(notice) = sink.approval_requests().into_iter().next() {
                return notice.id;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn unvalidated_action_bypasses_everything() {
        let h = harness(MockValidator::new());
        let result = h
            .interceptor
            .intercept(ProposedAction::new("go_back"), &h.executor)
            .await;

        assert!(!result.is_error());
        assert_eq!(h.executor.executed_names(), vec!["go_back".to_string()]);
        assert!(h.validator.calls().is_empty());
        assert!(h.sink.events().is_empty());
    }

    #[tokio::test]
    async fn allowed_action_is_forwarded() {
        let h = harness(MockValidator::new().allow_with_mode("click", ValidationMode::Llm));
        let result = h
            .interceptor
            .intercept(ProposedAction::new("click").with_arg("index", 7), &h.executor)
            .await;

        assert!(!result.is_error());
        assert_eq!(h.executor.executed_names(), vec!["click".to_string()]);

        let decisions = h.sink.decisions();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].decision, vigil_core::Verdict::Allow);
        assert_eq!(decisions[0].mode, ValidationMode::Llm);
        assert!(h.sink.approval_requests().is_empty());
    }

    #[tokio::test]
    async fn approved_action_is_forwarded() {
        let h = harness(MockValidator::new().deny("navigate", "blocked domain"));
        let registry = h.interceptor.registry().clone();

        let (result, ()) = tokio::join!(
            h.interceptor.intercept(chase(), &h.executor),
            async {
                let id = pending_approval(&h.sink).await;
                assert!(registry.resolve(&id, ApprovalDecision::Approve));
            }
        );

        assert!(!result.is_error());
        assert_eq!(h.executor.executed_names(), vec!["navigate".to_string()]);
        let notice = &h.sink.approval_requests()[0];
        assert_eq!(notice.reason, "blocked domain");
        assert_eq!(notice.args["url"], "https://chase.com");
    }

    #[tokio::test]
    async fn reviewer_deny_rejects_without_executing() {
        let h = harness(MockValidator::new().deny("navigate", "blocked domain"));
        let registry = h.interceptor.registry().clone();

        let (result, ()) = tokio::join!(
            h.interceptor.intercept(chase(), &h.executor),
            async {
                let id = pending_approval(&h.sink).await;
                assert!(registry.resolve(&id, ApprovalDecision::Deny));
            }
        );

        assert_eq!(result.error.as_deref(), Some(DENIED_BY_REVIEWER));
        assert!(h.executor.executed_names().is_empty());

        let kinds: Vec<&str> = h.sink.events().iter().map(SessionEvent::kind).collect();
        assert_eq!(kinds, vec!["decision", "approval_needed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_rejects_and_expires_approval() {
        let h = harness(MockValidator::new().deny("input", "too long"));
        let result = h
            .interceptor
            .intercept(
                ProposedAction::new("input").with_arg("text", "x".repeat(600)),
                &h.executor,
            )
            .await;

        assert_eq!(
            result.error.as_deref(),
            Some("Approval timed out after 5 minutes")
        );
        assert!(h.executor.executed_names().is_empty());

        let id = h.sink.approval_requests()[0].id.clone();
        assert!(!h.interceptor.registry().resolve(&id, ApprovalDecision::Approve));
    }

    #[tokio::test]
    async fn cancellation_unblocks_pending_approval() {
        let h = harness(MockValidator::new().deny("navigate", "blocked"));
        let cancel = h.cancel.clone();

        let (result, ()) = tokio::join!(h.interceptor.intercept(chase(), &h.executor), async {
            pending_approval(&h.sink).await;
            cancel.cancel();
        });

        assert_eq!(result.error.as_deref(), Some(SESSION_STOPPED));
        assert!(h.executor.executed_names().is_empty());
        assert_eq!(h.interceptor.registry().pending_count(), 0);
    }

    #[tokio::test]
    async fn validator_failure_degrades_to_approval_request() {
        let h = harness(MockValidator::new().fail("scroll", "503 from validator"));
        let registry = h.interceptor.registry().clone();

        let (result, ()) = tokio::join!(
            h.interceptor
                .intercept(ProposedAction::new("scroll").with_arg("down", true), &h.executor),
            async {
                let id = pending_approval(&h.sink).await;
                registry.resolve(&id, ApprovalDecision::Deny);
            }
        );

        assert!(result.is_error());
        let decision = &h.sink.decisions()[0];
        assert_eq!(decision.decision, vigil_core::Verdict::Deny);
        assert!(
            decision
                .reason
                .as_deref()
                .unwrap()
                .starts_with(crate::GATEWAY_ERROR_PREFIX)
        );
    }

    #[tokio::test]
    async fn abandoned_approval_becomes_rejection() {
        let h = harness(MockValidator::new().deny("extract", "no scraping"));
        let registry = h.interceptor.registry().clone();

        let (result, ()) = tokio::join!(
            h.interceptor
                .intercept(ProposedAction::new("extract").with_arg("query", "prices"), &h.executor),
            async {
                pending_approval(&h.sink).await;
                registry.clear();
            }
        );

        let error = result.error.unwrap();
        assert!(error.starts_with("Validation error:"), "{error}");
        assert!(h.executor.executed_names().is_empty());
    }

    #[tokio::test]
    async fn long_arguments_are_capped_in_events() {
        let h = harness(MockValidator::new());
        let long = "q".repeat(500);
        h.interceptor
            .intercept(ProposedAction::new("search").with_arg("query", long.clone()), &h.executor)
            .await;

        let decision = &h.sink.decisions()[0];
        let shown = decision.args["query"].as_str().unwrap();
        assert_eq!(shown.chars().count(), 203);
        assert!(shown.ends_with("..."));
        // Execution still sees the full value.
        assert_eq!(h.executor.executed()[0].args["query"], long.as_str());
    }

    #[test]
    fn describes_timeouts() {
        assert_eq!(describe_duration(Duration::from_secs(300)), "5 minutes");
        assert_eq!(describe_duration(Duration::from_secs(60)), "1 minute");
        assert_eq!(describe_duration(Duration::from_secs(90)), "90 seconds");
        assert_eq!(describe_duration(Duration::from_secs(1)), "1 second");
    }
}
