//! Events streamed to a session's observer.
//!
//! Every event is serialized as `{"type": <tag>, "data": <payload>}` with
//! camelCase payload fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::ProposedAction;
use crate::types::{ApprovalDecision, ApprovalId, SessionState};
use crate::verdict::{ValidationMode, ValidationVerdict, Verdict};

/// An event emitted during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Lifecycle and step progress.
    Status(StatusUpdate),
    /// Validation outcome for one proposed action.
    Decision(DecisionRecord),
    /// A denied action is waiting for a reviewer.
    ApprovalNeeded(ApprovalNotice),
    /// A reviewer resolved a pending approval.
    ApprovalResolved(ApprovalResolution),
    /// The agent loop finished.
    Done {
        /// Whether the agent reported the task complete.
        success: bool,
    },
    /// The agent loop failed.
    Error {
        /// Failure description.
        message: String,
    },
}

impl SessionEvent {
    /// The wire tag of this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Decision(_) => "decision",
            Self::ApprovalNeeded(_) => "approval_needed",
            Self::ApprovalResolved(_) => "approval_resolved",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Shorthand for a status event.
    #[must_use]
    pub fn status(step: u32, max_steps: u32, state: SessionState) -> Self {
        Self::Status(StatusUpdate {
            step,
            max_steps,
            state,
        })
    }

    /// Shorthand for an error event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Payload of a `status` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Completed steps.
    pub step: u32,
    /// Step budget, zero when not applicable.
    pub max_steps: u32,
    /// Current lifecycle state.
    pub state: SessionState,
}

/// Payload of a `decision` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    /// Action kind.
    pub action: String,
    /// Size-capped argument rendering.
    pub args: Map<String, Value>,
    /// Allow or deny.
    pub decision: Verdict,
    /// Validator's explanation.
    pub reason: Option<String>,
    /// Validation latency in milliseconds.
    pub latency_ms: u64,
    /// Strategy that produced the decision.
    pub mode: ValidationMode,
}

impl DecisionRecord {
    /// Build the record for `action` from its verdict.
    ///
    /// Deny decisions always carry a reason.
    #[must_use]
    pub fn new(action: &ProposedAction, verdict: &ValidationVerdict) -> Self {
        let reason = if verdict.allowed {
            verdict.reason.clone()
        } else {
            Some(verdict.deny_reason())
        };
        Self {
            action: action.name.clone(),
            args: action.display_args(),
            decision: verdict.verdict(),
            reason,
            latency_ms: verdict.latency_ms(),
            mode: verdict.mode,
        }
    }
}

/// Payload of an `approval_needed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalNotice {
    /// Approval id to quote when resolving.
    pub id: ApprovalId,
    /// Action kind.
    pub action: String,
    /// Size-capped argument rendering.
    pub args: Map<String, Value>,
    /// Why the validator denied it.
    pub reason: String,
}

/// Payload of an `approval_resolved` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResolution {
    /// The resolved approval.
    pub id: ApprovalId,
    /// The reviewer's decision.
    pub decision: ApprovalDecision,
}

/// Destination for session events.
///
/// Emission never fails from the caller's point of view: a sink that cannot
/// deliver logs and drops.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: SessionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn status_wire_shape() {
        let event = SessionEvent::status(0, 100, SessionState::Initializing);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({"type": "status", "data": {"step": 0, "maxSteps": 100, "state": "initializing"}})
        );
    }

    #[test]
    fn decision_wire_shape() {
        let action = ProposedAction::new("navigate").with_arg("url", "https://chase.com");
        let verdict = ValidationVerdict::deny("blocked domain", ValidationMode::Deterministic)
            .with_latency(Duration::from_millis(42));
        let event = SessionEvent::Decision(DecisionRecord::new(&action, &verdict));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "decision");
        assert_eq!(json["data"]["action"], "navigate");
        assert_eq!(json["data"]["args"]["url"], "https://chase.com");
        assert_eq!(json["data"]["decision"], "deny");
        assert_eq!(json["data"]["reason"], "blocked domain");
        assert_eq!(json["data"]["latencyMs"], 42);
        assert_eq!(json["data"]["mode"], "deterministic");
    }

    #[test]
    fn deny_without_reason_gets_default() {
        let action = ProposedAction::new("input");
        let mut verdict = ValidationVerdict::deny("x", ValidationMode::Llm);
        verdict.reason = None;
        let record = DecisionRecord::new(&action, &verdict);
        assert_eq!(record.reason.as_deref(), Some("Policy violation"));
    }

    #[test]
    fn allow_reason_passes_through_as_null() {
        let action = ProposedAction::new("click").with_arg("index", 3);
        let verdict = ValidationVerdict::allow(ValidationMode::Llm);
        let json = serde_json::to_value(SessionEvent::Decision(DecisionRecord::new(
            &action, &verdict,
        )))
        .unwrap();
        assert_eq!(json["data"]["decision"], "allow");
        assert!(json["data"]["reason"].is_null());
        assert_eq!(json["data"]["mode"], "llm");
    }

    #[test]
    fn approval_events_wire_shape() {
        let id = ApprovalId::new();
        let resolved = SessionEvent::ApprovalResolved(ApprovalResolution {
            id: id.clone(),
            decision: ApprovalDecision::Deny,
        });
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["type"], "approval_resolved");
        assert_eq!(json["data"]["id"], id.to_string());
        assert_eq!(json["data"]["decision"], "deny");
        assert_eq!(resolved.kind(), "approval_resolved");
    }

    #[test]
    fn terminal_events_wire_shape() {
        let done = serde_json::to_value(SessionEvent::Done { success: false }).unwrap();
        assert_eq!(done, json!({"type": "done", "data": {"success": false}}));

        let error = serde_json::to_value(SessionEvent::error("browser crashed")).unwrap();
        assert_eq!(
            error,
            json!({"type": "error", "data": {"message": "browser crashed"}})
        );
    }

    #[test]
    fn events_deserialize_back() {
        let raw = json!({"type": "done", "data": {"success": true}});
        let event: SessionEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event, SessionEvent::Done { success: true });
    }
}
