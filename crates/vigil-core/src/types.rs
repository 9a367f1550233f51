//! Identifiers and small enums shared across the session lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for a supervised session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a session ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a pending approval.
///
/// Always freshly generated; never derived from the session or the action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub Uuid);

impl ApprovalId {
    /// Create a new random approval ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApprovalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a policy provisioned on the validator service.
///
/// Opaque to us; the service chooses the format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(pub String);

impl PolicyId {
    /// Wrap a service-issued policy id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the service handed back an empty id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a session, as reported in `status` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, execution not yet started.
    Initializing,
    /// Provisioning the demo policy set.
    CreatingPolicies,
    /// Agent loop is running.
    Running,
    /// Stop requested, waiting for the task to unwind.
    Stopping,
    /// Cancelled before completion.
    Stopped,
    /// Agent loop completed.
    Done,
    /// Agent loop failed.
    Error,
}

impl SessionState {
    /// Whether the session can no longer make progress.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Done | Self::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::CreatingPolicies => "creating_policies",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// The language model driving the agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelSelection {
    /// Claude Sonnet 4.5 (default).
    #[default]
    #[serde(rename = "claude-sonnet-4.5")]
    ClaudeSonnet45,
    /// Claude Opus 4.5.
    #[serde(rename = "claude-opus-4.5")]
    ClaudeOpus45,
}

impl ModelSelection {
    /// The wire name used by the control surface.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClaudeSonnet45 => "claude-sonnet-4.5",
            Self::ClaudeOpus45 => "claude-opus-4.5",
        }
    }

    /// The provider-side model identifier.
    #[must_use]
    pub fn model_id(self) -> &'static str {
        match self {
            Self::ClaudeSonnet45 => "claude-sonnet-4-5-20250929",
            Self::ClaudeOpus45 => "claude-opus-4-5-20251101",
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSelection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude-sonnet-4.5" => Ok(Self::ClaudeSonnet45),
            "claude-opus-4.5" => Ok(Self::ClaudeOpus45),
            other => Err(CoreError::UnknownModel(other.to_string())),
        }
    }
}

/// A reviewer's resolution of a pending approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Let the action proceed to execution.
    Approve,
    /// Reject the action.
    Deny,
}

impl ApprovalDecision {
    /// Interpret a decision string from the control surface.
    ///
    /// Only the literal `"approve"` approves. Anything else, including
    /// malformed input, is a deny.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        if value == "approve" {
            Self::Approve
        } else {
            Self::Deny
        }
    }

    /// Whether this decision lets the action run.
    #[must_use]
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approve)
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => f.write_str("approve"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_ne!(ApprovalId::new(), ApprovalId::new());
    }

    #[test]
    fn ids_are_random_v4() {
        assert_eq!(SessionId::new().0.get_version_num(), 4);
        assert_eq!(ApprovalId::new().0.get_version_num(), 4);
    }

    #[test]
    fn session_id_serializes_as_bare_uuid() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }

    #[test]
    fn session_state_wire_names() {
        let json = serde_json::to_string(&SessionState::CreatingPolicies).unwrap();
        assert_eq!(json, "\"creating_policies\"");
        assert_eq!(SessionState::Stopped.to_string(), "stopped");
        assert!(SessionState::Error.is_terminal());
        assert!(!SessionState::Running.is_terminal());
    }

    #[test]
    fn model_selection_parses_both_models() {
        assert_eq!(
            "claude-opus-4.5".parse::<ModelSelection>().unwrap(),
            ModelSelection::ClaudeOpus45
        );
        assert_eq!(ModelSelection::default(), ModelSelection::ClaudeSonnet45);
        assert!("gpt-4".parse::<ModelSelection>().is_err());

        let parsed: ModelSelection = serde_json::from_str("\"claude-sonnet-4.5\"").unwrap();
        assert_eq!(parsed, ModelSelection::ClaudeSonnet45);
    }

    #[test]
    fn only_literal_approve_approves() {
        assert_eq!(ApprovalDecision::from_wire("approve"), ApprovalDecision::Approve);
        assert_eq!(ApprovalDecision::from_wire("deny"), ApprovalDecision::Deny);
        assert_eq!(ApprovalDecision::from_wire("APPROVE"), ApprovalDecision::Deny);
        assert_eq!(ApprovalDecision::from_wire(""), ApprovalDecision::Deny);
    }

    #[test]
    fn empty_policy_id() {
        assert!(PolicyId::new("").is_empty());
        assert_eq!(PolicyId::new("pol_1").as_str(), "pol_1");
    }
}
