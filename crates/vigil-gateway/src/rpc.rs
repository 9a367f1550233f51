//! JSON-RPC API definition for the session control surface.
//!
//! The gateway implements the server side; observers and tests use the
//! generated client.

use chrono::{DateTime, Utc};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};
use vigil_core::{ApprovalId, ModelSelection, SessionEvent, SessionId, SessionState};

// ---------- Wire types ----------

/// Parameters of `vigil_startSession`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionParams {
    /// What the agent should do.
    pub task: String,
    /// Credential for the validator service.
    pub validator_api_key: String,
    /// Validator endpoint; the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_base_url: Option<String>,
    /// Model-provider token; environment fallbacks when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_provider_token: Option<String>,
    /// Model driving the agent.
    #[serde(default)]
    pub llm_model: ModelSelection,
    /// Whether to provision the demo policy set.
    #[serde(default = "default_true")]
    pub use_demo_policies: bool,
}

fn default_true() -> bool {
    true
}

impl StartSessionParams {
    /// Parameters for `task` with defaults for everything optional.
    #[must_use]
    pub fn new(task: impl Into<String>, validator_api_key: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            validator_api_key: validator_api_key.into(),
            validator_base_url: None,
            model_provider_token: None,
            llm_model: ModelSelection::default(),
            use_demo_policies: true,
        }
    }
}

/// Result of `vigil_startSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    /// Opaque session identifier.
    pub session_id: SessionId,
}

/// Acknowledgement body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Always `true`.
    pub ok: bool,
}

impl Ack {
    /// A positive acknowledgement.
    pub const OK: Self = Self { ok: true };
}

/// Summary of a live session returned by `vigil_listSessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session identifier.
    pub id: SessionId,
    /// Task description.
    pub task: String,
    /// Latest lifecycle state.
    pub state: SessionState,
    /// Model driving the agent.
    pub model: ModelSelection,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Approvals waiting for a reviewer.
    pub pending_approvals: usize,
    /// Whether an observer is attached.
    pub observer_attached: bool,
}

// ---------- RPC API ----------

/// The Vigil control surface.
#[rpc(server, client, namespace = "vigil")]
pub trait VigilRpc {
    /// Liveness probe.
    #[method(name = "health")]
    async fn health(&self) -> Result<Ack, ErrorObjectOwned>;

    /// Create a session. The agent does not start until an observer
    /// subscribes to its events.
    #[method(name = "startSession")]
    async fn start_session(
        &self,
        params: StartSessionParams,
    ) -> Result<SessionStarted, ErrorObjectOwned>;

    /// Resolve a pending approval. Only `"approve"` approves; any other
    /// value denies.
    #[method(name = "resolveApproval")]
    async fn resolve_approval(
        &self,
        session_id: SessionId,
        approval_id: ApprovalId,
        decision: String,
    ) -> Result<Ack, ErrorObjectOwned>;

    /// Cancel a session's agent loop.
    #[method(name = "stopSession")]
    async fn stop_session(&self, session_id: SessionId) -> Result<Ack, ErrorObjectOwned>;

    /// List live sessions.
    #[method(name = "listSessions")]
    async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ErrorObjectOwned>;

    /// Attach as the session's observer and start its agent loop.
    #[subscription(name = "subscribeEvents" => "event", unsubscribe = "unsubscribeEvents", item = SessionEvent)]
    async fn subscribe_events(&self, session_id: SessionId) -> jsonrpsee::core::SubscriptionResult;
}

/// Error codes for the RPC API.
pub mod error_codes {
    /// Session not found.
    pub const SESSION_NOT_FOUND: i32 = -32001;
    /// Approval not found, already resolved, or expired.
    pub const APPROVAL_NOT_FOUND: i32 = -32002;
    /// The session already has a live observer.
    pub const OBSERVER_ATTACHED: i32 = -32003;
    /// Internal gateway error.
    pub const INTERNAL_ERROR: i32 = -32004;
    /// Invalid request (bad parameters, etc.).
    pub const INVALID_REQUEST: i32 = -32005;
    /// No model-provider token available.
    pub const MISSING_CREDENTIAL: i32 = -32006;
}
