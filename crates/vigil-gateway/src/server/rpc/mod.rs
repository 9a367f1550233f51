//! RPC implementation for the gateway server.
//!
//! `RpcImpl` holds the shared state and implements `VigilRpcServer` by
//! delegating to `*_impl` methods in focused submodules.

mod approval;
mod events;
mod session;

use std::sync::Arc;

use jsonrpsee::PendingSubscriptionSink;
use jsonrpsee::types::ErrorObjectOwned;
use vigil_core::{ApprovalId, SessionId};

use super::SessionMap;
use super::session::SessionHandle;
use crate::config::{CredentialDefaults, GatewayConfig};
use crate::error::GatewayError;
use crate::rpc::{Ack, SessionInfo, SessionStarted, StartSessionParams, VigilRpcServer, error_codes};
use crate::services::ServiceFactory;

/// The jsonrpsee RPC method handler.
pub(in crate::server) struct RpcImpl {
    /// Session map (brief locks for insert/remove/lookup only).
    pub(in crate::server) sessions: SessionMap,
    /// Gateway configuration.
    pub(in crate::server) config: Arc<GatewayConfig>,
    /// Fallback model-provider tokens.
    pub(in crate::server) credentials: CredentialDefaults,
    /// Builds per-session collaborators.
    pub(in crate::server) services: Arc<dyn ServiceFactory>,
}

impl RpcImpl {
    /// Copy a session handle out of the map.
    async fn session(&self, session_id: &SessionId) -> Result<SessionHandle, GatewayError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| GatewayError::SessionNotFound(session_id.clone()))
    }
}

/// Map a gateway error onto its wire error code.
pub(in crate::server) fn rpc_error(err: &GatewayError) -> ErrorObjectOwned {
    let code = match err {
        GatewayError::SessionNotFound(_) => error_codes::SESSION_NOT_FOUND,
        GatewayError::ApprovalNotFound(_) => error_codes::APPROVAL_NOT_FOUND,
        GatewayError::MissingCredential => error_codes::MISSING_CREDENTIAL,
        GatewayError::Policy(_) | GatewayError::Config(_) => error_codes::INVALID_REQUEST,
        GatewayError::Server(_) | GatewayError::Io(_) | GatewayError::Toml(_) => {
            error_codes::INTERNAL_ERROR
        },
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

#[jsonrpsee::core::async_trait]
impl VigilRpcServer for RpcImpl {
    async fn health(&self) -> Result<Ack, ErrorObjectOwned> {
        Ok(Ack::OK)
    }

    async fn start_session(
        &self,
        params: StartSessionParams,
    ) -> Result<SessionStarted, ErrorObjectOwned> {
        self.start_session_impl(params).await
    }

    async fn resolve_approval(
        &self,
        session_id: SessionId,
        approval_id: ApprovalId,
        decision: String,
    ) -> Result<Ack, ErrorObjectOwned> {
        self.resolve_approval_impl(session_id, approval_id, &decision)
            .await
    }

    async fn stop_session(&self, session_id: SessionId) -> Result<Ack, ErrorObjectOwned> {
        self.stop_session_impl(session_id).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ErrorObjectOwned> {
        Ok(self.list_sessions_impl().await)
    }

    async fn subscribe_events(
        &self,
        pending: PendingSubscriptionSink,
        session_id: SessionId,
    ) -> jsonrpsee::core::SubscriptionResult {
        self.subscribe_events_impl(pending, session_id).await
    }
}
