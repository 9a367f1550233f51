//! Session RPC method implementations.

use std::sync::Arc;

use jsonrpsee::types::ErrorObjectOwned;
use tracing::info;
use vigil_core::SessionId;
use vigil_runtime::{AgentTask, SessionRunner};

use super::{RpcImpl, rpc_error};
use crate::rpc::{Ack, SessionInfo, SessionStarted, StartSessionParams};
use crate::server::session::SessionHandle;

impl RpcImpl {
    pub(super) async fn start_session_impl(
        &self,
        params: StartSessionParams,
    ) -> Result<SessionStarted, ErrorObjectOwned> {
        let token = self
            .credentials
            .resolve(params.model_provider_token.as_deref())
            .map_err(|e| rpc_error(&e))?;

        let validator = self.config.validator_config(
            &params.validator_api_key,
            params.validator_base_url.as_deref(),
        );
        let services = self.services.build(&validator).map_err(|e| rpc_error(&e))?;
        let settings = self.config.runner_settings(params.use_demo_policies);

        let session_id = SessionId::new();
        let task = AgentTask {
            session_id: session_id.clone(),
            task: params.task.clone(),
            model: params.llm_model,
            model_provider_token: token,
        };
        let handle = SessionHandle::new(
            session_id.clone(),
            &params.task,
            params.llm_model,
            |events, registry, cancel| {
                SessionRunner::new(task, settings, services, registry, events, cancel)
            },
        );

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), handle);
        }

        info!(
            session_id = %session_id,
            model = %params.llm_model,
            validator = %validator.base_url,
            demo_policies = params.use_demo_policies,
            "Created session via RPC"
        );
        Ok(SessionStarted { session_id })
    }

    pub(super) async fn stop_session_impl(
        &self,
        session_id: SessionId,
    ) -> Result<Ack, ErrorObjectOwned> {
        let handle = self.session(&session_id).await.map_err(|e| rpc_error(&e))?;

        if handle.is_started() {
            // The forwarder tears the session down once the loop exits.
            if !handle.cancel.is_cancelled() {
                handle.cancel.cancel();
                info!(session_id = %session_id, "Session stopped via RPC");
            }
        } else {
            // Nothing is running yet; drop the session outright.
            handle.shutdown().await;
            self.sessions.write().await.remove(&session_id);
            info!(session_id = %session_id, "Unstarted session discarded via RPC");
        }

        Ok(Ack::OK)
    }

    pub(super) async fn list_sessions_impl(&self) -> Vec<SessionInfo> {
        let handles: Vec<SessionHandle> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };
        let mut infos: Vec<SessionInfo> = handles.iter().map(SessionHandle::info).collect();
        infos.sort_by_key(|info| info.created_at);
        infos
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::sync::RwLock;
    use vigil_test::{MockProvisioner, MockValidator};

    use super::*;
    use crate::config::{CredentialDefaults, GatewayConfig};
    use crate::rpc::error_codes;
    use crate::server::test_support::MockServices;

    fn rpc(credentials: CredentialDefaults) -> RpcImpl {
        RpcImpl {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(GatewayConfig::default()),
            credentials,
            services: Arc::new(MockServices::new(
                MockValidator::new(),
                MockProvisioner::new(),
            )),
        }
    }

    #[tokio::test]
    async fn start_registers_session() {
        let rpc = rpc(CredentialDefaults::from_values([Some("env-token".to_string())]));
        let started = rpc
            .start_session_impl(StartSessionParams::new("compare fees", "veto_key"))
            .await
            .unwrap();

        let sessions = rpc.list_sessions_impl().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, started.session_id);
        assert_eq!(sessions[0].task, "compare fees");
        assert!(!sessions[0].observer_attached);
    }

    #[tokio::test]
    async fn start_without_credential_is_rejected() {
        let rpc = rpc(CredentialDefaults::none());
        let err = rpc
            .start_session_impl(StartSessionParams::new("t", "k"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), error_codes::MISSING_CREDENTIAL);
        assert!(rpc.list_sessions_impl().await.is_empty());
    }

    #[tokio::test]
    async fn explicit_token_skips_fallback() {
        let rpc = rpc(CredentialDefaults::none());
        let mut params = StartSessionParams::new("t", "k");
        params.model_provider_token = Some("sk-explicit".to_string());
        assert!(rpc.start_session_impl(params).await.is_ok());
    }

    #[tokio::test]
    async fn stop_unknown_session() {
        let rpc = rpc(CredentialDefaults::none());
        let err = rpc.stop_session_impl(SessionId::new()).await.unwrap_err();
        assert_eq!(err.code(), error_codes::SESSION_NOT_FOUND);
    }

    #[tokio::test]
    async fn stop_unstarted_session_discards_it() {
        let rpc = rpc(CredentialDefaults::from_values([Some("tok".to_string())]));
        let started = rpc
            .start_session_impl(StartSessionParams::new("t", "k"))
            .await
            .unwrap();

        assert_eq!(rpc.stop_session_impl(started.session_id.clone()).await.unwrap(), Ack::OK);
        assert!(rpc.list_sessions_impl().await.is_empty());
    }

    #[tokio::test]
    async fn late_start_after_stop_provisions_nothing() {
        let services = Arc::new(MockServices::new(
            MockValidator::new(),
            MockProvisioner::new().with_created(&["pol_nav"]),
        ));
        let rpc = RpcImpl {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(GatewayConfig::default()),
            credentials: CredentialDefaults::from_values([Some("tok".to_string())]),
            services: Arc::clone(&services) as Arc<dyn crate::services::ServiceFactory>,
        };
        let started = rpc
            .start_session_impl(StartSessionParams::new("t", "k"))
            .await
            .unwrap();
        let handle = rpc.session(&started.session_id).await.unwrap();

        rpc.stop_session_impl(started.session_id).await.unwrap();
        assert!(handle.is_closing());

        // A subscriber that raced the stop may still start the loop.
        handle.start();
        handle.shutdown().await;

        assert_eq!(services.provisioner().ensure_calls(), 0);
        assert!(services.provisioner().deleted().is_empty());
        assert_eq!(services.launcher().launches(), 0);
    }
}
