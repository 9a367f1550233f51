//! Gateway `WebSocket` server.
//!
//! Serves the [`VigilRpc`](crate::rpc::VigilRpc) API over `jsonrpsee`.
//!
//! # Locking Design
//!
//! The session map uses an `RwLock` held only for brief insert, remove, and
//! lookup. Handlers copy a [`SessionHandle`](session::SessionHandle) out
//! and release the lock before doing anything else, so a session task
//! waiting on an approval never blocks the request that resolves it.

mod rpc;
mod session;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::server::{Server, ServerHandle};
use tokio::sync::RwLock;
use tracing::info;
use vigil_core::SessionId;

use self::rpc::RpcImpl;
use self::session::SessionHandle;
use crate::config::{CredentialDefaults, GatewayConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::rpc::VigilRpcServer;
use crate::services::ServiceFactory;

type SessionMap = Arc<RwLock<HashMap<SessionId, SessionHandle>>>;

/// The running gateway.
pub struct GatewayServer {
    sessions: SessionMap,
    handle: ServerHandle,
    addr: SocketAddr,
}

impl GatewayServer {
    /// Bind `config.server.bind` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is invalid or cannot be bound.
    pub async fn start(
        config: GatewayConfig,
        credentials: CredentialDefaults,
        services: Arc<dyn ServiceFactory>,
    ) -> GatewayResult<Self> {
        let bind = config.bind_addr()?;
        let sessions: SessionMap = Arc::new(RwLock::new(HashMap::new()));

        let server = Server::builder()
            .build(bind)
            .await
            .map_err(|e| GatewayError::Server(format!("Failed to bind {bind}: {e}")))?;
        let addr = server
            .local_addr()
            .map_err(|e| GatewayError::Server(format!("Failed to get address: {e}")))?;

        let rpc_impl = RpcImpl {
            sessions: Arc::clone(&sessions),
            config: Arc::new(config),
            credentials,
            services,
        };
        let handle = server.start(rpc_impl.into_rpc());
        info!(%addr, "Gateway listening");

        Ok(Self {
            sessions,
            handle,
            addr,
        })
    }

    /// The bound address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `WebSocket` URL clients connect to.
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Resolves when the server stops.
    pub async fn stopped(&self) {
        self.handle.clone().stopped().await;
    }

    /// Stop every session, wait for each to release its resources, then
    /// stop the server.
    pub async fn shutdown(self) {
        let handles: Vec<SessionHandle> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        info!(sessions = handles.len(), "Shutting down gateway");
        for handle in &handles {
            handle.shutdown().await;
        }
        // Already stopped is fine.
        let _ = self.handle.stop();
        self.handle.stopped().await;
    }
}

impl std::fmt::Debug for GatewayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}
