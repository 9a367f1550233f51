//! Vigil Gateway - Control surface for supervised browser-agent sessions.
//!
//! This crate serves a JSON-RPC API over `WebSocket` that:
//! - Creates sessions and wires their collaborators
//! - Attaches a single observer per session and streams its events
//! - Resolves pending approvals on behalf of a reviewer
//! - Stops sessions and tears them down
//!
//! # Architecture
//!
//! ```text
//! vigil-gateway (control surface)
//! ├── Config loading (TOML) & credential fallbacks
//! ├── Session map
//! ├── Event subscription (one observer per session)
//! ├── Approval resolution
//! └── vigil-runtime (session runner)
//!     └── vigil-approval (validation gateway, approvals, interceptor)
//!         └── vigil-policy (validator service client)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil_gateway::{CredentialDefaults, GatewayConfig, GatewayServer, HttpServiceFactory};
//! use vigil_runtime::{ScriptedLauncher, ScriptedPlan};
//!
//! let config = GatewayConfig::load("vigil.toml")?;
//! let launcher = Arc::new(ScriptedLauncher::new(ScriptedPlan::demo()));
//! let server = GatewayServer::start(
//!     config,
//!     CredentialDefaults::from_env(),
//!     Arc::new(HttpServiceFactory::new(launcher)),
//! )
//! .await?;
//! server.stopped().await;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod config;
pub mod error;
pub mod rpc;
pub mod server;
pub mod services;

pub use config::{
    CREDENTIAL_ENV_VARS, CredentialDefaults, GatewayConfig, ServerSettings, SessionSettings,
    ValidatorSettings,
};
pub use error::{GatewayError, GatewayResult};
pub use rpc::{Ack, SessionInfo, SessionStarted, StartSessionParams, VigilRpcClient};
pub use server::GatewayServer;
pub use services::{HttpServiceFactory, ServiceFactory};
