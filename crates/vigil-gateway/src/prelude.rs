//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_gateway::prelude::*;` to import all essential types.

pub use crate::{GatewayError, GatewayResult};

pub use crate::{CredentialDefaults, GatewayConfig};

pub use crate::{GatewayServer, HttpServiceFactory, ServiceFactory};

pub use crate::{SessionInfo, StartSessionParams, VigilRpcClient};
