//! Per-session collaborator wiring.

use std::sync::Arc;

use vigil_policy::{ValidatorClient, ValidatorConfig};
use vigil_runtime::{AgentLauncher, SessionServices};

use crate::error::GatewayResult;

/// Builds the collaborators for a new session.
///
/// Validator credentials differ per session, so the policy client is
/// created on every call.
pub trait ServiceFactory: Send + Sync {
    /// Collaborators for a session talking to `validator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the validator settings are unusable.
    fn build(&self, validator: &ValidatorConfig) -> GatewayResult<SessionServices>;
}

/// Production wiring: the HTTP validator client for validation and
/// provisioning, and a shared agent launcher.
#[derive(Clone)]
pub struct HttpServiceFactory {
    launcher: Arc<dyn AgentLauncher>,
}

impl HttpServiceFactory {
    /// Create a factory that launches agents with `launcher`.
    #[must_use]
    pub fn new(launcher: Arc<dyn AgentLauncher>) -> Self {
        Self { launcher }
    }
}

impl ServiceFactory for HttpServiceFactory {
    fn build(&self, validator: &ValidatorConfig) -> GatewayResult<SessionServices> {
        let client = Arc::new(ValidatorClient::new(validator)?);
        Ok(SessionServices {
            launcher: Arc::clone(&self.launcher),
            validator: Arc::clone(&client) as _,
            provisioner: client,
        })
    }
}

impl std::fmt::Debug for HttpServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServiceFactory").finish_non_exhaustive()
    }
}
