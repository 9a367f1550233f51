//! Test wiring for the gateway.

use std::sync::{Arc, Mutex};

use vigil_policy::ValidatorConfig;
use vigil_runtime::{AgentLauncher, ScriptedLauncher, ScriptedPlan, SessionServices};
use vigil_test::{MockProvisioner, MockValidator};

use crate::error::GatewayResult;
use crate::services::ServiceFactory;

/// Hands every session the same mocks and records the validator settings
/// it was asked for.
pub(crate) struct MockServices {
    validator: MockValidator,
    provisioner: MockProvisioner,
    launcher: ScriptedLauncher,
    /// Replaces the scripted engine when set.
    engine: Option<Arc<dyn AgentLauncher>>,
    requested: Mutex<Vec<ValidatorConfig>>,
}

impl MockServices {
    pub(crate) fn new(validator: MockValidator, provisioner: MockProvisioner) -> Self {
        Self::with_plan(validator, provisioner, ScriptedPlan::demo())
    }

    pub(crate) fn with_plan(
        validator: MockValidator,
        provisioner: MockProvisioner,
        plan: ScriptedPlan,
    ) -> Self {
        Self {
            validator,
            provisioner,
            launcher: ScriptedLauncher::new(plan),
            engine: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_engine(
        validator: MockValidator,
        provisioner: MockProvisioner,
        engine: Arc<dyn AgentLauncher>,
    ) -> Self {
        Self {
            engine: Some(engine),
            ..Self::new(validator, provisioner)
        }
    }

    pub(crate) fn launcher(&self) -> &ScriptedLauncher {
        &self.launcher
    }

    pub(crate) fn provisioner(&self) -> &MockProvisioner {
        &self.provisioner
    }

    pub(crate) fn requested(&self) -> Vec<ValidatorConfig> {
        self.requested.lock().unwrap().clone()
    }
}

impl ServiceFactory for MockServices {
    fn build(&self, validator: &ValidatorConfig) -> GatewayResult<SessionServices> {
        self.requested.lock().unwrap().push(validator.clone());
        Ok(SessionServices {
            launcher: self
                .engine
                .clone()
                .unwrap_or_else(|| Arc::new(self.launcher.clone()) as Arc<dyn AgentLauncher>),
            validator: Arc::new(self.validator.clone()),
            provisioner: Arc::new(self.provisioner.clone()),
        })
    }
}
