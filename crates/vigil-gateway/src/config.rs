//! Gateway configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vigil_approval::APPROVAL_TIMEOUT;
use vigil_policy::{DEFAULT_BASE_URL, ValidatorConfig};
use vigil_runtime::{MAX_STEPS, RunnerSettings};
use vigil_telemetry::LogConfig;

use crate::error::{GatewayError, GatewayResult};

/// Main gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Validator service defaults.
    #[serde(default)]
    pub validator: ValidatorSettings,

    /// Per-session limits.
    #[serde(default)]
    pub session: SessionSettings,

    /// Logging.
    #[serde(default)]
    pub logging: LogConfig,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address the JSON-RPC server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Validator service defaults, used when a session does not name its own
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSettings {
    /// Base URL of the validator service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Per-session limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Step budget for the agent loop.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// How long a denied action waits for a reviewer, in seconds.
    #[serde(default = "default_approval_timeout")]
    pub approval_timeout_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            approval_timeout_secs: default_approval_timeout(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8765".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_steps() -> u32 {
    MAX_STEPS
}

fn default_approval_timeout() -> u64 {
    APPROVAL_TIMEOUT.as_secs()
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// The parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if `server.bind` is not a socket address.
    pub fn bind_addr(&self) -> GatewayResult<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| GatewayError::Config(format!("invalid bind address {}: {e}", self.server.bind)))
    }

    /// Runner settings for a new session.
    #[must_use]
    pub fn runner_settings(&self, provision_policies: bool) -> RunnerSettings {
        RunnerSettings {
            max_steps: self.session.max_steps,
            approval_timeout: Duration::from_secs(self.session.approval_timeout_secs),
            provision_policies,
        }
    }

    /// Validator client settings for a new session.
    ///
    /// `base_url` overrides the configured endpoint when present and
    /// non-empty.
    #[must_use]
    pub fn validator_config(&self, api_key: &str, base_url: Option<&str>) -> ValidatorConfig {
        let base_url = base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(&self.validator.base_url);
        ValidatorConfig::new(api_key)
            .with_base_url(base_url)
            .with_timeout(Duration::from_secs(self.validator.request_timeout_secs))
    }
}

/// Environment variables consulted for the model-provider token, in order.
pub const CREDENTIAL_ENV_VARS: &[&str] =
    &["MODEL_PROVIDER_TOKEN", "ANTHROPIC_API_KEY", "VERTEX_API_KEY"];

/// Fallback model-provider tokens, captured once at startup.
#[derive(Clone, Default)]
pub struct CredentialDefaults {
    candidates: Vec<String>,
}

impl CredentialDefaults {
    /// Read [`CREDENTIAL_ENV_VARS`] from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_values(CREDENTIAL_ENV_VARS.iter().map(|var| std::env::var(var).ok()))
    }

    /// Build from candidate values in priority order. Unset and empty
    /// values are skipped.
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            candidates: values
                .into_iter()
                .flatten()
                .filter(|v| !v.trim().is_empty())
                .collect(),
        }
    }

    /// No fallbacks.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The token to use: `explicit` if non-empty, else the first fallback.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingCredential`] if there is no candidate.
    pub fn resolve(&self, explicit: Option<&str>) -> GatewayResult<String> {
        explicit
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.candidates.first().map(String::as_str))
            .map(str::to_string)
            .ok_or(GatewayError::MissingCredential)
    }
}

impl std::fmt::Debug for CredentialDefaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialDefaults")
            .field("candidates", &self.candidates.len())
            .finish()
    }
}
