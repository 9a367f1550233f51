//! HTTP client for the policy validator service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use url::Url;
use vigil_core::{PolicyId, ProposedAction, ValidationMode, ValidationVerdict};

use crate::demo::{PolicyDefinition, demo_policies};
use crate::error::{PolicyError, PolicyResult};
use crate::provider::{PolicyProvisioner, PolicyValidator, ProvisionedPolicies};

/// Validator endpoint used when a session does not name one.
pub const DEFAULT_BASE_URL: &str = "https://api.runveto.com";

/// Per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const API_KEY_HEADER: &str = "X-Veto-API-Key";

/// Connection settings for one session's validator.
#[derive(Clone)]
pub struct ValidatorConfig {
    /// Service base URL.
    pub base_url: String,
    /// Service credential.
    pub api_key: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ValidatorConfig {
    /// Settings for `api_key` against the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest<'a> {
    tool_name: &'a str,
    arguments: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct ValidateResponse {
    decision: String,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    metadata: Option<ValidateMetadata>,
}

#[derive(Deserialize)]
struct ValidateMetadata {
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicySummary {
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyListing {
    Bare(Vec<PolicySummary>),
    Wrapped {
        #[serde(default)]
        policies: Vec<PolicySummary>,
    },
}

impl PolicyListing {
    fn into_policies(self) -> Vec<PolicySummary> {
        match self {
            Self::Bare(policies) | Self::Wrapped { policies } => policies,
        }
    }
}

#[derive(Deserialize)]
struct CreatedPolicy {
    #[serde(default)]
    id: String,
}

/// Validator service client. Implements both [`PolicyValidator`] and
/// [`PolicyProvisioner`].
pub struct ValidatorClient {
    client: Client,
    base_url: String,
    api_key: HeaderValue,
}

impl ValidatorClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Config`] if the base URL does not parse or the
    /// key contains characters not allowed in a header, and
    /// [`PolicyError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &ValidatorConfig) -> PolicyResult<Self> {
        let parsed = Url::parse(&config.base_url).map_err(|e| {
            PolicyError::Config(format!("invalid validator URL {}: {e}", config.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PolicyError::Config(format!(
                "unsupported validator URL scheme: {}",
                parsed.scheme()
            )));
        }

        let mut api_key = HeaderValue::try_from(config.api_key.as_str())
            .map_err(|e| PolicyError::Config(format!("Invalid API key characters: {e}")))?;
        api_key.set_sensitive(true);

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// The normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn policies_url(&self) -> String {
        format!("{}/v1/policies", self.base_url)
    }

    async fn existing_policies(&self) -> PolicyResult<HashMap<String, PolicyId>> {
        let response = self
            .client
            .get(self.policies_url())
            .header(API_KEY_HEADER, self.api_key.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PolicyError::Status { status, body });
        }

        let listing: PolicyListing = response
            .json()
            .await
            .map_err(|e| PolicyError::InvalidResponse(e.to_string()))?;

        Ok(listing
            .into_policies()
            .into_iter()
            .filter_map(|p| match (p.tool_name, p.id) {
                (Some(tool), Some(id)) => Some((tool, PolicyId::new(id))),
                _ => None,
            })
            .collect())
    }

    async fn create_policy(&self, policy: &PolicyDefinition) -> PolicyResult<PolicyId> {
        let response = self
            .client
            .post(self.policies_url())
            .header(API_KEY_HEADER, self.api_key.clone())
            .json(policy)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PolicyError::Status { status, body });
        }

        let created: CreatedPolicy = response
            .json()
            .await
            .map_err(|e| PolicyError::InvalidResponse(e.to_string()))?;
        Ok(PolicyId::new(created.id))
    }

    async fn delete_policy(&self, id: &PolicyId) -> PolicyResult<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.policies_url(), id))
            .header(API_KEY_HEADER, self.api_key.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PolicyError::Status { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyValidator for ValidatorClient {
    async fn validate(&self, action: &ProposedAction) -> PolicyResult<ValidationVerdict> {
        debug!(action = %action.name, "Validating action");

        let response = self
            .client
            .post(format!("{}/v1/tools/validate", self.base_url))
            .header(API_KEY_HEADER, self.api_key.clone())
            .json(&ValidateRequest {
                tool_name: &action.name,
                arguments: &action.args,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Validator API error");
            return Err(PolicyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ValidateResponse = response
            .json()
            .await
            .map_err(|e| PolicyError::InvalidResponse(e.to_string()))?;

        let mode = ValidationMode::from_wire(
            parsed
                .metadata
                .as_ref()
                .and_then(|m| m.mode.as_deref()),
        );
        let allowed = match parsed.decision.as_str() {
            "allow" => true,
            "deny" => false,
            other => {
                return Err(PolicyError::InvalidResponse(format!(
                    "unknown decision: {other}"
                )));
            },
        };
        Ok(ValidationVerdict {
            allowed,
            reason: parsed.reason,
            mode,
            latency: Duration::ZERO,
        })
    }
}

#[async_trait]
impl PolicyProvisioner for ValidatorClient {
    async fn ensure_policies(&self) -> ProvisionedPolicies {
        let existing = match self.existing_policies().await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(error = %e, "Failed to fetch existing policies");
                HashMap::new()
            },
        };

        let mut provisioned = ProvisionedPolicies::default();
        for policy in demo_policies() {
            if let Some(id) = existing.get(&policy.tool_name) {
                info!(tool = %policy.tool_name, policy_id = %id, "Policy already exists, reusing");
                provisioned.reused.push(id.clone());
                continue;
            }

            match self.create_policy(&policy).await {
                Ok(id) if id.is_empty() => {
                    warn!(tool = %policy.tool_name, "Service returned no policy id");
                },
                Ok(id) => {
                    info!(tool = %policy.tool_name, policy_id = %id, "Created demo policy");
                    provisioned.created.push(id);
                },
                Err(e) => {
                    warn!(tool = %policy.tool_name, error = %e, "Failed to create policy");
                },
            }
        }
        provisioned
    }

    async fn delete_policies(&self, ids: &[PolicyId]) {
        for id in ids.iter().filter(|id| !id.is_empty()) {
            match self.delete_policy(id).await {
                Ok(()) => info!(policy_id = %id, "Deleted demo policy"),
                Err(e) => warn!(policy_id = %id, error = %e, "Failed to delete policy"),
            }
        }
    }
}

impl std::fmt::Debug for ValidatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
