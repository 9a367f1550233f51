//! Single-shot validation calls with uniform failure handling.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};
use vigil_core::{ProposedAction, ValidationMode, ValidationVerdict};
use vigil_policy::PolicyValidator;

/// Prefix of the reason attached to verdicts synthesized from a failed call.
pub const GATEWAY_ERROR_PREFIX: &str = "validation gateway error";

/// Wraps a [`PolicyValidator`], measuring latency and turning failures into
/// deny verdicts.
#[derive(Clone)]
pub struct ValidationGateway {
    validator: Arc<dyn PolicyValidator>,
}

impl ValidationGateway {
    /// Create a gateway over `validator`.
    #[must_use]
    pub fn new(validator: Arc<dyn PolicyValidator>) -> Self {
        Self { validator }
    }

    /// Validate one action. Never fails.
    ///
    /// Actions outside the validated set are allowed without a call. A
    /// failed call becomes a deny whose reason starts with
    /// [`GATEWAY_ERROR_PREFIX`]. No retries.
    pub async fn validate(&self, action: &ProposedAction) -> ValidationVerdict {
        if !action.is_validated() {
            debug!(action = %action.name, "Action outside validated set, allowing");
            return ValidationVerdict::allow(ValidationMode::Deterministic);
        }

        let start = Instant::now();
        let result = self.validator.validate(action).await;
        let latency = start.elapsed();

        match result {
            Ok(verdict) => verdict.with_latency(latency),
            Err(e) => {
                warn!(action = %action.name, error = %e, "Validation call failed, denying");
                ValidationVerdict::deny(
                    format!("{GATEWAY_ERROR_PREFIX}: {e}"),
                    ValidationMode::Deterministic,
                )
                .with_latency(latency)
            },
        }
    }
}

impl std::fmt::Debug for ValidationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationGateway").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_test::MockValidator;

    #[tokio::test]
    async fn passes_verdict_through() {
        let validator = Arc::new(MockValidator::new().deny("navigate", "blocked domain"));
        let gateway = ValidationGateway::new(validator.clone());

        let action = ProposedAction::new("navigate").with_arg("url", "https://chase.com");
        let verdict = gateway.validate(&action).await;
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("blocked domain"));
        assert_eq!(validator.calls(), vec!["navigate".to_string()]);
    }

    #[tokio::test]
    async fn failure_becomes_deny() {
        let validator = Arc::new(MockValidator::new().fail("search", "connection refused"));
        let gateway = ValidationGateway::new(validator);

        let verdict = gateway
            .validate(&ProposedAction::new("search").with_arg("query", "shoes"))
            .await;
        assert!(!verdict.allowed);
        let reason = verdict.reason.unwrap();
        assert!(reason.starts_with(GATEWAY_ERROR_PREFIX), "{reason}");
        assert!(reason.contains("connection refused"), "{reason}");
    }

    #[tokio::test]
    async fn unvalidated_actions_never_reach_validator() {
        let validator = Arc::new(MockValidator::new());
        let gateway = ValidationGateway::new(validator.clone());

        let verdict = gateway.validate(&ProposedAction::new("done")).await;
        assert!(verdict.allowed);
        assert!(validator.calls().is_empty());
    }
}
