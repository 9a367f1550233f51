//! Collaborator traits for the external policy service.

use async_trait::async_trait;
use vigil_core::{PolicyId, ProposedAction, ValidationVerdict};

use crate::error::PolicyResult;

/// Produces one verdict per proposed action.
///
/// Implementations make exactly one outbound call and never retry. The
/// returned verdict's latency is left at zero; callers measure it.
#[async_trait]
pub trait PolicyValidator: Send + Sync {
    /// Validate a single action.
    async fn validate(&self, action: &ProposedAction) -> PolicyResult<ValidationVerdict>;
}

/// Creates and releases the demo policy set.
///
/// Both operations are best effort: individual failures are logged and
/// skipped rather than returned.
#[async_trait]
pub trait PolicyProvisioner: Send + Sync {
    /// Make sure every demo policy exists on the service.
    async fn ensure_policies(&self) -> ProvisionedPolicies;

    /// Delete the given policies.
    async fn delete_policies(&self, ids: &[PolicyId]);
}

/// Outcome of provisioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionedPolicies {
    /// Policies created for this session. Owned, released on teardown.
    pub created: Vec<PolicyId>,
    /// Policies that already existed and were reused. Never deleted.
    pub reused: Vec<PolicyId>,
}

impl ProvisionedPolicies {
    /// Ids this session owns and must release.
    #[must_use]
    pub fn owned(&self) -> &[PolicyId] {
        &self.created
    }

    /// Total number of active demo policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.created.len().saturating_add(self.reused.len())
    }

    /// Whether nothing was provisioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.reused.is_empty()
    }
}
