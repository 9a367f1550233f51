//! Pending approvals for one session.
//!
//! Each denied action registers an entry holding the sending half of a
//! oneshot channel. Exactly one party removes the entry: either a resolver
//! (reviewer decision) or the waiter itself (timeout or cancellation).
//! Whoever removes it decides the outcome, so an approval is never resolved
//! twice and a late resolution of an expired approval is a no-op.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vigil_core::{ApprovalDecision, ApprovalId};

use crate::error::{ApprovalError, ApprovalResult};

type PendingMap = DashMap<ApprovalId, oneshot::Sender<ApprovalDecision>>;

/// How a wait for a reviewer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A reviewer decided.
    Resolved(ApprovalDecision),
    /// Nobody decided in time.
    TimedOut,
    /// The session was cancelled while waiting.
    Cancelled,
}

/// Concurrent map from approval id to suspended action.
///
/// Cloning yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct ApprovalRegistry {
    pending: Arc<PendingMap>,
}

impl ApprovalRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending approval under a fresh id.
    #[must_use]
    pub fn register(&self) -> ApprovalWaiter {
        let id = ApprovalId::new();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);
        debug!(approval_id = %id, "Approval registered");
        ApprovalWaiter {
            id,
            rx,
            pending: Arc::clone(&self.pending),
        }
    }

    /// Deliver a reviewer decision.
    ///
    /// Returns `false` if the id is unknown, already resolved, or expired.
    pub fn resolve(&self, id: &ApprovalId, decision: ApprovalDecision) -> bool {
        self.claim(id).is_some_and(|claimed| claimed.resolve(decision))
    }

    /// Take exclusive ownership of a pending approval without waking the
    /// waiter yet.
    ///
    /// Once claimed, the approval can no longer time out; the waiter blocks
    /// until the claim is resolved or dropped. Returns `None` if the id is
    /// unknown, already resolved, or expired.
    #[must_use]
    pub fn claim(&self, id: &ApprovalId) -> Option<ClaimedApproval> {
        let Some((id, tx)) = self.pending.remove(id) else {
            debug!(approval_id = %id, "No pending approval for id");
            return None;
        };
        Some(ClaimedApproval { id, tx })
    }

    /// Whether `id` is still waiting for a decision.
    #[must_use]
    pub fn is_pending(&self, id: &ApprovalId) -> bool {
        self.pending.contains_key(id)
    }

    /// Number of approvals still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending entry. Waiters observe
    /// [`ApprovalError::Abandoned`].
    pub fn clear(&self) {
        self.pending.clear();
    }
}

/// A pending approval removed from the registry, holding the only way to
/// wake its waiter.
///
/// Dropping it unresolved abandons the waiter.
#[derive(Debug)]
pub struct ClaimedApproval {
    id: ApprovalId,
    tx: oneshot::Sender<ApprovalDecision>,
}

impl ClaimedApproval {
    /// The claimed approval's id.
    #[must_use]
    pub fn id(&self) -> &ApprovalId {
        &self.id
    }

    /// Wake the waiter with `decision`. Returns `false` if the waiter is
    /// already gone.
    pub fn resolve(self, decision: ApprovalDecision) -> bool {
        self.tx.send(decision).is_ok()
    }
}

/// The suspended side of one pending approval.
///
/// Dropping the waiter withdraws the approval.
#[derive(Debug)]
pub struct ApprovalWaiter {
    id: ApprovalId,
    rx: oneshot::Receiver<ApprovalDecision>,
    pending: Arc<PendingMap>,
}

impl ApprovalWaiter {
    /// The id reviewers must quote.
    #[must_use]
    pub fn id(&self) -> &ApprovalId {
        &self.id
    }

    /// Block until a decision arrives, `timeout` elapses, or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Abandoned`] if the entry was removed without
    /// a decision being sent.
    pub async fn wait(
        mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ApprovalResult<WaitOutcome> {
        let expired = tokio::select! {
            biased;
            received = &mut self.rx => return Self::outcome(&self.id, received),
            () = cancel.cancelled() => WaitOutcome::Cancelled,
            () = tokio::time::sleep(timeout) => WaitOutcome::TimedOut,
        };

        if self.pending.remove(&self.id).is_some() {
            debug!(approval_id = %self.id, outcome = ?expired, "Approval withdrawn");
            return Ok(expired);
        }

        // A resolver removed the entry first; its decision is already in flight.
        let received = (&mut self.rx).await;
        Self::outcome(&self.id, received)
    }

    fn outcome(
        id: &ApprovalId,
        received: Result<ApprovalDecision, oneshot::error::RecvError>,
    ) -> ApprovalResult<WaitOutcome> {
        received
            .map(WaitOutcome::Resolved)
            .map_err(|_| ApprovalError::Abandoned {
                approval_id: id.clone(),
            })
    }
}

impl Drop for ApprovalWaiter {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}
