//! Approval resolution RPC method implementation.

use jsonrpsee::types::ErrorObjectOwned;
use tracing::{info, warn};
use vigil_core::{
    ApprovalDecision, ApprovalId, ApprovalResolution, EventSink, SessionEvent, SessionId,
};

use super::{RpcImpl, rpc_error};
use crate::error::GatewayError;
use crate::rpc::Ack;

impl RpcImpl {
    pub(super) async fn resolve_approval_impl(
        &self,
        session_id: SessionId,
        approval_id: ApprovalId,
        decision: &str,
    ) -> Result<Ack, ErrorObjectOwned> {
        // No session lock needed; the registry is safe for concurrent access.
        let handle = self.session(&session_id).await.map_err(|e| rpc_error(&e))?;

        let decision = ApprovalDecision::from_wire(decision);
        let Some(claimed) = handle.registry.claim(&approval_id) else {
            return Err(rpc_error(&GatewayError::ApprovalNotFound(approval_id)));
        };

        // Confirm before waking the waiter so the observer sees the
        // resolution ahead of anything the action causes.
        handle
            .sink
            .emit(SessionEvent::ApprovalResolved(ApprovalResolution {
                id: approval_id.clone(),
                decision,
            }));
        if !claimed.resolve(decision) {
            warn!(approval_id = %approval_id, "Approval waiter already gone");
        }

        info!(
            session_id = %session_id,
            approval_id = %approval_id,
            %decision,
            "Approval resolved via RPC"
        );
        Ok(Ack::OK)
    }
}
