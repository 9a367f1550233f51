//! Event subscription RPC method implementation.

use std::sync::Arc;

use jsonrpsee::{PendingSubscriptionSink, SubscriptionMessage};
use jsonrpsee::types::ErrorObjectOwned;
use tracing::{info, warn};
use vigil_core::{SessionEvent, SessionId, SessionState};

use super::{RpcImpl, rpc_error};
use crate::rpc::error_codes;
use crate::server::session::forward_events;

impl RpcImpl {
    pub(super) async fn subscribe_events_impl(
        &self,
        pending: PendingSubscriptionSink,
        session_id: SessionId,
    ) -> jsonrpsee::core::SubscriptionResult {
        let handle = match self.session(&session_id).await {
            Ok(handle) if !handle.is_closing() => handle,
            Ok(_) => {
                pending
                    .reject(ErrorObjectOwned::owned(
                        error_codes::SESSION_NOT_FOUND,
                        format!("session is shutting down: {session_id}"),
                        None::<()>,
                    ))
                    .await;
                return Ok(());
            },
            Err(e) => {
                pending.reject(rpc_error(&e)).await;
                return Ok(());
            },
        };

        let events = match handle.sink.stream().attach() {
            Ok(events) => events,
            Err(e) => {
                warn!(session_id = %session_id, "Rejected second observer");
                pending
                    .reject(ErrorObjectOwned::owned(
                        error_codes::OBSERVER_ATTACHED,
                        e.to_string(),
                        None::<()>,
                    ))
                    .await;
                return Ok(());
            },
        };

        // If accepting fails the receiver drops with it and the slot is
        // free for the next attempt.
        let sink = pending.accept().await?;
        info!(session_id = %session_id, "Observer attached");

        // Stopped while the subscription was being accepted.
        if handle.is_closing() {
            info!(session_id = %session_id, "Session closed before start");
            let stopped = SessionEvent::status(0, 0, SessionState::Stopped);
            if let Ok(msg) = SubscriptionMessage::from_json(&stopped) {
                let _ = sink.send(msg).await;
            }
            drop(events);
            handle.sink.stream().detach();
            return Ok(());
        }

        // The agent loop starts only now so the observer sees every event.
        handle.start();
        tokio::spawn(forward_events(
            handle,
            events,
            sink,
            Arc::clone(&self.sessions),
        ));

        Ok(())
    }
}
