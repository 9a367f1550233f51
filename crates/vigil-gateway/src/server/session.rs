//! Per-session state held by the gateway.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use jsonrpsee::{SubscriptionMessage, SubscriptionSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};
use vigil_approval::ApprovalRegistry;
use vigil_core::{
    EventSink, EventStream, ModelSelection, SessionEvent, SessionId, SessionState,
};
use vigil_runtime::{SessionRunner, panic_message};
use vigil_telemetry::session_span;

use super::SessionMap;
use crate::rpc::SessionInfo;

/// Event sink that records the latest lifecycle state before handing the
/// event to the observer stream.
pub(super) struct SessionSink {
    stream: EventStream,
    state: Mutex<SessionState>,
}

impl SessionSink {
    fn new(session_id: SessionId) -> Self {
        Self {
            stream: EventStream::new(session_id),
            state: Mutex::new(SessionState::Initializing),
        }
    }

    pub(super) fn stream(&self) -> &EventStream {
        &self.stream
    }

    pub(super) fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for SessionSink {
    fn emit(&self, event: SessionEvent) {
        let next = match &event {
            SessionEvent::Status(status) => Some(status.state),
            SessionEvent::Done { .. } => Some(SessionState::Done),
            SessionEvent::Error { .. } => Some(SessionState::Error),
            _ => None,
        };
        if let Some(next) = next {
            *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
        }
        self.stream.emit(event);
    }
}

/// Handle to one session.
///
/// All fields are `Arc`-wrapped or cheaply cloneable so handlers copy the
/// handle out of the map and release the lock immediately.
#[derive(Clone)]
pub(super) struct SessionHandle {
    pub(super) id: SessionId,
    pub(super) task: Arc<str>,
    pub(super) model: ModelSelection,
    pub(super) created_at: DateTime<Utc>,
    pub(super) sink: Arc<SessionSink>,
    pub(super) registry: ApprovalRegistry,
    pub(super) cancel: CancellationToken,
    /// The runner until an observer starts it.
    runner: Arc<Mutex<Option<SessionRunner>>>,
    /// The agent loop once started.
    join: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionHandle {
    /// Build a handle. `build_runner` receives the sink, registry, and
    /// cancellation token the runner must share with the gateway.
    pub(super) fn new<F>(
        id: SessionId,
        task: &str,
        model: ModelSelection,
        build_runner: F,
    ) -> Self
    where
        F: FnOnce(Arc<dyn EventSink>, ApprovalRegistry, CancellationToken) -> SessionRunner,
    {
        let sink = Arc::new(SessionSink::new(id.clone()));
        let registry = ApprovalRegistry::new();
        let cancel = CancellationToken::new();
        let runner = build_runner(
            Arc::clone(&sink) as Arc<dyn EventSink>,
            registry.clone(),
            cancel.clone(),
        );
        Self {
            id,
            task: Arc::from(task),
            model,
            created_at: Utc::now(),
            sink,
            registry,
            cancel,
            runner: Arc::new(Mutex::new(Some(runner))),
            join: Arc::new(Mutex::new(None)),
        }
    }

    pub(super) fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            task: self.task.to_string(),
            state: self.sink.state(),
            model: self.model,
            created_at: self.created_at,
            pending_approvals: self.registry.pending_count(),
            observer_attached: self.sink.stream().is_attached(),
        }
    }

    /// Whether the agent loop has been started.
    pub(super) fn is_started(&self) -> bool {
        self.runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Whether the session is winding down and cannot take a new observer.
    pub(super) fn is_closing(&self) -> bool {
        self.cancel.is_cancelled() || self.sink.state().is_terminal()
    }

    /// Start the agent loop if it has not started yet.
    ///
    /// The stream is detached when the loop returns, or panics, so the
    /// forwarder drains the remaining events and exits.
    pub(super) fn start(&self) {
        let Some(runner) = self
            .runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };

        let sink = Arc::clone(&self.sink);
        let join = tokio::spawn(
            async move {
                match AssertUnwindSafe(runner.run()).catch_unwind().await {
                    Ok(report) => info!(
                        outcome = ?report.outcome,
                        steps = report.steps,
                        policies = report.policies.len(),
                        "Agent loop finished"
                    ),
                    Err(payload) => {
                        let message =
                            format!("session panicked: {}", panic_message(payload.as_ref()));
                        error!(error = %message, "Agent loop panicked");
                        sink.emit(SessionEvent::error(message));
                    },
                }
                sink.stream().detach();
            }
            .instrument(session_span(&self.id)),
        );
        *self.join.lock().unwrap_or_else(PoisonError::into_inner) = Some(join);
    }

    /// Cancel the agent loop and wait for it to release its resources.
    pub(super) async fn shutdown(&self) {
        self.cancel.cancel();
        let join = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(join) = join
            && let Err(e) = join.await
        {
            warn!(session_id = %self.id, error = %e, "Agent loop panicked");
        }
        self.registry.clear();
        self.sink.stream().detach();
    }
}

/// Forward events to the subscriber until the stream closes or the
/// subscriber goes away, then tear the session down.
///
/// Losing the subscriber cancels the session.
pub(super) async fn forward_events(
    handle: SessionHandle,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    sink: SubscriptionSink,
    sessions: SessionMap,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    debug!(session_id = %handle.id, "Event stream closed");
                    break;
                };
                match SubscriptionMessage::from_json(&event) {
                    Ok(msg) => {
                        if sink.send(msg).await.is_err() {
                            info!(session_id = %handle.id, "Observer disconnected, stopping session");
                            break;
                        }
                    },
                    Err(e) => {
                        warn!(session_id = %handle.id, error = %e, "Failed to serialize event");
                    },
                }
            },
            () = sink.closed() => {
                info!(session_id = %handle.id, "Observer disconnected, stopping session");
                break;
            },
        }
    }

    handle.shutdown().await;
    sessions.write().await.remove(&handle.id);
    info!(session_id = %handle.id, "Session removed");
}
