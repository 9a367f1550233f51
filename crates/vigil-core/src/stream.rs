//! Single-observer event stream for one session.

use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::event::{EventSink, SessionEvent};
use crate::types::SessionId;

enum ObserverSlot {
    /// Nobody has attached yet.
    Vacant,
    /// Live observer.
    Attached(mpsc::UnboundedSender<SessionEvent>),
    /// The observer went away; further events are dropped.
    Detached,
}

/// Ordered event channel to at most one observer.
///
/// Events emitted before an observer attaches, or after it is gone, are
/// dropped. Delivery failure never reaches the emitter.
pub struct EventStream {
    session_id: SessionId,
    observer: Mutex<ObserverSlot>,
}

impl EventStream {
    /// Create a stream with no observer.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            observer: Mutex::new(ObserverSlot::Vacant),
        }
    }

    /// The owning session.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Attach the observer and return its receiving end.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ObserverAttached`] if a live observer is already
    /// attached.
    pub fn attach(&self) -> CoreResult<mpsc::UnboundedReceiver<SessionEvent>> {
        let mut slot = self
            .observer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let ObserverSlot::Attached(tx) = &*slot
            && !tx.is_closed()
        {
            return Err(CoreError::ObserverAttached {
                session_id: self.session_id.clone(),
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *slot = ObserverSlot::Attached(tx);
        debug!(session_id = %self.session_id, "Observer attached");
        Ok(rx)
    }

    /// Drop the observer. Subsequent events are discarded.
    pub fn detach(&self) {
        let mut slot = self
            .observer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = ObserverSlot::Detached;
    }

    /// Whether a live observer is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        let slot = self
            .observer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        matches!(&*slot, ObserverSlot::Attached(tx) if !tx.is_closed())
    }
}

impl EventSink for EventStream {
    fn emit(&self, event: SessionEvent) {
        let mut slot = self
            .observer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match &*slot {
            ObserverSlot::Attached(tx) => {
                let kind = event.kind();
                if tx.send(event).is_err() {
                    warn!(
                        session_id = %self.session_id,
                        event = kind,
                        "Observer unreachable, dropping further events"
                    );
                    *slot = ObserverSlot::Detached;
                }
            },
            ObserverSlot::Vacant => {
                debug!(session_id = %self.session_id, event = event.kind(), "No observer yet, event dropped");
            },
            ObserverSlot::Detached => {},
        }
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("session_id", &self.session_id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionState;

    #[test]
    fn events_arrive_in_order() {
        let stream = EventStream::new(SessionId::new());
        let mut rx = stream.attach().unwrap();

        stream.emit(SessionEvent::status(0, 100, SessionState::Initializing));
        stream.emit(SessionEvent::status(0, 100, SessionState::Running));
        stream.emit(SessionEvent::Done { success: true });

        assert_eq!(rx.try_recv().unwrap().kind(), "status");
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::status(0, 100, SessionState::Running)
        );
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Done { success: true });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn second_attach_is_rejected() {
        let stream = EventStream::new(SessionId::new());
        let _rx = stream.attach().unwrap();
        let err = stream.attach().unwrap_err();
        assert!(matches!(err, CoreError::ObserverAttached { .. }));
    }

    #[test]
    fn reattach_after_observer_dropped() {
        let stream = EventStream::new(SessionId::new());
        let rx = stream.attach().unwrap();
        drop(rx);
        assert!(!stream.is_attached());
        assert!(stream.attach().is_ok());
    }

    #[test]
    fn emit_after_observer_gone_does_not_panic() {
        let stream = EventStream::new(SessionId::new());
        let rx = stream.attach().unwrap();
        drop(rx);
        stream.emit(SessionEvent::error("first"));
        stream.emit(SessionEvent::error("second"));
        assert!(!stream.is_attached());
    }

    #[test]
    fn emit_without_observer_is_dropped() {
        let stream = EventStream::new(SessionId::new());
        stream.emit(SessionEvent::Done { success: true });
        let mut rx = stream.attach().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn detach_discards_events() {
        let stream = EventStream::new(SessionId::new());
        let mut rx = stream.attach().unwrap();
        stream.detach();
        stream.emit(SessionEvent::Done { success: true });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn emit_from_another_task() {
        let stream = std::sync::Arc::new(EventStream::new(SessionId::new()));
        let mut rx = stream.attach().unwrap();
        let emitter = std::sync::Arc::clone(&stream);
        tokio::spawn(async move {
            emitter.emit(SessionEvent::Done { success: false });
        })
        .await
        .unwrap();
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Done { success: false });
    }
}
