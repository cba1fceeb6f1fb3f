#![forbid(unsafe_code)]

use tokio::sync::broadcast;

use rtt_core::{PeerId, SessionSummary};

/// Output of a ranging session, delivered to the UI layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Consolidated statistics after a fully processed batch.
    Summary(SessionSummary),
    /// A subscription's transport failed; the subscription restarts on
    /// its own and other targets are unaffected.
    TransportError { peer: PeerId, message: String },
}

/// Simple pub/sub for session output events over a broadcast channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(buffer: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer);
        Self { tx }
    }

    pub fn sender(&self) -> broadcast::Sender<SessionEvent> {
        self.tx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish without caring whether anyone listens; a missing or
    /// lagging subscriber must never block batch processing.
    pub(crate) fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}
