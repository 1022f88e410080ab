//! Lifecycle event publication.

use crate::types::{PeerDescriptor, StatusReport};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Events emitted by a [`PeerMonitor`](crate::PeerMonitor).
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// The outbound transport session came up.
    Connected,
    /// The outbound transport session went down.
    Disconnected,
    /// A status report was ingested; carries the raw incoming report, not
    /// the merged snapshot.
    StatusUpdated(StatusReport),
    /// The remote's peer list was refreshed; carries the full new snapshot.
    PeersUpdated(Vec<PeerDescriptor>),
    /// The peer reported no height progress for longer than the stuck
    /// threshold. Fires once per stuck episode.
    Stuck,
}

/// Clone-able fan-out bus for [`PeerEvent`]s.
///
/// Each subscriber gets its own unbounded channel, so a slow or dropped
/// subscriber can never block or break the emitting call.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<PeerEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its event stream.
    pub fn subscribe(&self) -> UnboundedReceiverStream<PeerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        UnboundedReceiverStream::new(rx)
    }

    /// Send an event to every live subscriber, pruning dropped ones.
    pub fn emit(&self, event: PeerEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(PeerEvent::Connected);
        bus.emit(PeerEvent::Stuck);

        assert_eq!(first.next().await, Some(PeerEvent::Connected));
        assert_eq!(first.next().await, Some(PeerEvent::Stuck));
        assert_eq!(second.next().await, Some(PeerEvent::Connected));
        assert_eq!(second.next().await, Some(PeerEvent::Stuck));
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_break_emission() {
        let bus = EventBus::new();
        let dropped = bus.subscribe();
        let mut live = bus.subscribe();
        drop(dropped);

        bus.emit(PeerEvent::Connected);
        bus.emit(PeerEvent::Disconnected);

        assert_eq!(live.next().await, Some(PeerEvent::Connected));
        assert_eq!(live.next().await, Some(PeerEvent::Disconnected));
        assert_eq!(bus.subscribers.lock().unwrap().len(), 1);
    }
}
