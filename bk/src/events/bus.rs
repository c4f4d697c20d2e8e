//! Event Bus - fan-out of lane events to any number of subscribers
//!
//! The coordinator emits while holding the lane lock; consumers (console
//! narrator, JSONL logger, tests) each get their own receiver.

use tokio::sync::broadcast;
use tracing::debug;

use super::types::LaneEvent;

/// Default channel capacity (events)
/// Three events per traveler, so this covers a few thousand travelers per run
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Broadcast bus for lane events
pub struct EventBus {
    tx: broadcast::Sender<LaneEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: with no subscribers the event is dropped.
    pub fn emit(&self, event: LaneEvent) {
        debug!(
            seq = event.seq,
            kind = event.kind.as_str(),
            direction = %event.direction,
            traveler_id = event.traveler_id,
            "EventBus::emit"
        );
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LaneEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Take every event already queued on `rx` without waiting
pub fn drain_pending(rx: &mut broadcast::Receiver<LaneEvent>) -> Vec<LaneEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(n)) => {
                tracing::warn!(missed = n, "drain_pending: receiver lagged, events lost");
            }
            Err(_) => break,
        }
    }
    events
}
