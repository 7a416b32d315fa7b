//! Event Bus - pub/sub fan-out for throttle events
//!
//! The EventBus uses tokio broadcast channels to deliver events to all
//! subscribers. The scheduler emits, consumers (callers, loggers) subscribe.

use tokio::sync::broadcast;
use tracing::debug;

use super::types::ThrottleEvent;
use crate::scheduler::TaskTicket;

/// Default channel capacity (events)
///
/// Reconciliation can dispatch a large burst synchronously before any
/// subscriber gets polled, so the buffer has to absorb the whole burst.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Broadcast bus for throttle activity
///
/// Cheap to clone: clones share the same underlying channel. Emitting is
/// fire-and-forget; with no subscribers events are dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ThrottleEvent>,
    #[allow(dead_code)]
    channel_capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            channel_capacity: capacity,
        }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// If the channel is full, oldest events are dropped.
    pub fn emit(&self, event: ThrottleEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ThrottleEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    // === Convenience methods ===

    /// Emit a Sent event for a dispatched task
    pub fn sent(&self, ticket: TaskTicket, group: Option<String>) {
        self.emit(ThrottleEvent::Sent { ticket, group });
    }

    /// Emit a Received event for a completed task
    pub fn received(&self, ticket: TaskTicket, group: Option<String>) {
        self.emit(ThrottleEvent::Received { ticket, group });
    }

    /// Emit a Drained event
    pub fn drained(&self) {
        self.emit(ThrottleEvent::Drained);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
