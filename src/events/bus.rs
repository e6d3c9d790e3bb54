//! # Event bus for broadcasting unloader events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (the dispatch loop,
//! consume tasks, the unloader itself).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Subscriber (one):
//!   dispatch loop ──┐
//!   consume task  ──┼──────► Bus ───────► unloader listener ────► SubscriberSet
//!   unloader      ──┘  (broadcast chan)
//! ```
//!
//! The unloader runs a single listener that fans events out to user-defined
//! subscribers via [`SubscriberSet`](crate::SubscriberSet). External code can
//! also call [`Bus::subscribe`] directly and observe the raw event stream,
//! which is how the integration tests assert lifecycle ordering.
//!
//! Publishing never suspends the dispatch loop: `publish()` is a plain
//! `broadcast::Sender::send` into a ring buffer of `capacity` events shared
//! by all receivers. A receiver that falls more than `capacity` events
//! behind gets `RecvError::Lagged(n)` and resumes at the oldest retained
//! event. With no receiver attached, published events evaporate — the bus
//! stores nothing durably.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for unloader events.
///
/// Any number of publishers may call [`Bus::publish`] concurrently; every
/// receiver gets its own clone of each event. Delivery is fire-and-forget.
/// `Bus` itself is cheap to clone — it is a handle around the sender, and
/// the dispatch loop and every consume task carry one.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// Capacity is shared across all receivers; the minimum is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers, the event is dropped and this function
    /// still returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribes.
    /// - Slow receivers get `RecvError::Lagged(n)` and skip over missed items.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ConsumeOk).with_queue("q"));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ConsumeOk);
        assert_eq!(ev.queue.as_deref(), Some("q"));
    }

    #[tokio::test]
    async fn publish_without_receivers_does_not_block() {
        let bus = Bus::new(1);
        bus.publish(Event::new(EventKind::StopRequested));
    }
}
