//! # Core subscriber trait
//!
//! `Subscribe` is how external code reacts to lifecycle events: metrics
//! counters, audit logs, alerting hooks. The [`SubscriberSet`](crate::SubscriberSet)
//! gives every subscriber its own bounded channel and worker task, so a slow
//! `on_event` costs only that subscriber — the publisher and the other
//! subscribers keep going. When a subscriber's channel fills up, further
//! events for it are dropped with a warning; [`Subscribe::queue_capacity`]
//! sizes the channel.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative waits).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use persistq::{Event, Subscribe};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Subscribe for Audit {
///     async fn on_event(&self, event: &Event) {
///         // write audit record...
///         let _ = event;
///     }
///
///     fn name(&self) -> &'static str {
///         "audit"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
