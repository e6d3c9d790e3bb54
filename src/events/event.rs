//! # Lifecycle events emitted by the queue unloader.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Consumption events**: per-payload flow (starting, ok, failed, skipped, lost)
//! - **Retry events**: backoff scheduling under sustained failure
//! - **Lifecycle events**: engine start/stop and queue close
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! queue name, attempt counts, delays, and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use persistq::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ConsumeFailed)
//!     .with_queue("orders")
//!     .with_reason("connection refused")
//!     .with_attempt(3);
//!
//! assert_eq!(ev.kind, EventKind::ConsumeFailed);
//! assert_eq!(ev.queue.as_deref(), Some("orders"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of unloader events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Consumption events ===
    /// A payload was handed to the worker pool.
    ///
    /// Sets: `queue`, `at`, `seq`.
    ConsumeStarting,

    /// A payload was consumed successfully.
    ///
    /// Sets: `queue`, `at`, `seq`.
    ConsumeOk,

    /// A consumption attempt failed; the payload has been re-pushed onto the
    /// tail of the queue under a fresh key.
    ///
    /// Sets: `queue`, `attempt` (consecutive failure count), `reason`, `at`, `seq`.
    ConsumeFailed,

    /// The head record could not be dispatched (empty queue wake-up or an
    /// undecodable record, which is dropped). The loop continues.
    ///
    /// Sets: `queue`, `reason`, `at`, `seq`.
    PayloadSkipped,

    /// A failed payload could not be re-pushed; it is gone.
    ///
    /// Sets: `queue`, `reason`, `at`, `seq`.
    PayloadLost,

    // === Retry events ===
    /// The dispatch loop is sleeping before the next dispatch because the
    /// consecutive failure counter is non-zero.
    ///
    /// Sets: `queue`, `attempt`, `delay_ms`, `at`, `seq`.
    BackoffScheduled,

    // === Lifecycle events ===
    /// The unloader started its dispatch loop.
    ///
    /// Sets: `queue`, `pending` (queue size at start), `at`, `seq`.
    UnloadStarted,

    /// `stop()` was called; the dispatch loop is being signalled.
    ///
    /// Sets: `queue`, `at`, `seq`.
    StopRequested,

    /// The dispatch loop and all in-flight consumptions exited within the
    /// grace period.
    ///
    /// Sets: `queue`, `at`, `seq`.
    DrainedWithinGrace,

    /// The grace period ran out; stragglers were force-cancelled.
    ///
    /// Sets: `queue`, `at`, `seq`.
    GraceExceeded,

    /// The queue behind the unloader has been flushed and closed.
    ///
    /// Sets: `queue`, `pending` (size at close), `at`, `seq`.
    QueueClosed,
}

/// Unloader event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the queue (or subscriber, for subscriber events).
    pub queue: Option<Arc<str>>,
    /// Consecutive failure count when the event was emitted.
    pub attempt: Option<u32>,
    /// Backoff delay before the next dispatch, in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Persisted queue size, where the event kind reports one.
    pub pending: Option<u64>,
    /// Human-readable reason (errors, skip details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            queue: None,
            attempt: None,
            delay_ms: None,
            pending: None,
            reason: None,
        }
    }

    /// Attaches a queue (or subscriber) name.
    #[inline]
    pub fn with_queue(mut self, queue: impl Into<Arc<str>>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Attaches a consecutive-failure count.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a persisted queue size.
    #[inline]
    pub fn with_pending(mut self, pending: u64) -> Self {
        self.pending = Some(pending);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
