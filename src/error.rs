//! Error types used by the persistq queue and unloading engine.
//!
//! This module defines four error enums:
//!
//! - [`StoreError`] — failures of the embedded ordered store backing a queue.
//! - [`QueueError`] — errors raised by queue operations (push/poll/remove/...).
//! - [`ConfigError`] — invalid construction parameters, raised at build time.
//! - [`EngineError`] — errors raised by the unloading engine itself.
//!
//! The queue and engine enums provide `as_label` helpers for logging/metrics,
//! and [`QueueError::is_skippable`] tells the dispatch loop which failures are
//! absorbed without touching the retry counter.

use std::time::Duration;
use thiserror::Error;

/// # Failures of the embedded ordered store.
///
/// Wraps the underlying redb error taxonomy plus the one condition the store
/// adapter can detect itself (key space exhaustion).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing database could not be opened or created.
    #[error("cannot open queue store: {0}")]
    Open(#[from] redb::DatabaseError),

    /// A storage transaction could not be started.
    #[error("storage transaction failed: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// The queue table could not be opened inside a transaction.
    #[error("queue table unavailable: {0}")]
    Table(#[from] redb::TableError),

    /// A read or write inside a transaction failed.
    #[error("storage operation failed: {0}")]
    Storage(#[from] redb::StorageError),

    /// A transaction commit failed.
    #[error("storage commit failed: {0}")]
    Commit(#[from] redb::CommitError),

    /// Filesystem-level failure (directory creation and the like).
    #[error("queue store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every key up to `u64::MAX` has been assigned over the queue's lifetime.
    #[error("queue key space exhausted")]
    KeySpaceExhausted,
}

/// # Errors produced by queue operations.
///
/// `Empty` is a branching signal for `remove`/`element` callers, not a fault.
/// `Serialization` on the poll side means the record has already been removed
/// from the store by the time decoding was attempted (the message is dropped).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum QueueError {
    /// A push could not be persisted. Non-retryable at this layer; the caller
    /// decides what to do with the payload.
    #[error("unable to enqueue payload: {source}")]
    Enqueue {
        /// The underlying store failure.
        #[source]
        source: StoreError,
    },

    /// The payload codec failed on either side (encode on push, decode on
    /// poll/peek). On the poll side the record is already gone.
    #[error("cannot decode payload: {reason}")]
    Serialization {
        /// The codec's own failure message.
        reason: String,
    },

    /// `remove()`/`element()` called on an empty queue.
    #[error("queue is empty")]
    Empty,

    /// Any other store failure during poll/peek/size/flush.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use persistq::QueueError;
    ///
    /// assert_eq!(QueueError::Empty.as_label(), "queue_empty");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Enqueue { .. } => "queue_enqueue",
            QueueError::Serialization { .. } => "queue_serialization",
            QueueError::Empty => "queue_empty",
            QueueError::Store(_) => "queue_store",
        }
    }

    /// True for failures the dispatch loop absorbs without counting them as
    /// consumer failures: an empty queue and an undecodable (already removed)
    /// record.
    pub fn is_skippable(&self) -> bool {
        matches!(self, QueueError::Empty | QueueError::Serialization { .. })
    }
}

/// # Invalid construction parameters.
///
/// Raised when building an [`UnloaderConfig`](crate::UnloaderConfig) or a
/// [`WaitStrategy`](crate::WaitStrategy); never at runtime.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No consumer was supplied to the unloader config builder.
    #[error("consumer may not be absent")]
    MissingConsumer,

    /// The worker pool size was configured as zero.
    #[error("worker pool size must be >= 1")]
    ZeroWorkers,

    /// Exponential wait requires the multiplier to stay below the cap.
    #[error("exponential multiplier {multiplier:?} must be below cap {max:?}")]
    MultiplierAboveCap {
        /// The configured per-attempt multiplier.
        multiplier: Duration,
        /// The configured delay cap.
        max: Duration,
    },
}

/// # Errors produced by the unloading engine.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// `stop()` exceeded its grace period; in-flight consumptions were
    /// force-cancelled. The queue has still been closed.
    #[error("stop grace period {grace:?} exceeded; {in_flight} consumption(s) force-cancelled")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of consume tasks still running when the grace window closed.
        in_flight: usize,
    },
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::GraceExceeded { .. } => "engine_grace_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skippable_covers_empty_and_serialization() {
        assert!(QueueError::Empty.is_skippable());
        assert!(QueueError::Serialization {
            reason: "truncated".into()
        }
        .is_skippable());
        assert!(!QueueError::Store(StoreError::KeySpaceExhausted).is_skippable());
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(
            QueueError::Serialization { reason: "x".into() }.as_label(),
            "queue_serialization"
        );
        assert_eq!(
            EngineError::GraceExceeded {
                grace: Duration::from_secs(10),
                in_flight: 1
            }
            .as_label(),
            "engine_grace_exceeded"
        );
    }
}
