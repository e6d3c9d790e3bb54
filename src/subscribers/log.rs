//! # LogWriter — event-to-tracing bridge
//!
//! A minimal subscriber that forwards incoming [`Event`]s to `tracing`.
//! Failures and drops go out at `warn`, the per-payload flow at `debug`,
//! lifecycle transitions at `info`.
//!
//! ## Example output
//! ```text
//! INFO  unload started queue="orders" pending=100
//! DEBUG consume starting queue="orders"
//! WARN  consume failed queue="orders" reason="connection refused" failures=1
//! DEBUG backoff scheduled queue="orders" delay_ms=5 failures=1
//! INFO  queue closed queue="orders" pending=0
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Built-in subscriber that writes events through `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Constructs a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let queue = e.queue.as_deref().unwrap_or("?");
        match e.kind {
            EventKind::UnloadStarted => {
                info!(queue, pending = e.pending, "unload started");
            }
            EventKind::ConsumeStarting => {
                debug!(queue, "consume starting");
            }
            EventKind::ConsumeOk => {
                debug!(queue, "consume ok");
            }
            EventKind::ConsumeFailed => {
                warn!(queue, reason = e.reason.as_deref(), failures = e.attempt, "consume failed");
            }
            EventKind::PayloadSkipped => {
                warn!(queue, reason = e.reason.as_deref(), "payload skipped");
            }
            EventKind::PayloadLost => {
                warn!(queue, reason = e.reason.as_deref(), "payload lost on requeue");
            }
            EventKind::BackoffScheduled => {
                debug!(queue, delay_ms = e.delay_ms, failures = e.attempt, "backoff scheduled");
            }
            EventKind::StopRequested => {
                info!(queue, "stop requested");
            }
            EventKind::DrainedWithinGrace => {
                info!(queue, "drained within grace");
            }
            EventKind::GraceExceeded => {
                warn!(queue, "grace exceeded, force-cancelling");
            }
            EventKind::QueueClosed => {
                info!(queue, pending = e.pending, "queue closed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
