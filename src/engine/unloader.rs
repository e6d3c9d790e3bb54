//! # QueueUnloader: drives consumers off a persistent queue.
//!
//! The [`QueueUnloader`] owns the event bus, a [`SubscriberSet`], the worker
//! slot semaphore, and the lifecycle tokens. It spawns the dispatch loop and
//! tears everything down within a grace window.
//!
//! ## High-level architecture
//! ```text
//! start():
//!   - subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   - publish(UnloadStarted { pending })
//!   - spawn dispatch::run_loop(ctx)        (stores JoinHandle)
//!
//! dispatch loop (see dispatch.rs):
//!   queue semaphore ─► remove() ─► backoff? ─► worker slot ─► consume task
//!                                                │ Err: requeue + failures += 1
//!                                                │ Ok:  failures = 0
//!
//! stop():
//!   publish(StopRequested)
//!   stop.cancel() + one semaphore permit  → loop unparks and exits
//!   timeout(grace, loop handle)           → abort on overrun
//!   tracker.close(); timeout(grace, tracker.wait())
//!          ├─ Ok        → DrainedWithinGrace
//!          └─ Timeout   → kill.cancel(), wait again, GraceExceeded
//!   queue.close()                          (flush, retry once)
//!   publish(QueueClosed)
//! ```

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::warn;

use crate::codec::Payload;
use crate::consumer::Consumer;
use crate::engine::config::UnloaderConfig;
use crate::engine::dispatch::{self, DispatchCtx};
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::WaitStrategy;
use crate::queue::PersistentQueue;
use crate::subscribers::SubscriberSet;

/// Lifecycle of a [`QueueUnloader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UnloaderState {
    /// Constructed, dispatch loop not yet spawned.
    Created = 0,
    /// Dispatch loop running.
    Running = 1,
    /// `stop()` in progress.
    Stopping = 2,
    /// Fully stopped; queue closed.
    Stopped = 3,
}

impl UnloaderState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => UnloaderState::Created,
            1 => UnloaderState::Running,
            2 => UnloaderState::Stopping,
            _ => UnloaderState::Stopped,
        }
    }
}

/// Coordinates the dispatch loop, consume tasks, event delivery, and
/// graceful shutdown over one [`PersistentQueue`].
pub struct QueueUnloader<P: Payload> {
    queue: Arc<PersistentQueue<P>>,
    consumer: Arc<dyn Consumer<P>>,
    wait: WaitStrategy,
    grace: Duration,

    bus: Bus,
    subs: Arc<SubscriberSet>,

    workers: Arc<Semaphore>,
    tracker: TaskTracker,
    stop: CancellationToken,
    kill: CancellationToken,
    failures: Arc<AtomicU32>,

    loop_handle: Mutex<Option<JoinHandle<()>>>,
    state: AtomicU8,
}

impl<P: Payload> QueueUnloader<P> {
    /// Creates an unloader over `queue` from a validated configuration.
    ///
    /// Must be called within a Tokio runtime (subscriber workers are spawned
    /// here).
    pub fn new(queue: Arc<PersistentQueue<P>>, cfg: UnloaderConfig<P>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(cfg.subscribers));
        Self {
            queue,
            consumer: cfg.consumer,
            wait: cfg.wait,
            grace: cfg.grace,
            bus,
            subs,
            workers: Arc::new(Semaphore::new(cfg.workers)),
            tracker: TaskTracker::new(),
            stop: CancellationToken::new(),
            kill: CancellationToken::new(),
            failures: Arc::new(AtomicU32::new(0)),
            loop_handle: Mutex::new(None),
            state: AtomicU8::new(UnloaderState::Created as u8),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> UnloaderState {
        UnloaderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The event bus; subscribe to observe lifecycle events directly.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The queue this unloader drains.
    pub fn queue(&self) -> &Arc<PersistentQueue<P>> {
        &self.queue
    }

    /// Spawns the dispatch loop. Idempotent: calls after the first are
    /// logged and ignored.
    ///
    /// Must be called within a Tokio runtime.
    pub async fn start(&self) {
        let flipped = self.state.compare_exchange(
            UnloaderState::Created as u8,
            UnloaderState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if flipped.is_err() {
            warn!(queue = %self.queue.name(), state = ?self.state(), "start ignored");
            return;
        }

        self.subscriber_listener();

        let pending = self.queue.size().unwrap_or(0);
        self.bus.publish(
            Event::new(EventKind::UnloadStarted)
                .with_queue(self.queue.name())
                .with_pending(pending),
        );

        let ctx = DispatchCtx {
            queue: Arc::clone(&self.queue),
            consumer: Arc::clone(&self.consumer),
            wait: self.wait.clone(),
            bus: self.bus.clone(),
            workers: Arc::clone(&self.workers),
            tracker: self.tracker.clone(),
            stop: self.stop.clone(),
            kill: self.kill.clone(),
            failures: Arc::clone(&self.failures),
        };
        let handle = tokio::spawn(dispatch::run_loop(ctx));
        *self.loop_handle.lock().await = Some(handle);
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn subscriber_listener(&self) {
        if self.subs.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                set.emit(&ev);
            }
        });
    }

    /// Stops the dispatch loop, waits up to the grace window for in-flight
    /// consumptions, then flushes and closes the queue.
    ///
    /// Returns [`EngineError::GraceExceeded`] when stragglers had to be
    /// force-cancelled; the queue is closed either way. Calls when not
    /// running are no-ops.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let flipped = self.state.compare_exchange(
            UnloaderState::Running as u8,
            UnloaderState::Stopping as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if flipped.is_err() {
            warn!(queue = %self.queue.name(), state = ?self.state(), "stop ignored");
            return Ok(());
        }

        self.bus
            .publish(Event::new(EventKind::StopRequested).with_queue(self.queue.name()));
        self.stop.cancel();
        // Unpark a loop waiting on an empty queue.
        self.queue.release_one();

        let mut exceeded = false;
        let mut in_flight = 0usize;

        if let Some(handle) = self.loop_handle.lock().await.take() {
            let abort = handle.abort_handle();
            if tokio::time::timeout(self.grace, handle).await.is_err() {
                warn!(queue = %self.queue.name(), "dispatch loop did not exit in time");
                abort.abort();
                exceeded = true;
            }
        }

        self.tracker.close();
        if tokio::time::timeout(self.grace, self.tracker.wait())
            .await
            .is_err()
        {
            in_flight = self.tracker.len();
            warn!(
                queue = %self.queue.name(),
                in_flight,
                "grace exceeded, cancelling in-flight consumptions"
            );
            self.kill.cancel();
            self.tracker.wait().await;
            exceeded = true;
        }

        if let Err(e) = self.queue.close() {
            warn!(queue = %self.queue.name(), error = %e, "queue close failed");
        }

        let pending = self.queue.size().unwrap_or(0);
        let outcome = if exceeded {
            EventKind::GraceExceeded
        } else {
            EventKind::DrainedWithinGrace
        };
        self.bus
            .publish(Event::new(outcome).with_queue(self.queue.name()));
        self.bus.publish(
            Event::new(EventKind::QueueClosed)
                .with_queue(self.queue.name())
                .with_pending(pending),
        );

        self.state
            .store(UnloaderState::Stopped as u8, Ordering::Release);

        if exceeded {
            Err(EngineError::GraceExceeded {
                grace: self.grace,
                in_flight,
            })
        } else {
            Ok(())
        }
    }
}
