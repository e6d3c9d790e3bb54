//! # Dispatch loop: pulls payloads off the queue and hands them to workers.
//!
//! One loop runs per [`QueueUnloader`](crate::QueueUnloader). Its cycle:
//!
//! ```text
//! ┌─► wait on availability semaphore (or stop token)
//! │       │
//! │       ▼
//! │   remove() head record            (spawn_blocking; disk I/O)
//! │       │ Empty / undecodable ──► PayloadSkipped, continue
//! │       ▼
//! │   failures > 0 ? sleep WaitStrategy::delay_for(failures)
//! │       │                           (BackoffScheduled; stop interrupts)
//! │       ▼
//! │   acquire worker slot             (stop interrupts → requeue, exit)
//! │       │
//! │       ▼
//! └── spawn consume task on the tracker, loop again
//!
//! consume task:
//!     consumer.consume(&payload)
//!         Ok  ──► failures = 0, ConsumeOk
//!         Err ──► failures += 1, ConsumeFailed, push payload back
//!     kill token ─► requeue best-effort, exit
//! ```
//!
//! The loop dispatches in FIFO order; with more than one worker slot the
//! *completion* order is up to the consumers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::codec::Payload;
use crate::consumer::Consumer;
use crate::events::{Bus, Event, EventKind};
use crate::policies::WaitStrategy;
use crate::queue::PersistentQueue;

/// Everything the dispatch loop needs, snapshotted at start.
pub(crate) struct DispatchCtx<P: Payload> {
    pub queue: Arc<PersistentQueue<P>>,
    pub consumer: Arc<dyn Consumer<P>>,
    pub wait: WaitStrategy,
    pub bus: Bus,
    pub workers: Arc<Semaphore>,
    pub tracker: TaskTracker,
    pub stop: CancellationToken,
    pub kill: CancellationToken,
    pub failures: Arc<AtomicU32>,
}

/// Runs until the stop token fires. Never returns an error: store and
/// consumer failures are absorbed, logged, and published so one bad payload
/// cannot take the loop down.
pub(crate) async fn run_loop<P: Payload>(ctx: DispatchCtx<P>) {
    loop {
        let woken = tokio::select! {
            _ = ctx.stop.cancelled() => break,
            woken = ctx.queue.acquire_item() => woken,
        };
        if !woken || ctx.stop.is_cancelled() {
            break;
        }

        let payload = match take_head(&ctx).await {
            Some(p) => p,
            None => continue,
        };

        // Under sustained failure, delay the next dispatch.
        let attempt = ctx.failures.load(Ordering::Relaxed);
        if attempt > 0 {
            let delay = ctx.wait.delay_for(attempt);
            if !delay.is_zero() {
                ctx.bus.publish(
                    Event::new(EventKind::BackoffScheduled)
                        .with_queue(ctx.queue.name())
                        .with_attempt(attempt)
                        .with_delay(delay),
                );
                let interrupted = tokio::select! {
                    _ = ctx.stop.cancelled() => true,
                    _ = tokio::time::sleep(delay) => false,
                };
                if interrupted {
                    requeue(&ctx.queue, payload, &ctx.bus).await;
                    break;
                }
            }
        }

        let permit = tokio::select! {
            _ = ctx.stop.cancelled() => {
                requeue(&ctx.queue, payload, &ctx.bus).await;
                break;
            }
            permit = Arc::clone(&ctx.workers).acquire_owned() => match permit {
                Ok(p) => p,
                Err(_closed) => {
                    requeue(&ctx.queue, payload, &ctx.bus).await;
                    break;
                }
            },
        };

        ctx.bus
            .publish(Event::new(EventKind::ConsumeStarting).with_queue(ctx.queue.name()));

        let queue = Arc::clone(&ctx.queue);
        let consumer = Arc::clone(&ctx.consumer);
        let bus = ctx.bus.clone();
        let kill = ctx.kill.clone();
        let failures = Arc::clone(&ctx.failures);
        ctx.tracker.spawn(async move {
            let _slot = permit;
            tokio::select! {
                _ = kill.cancelled() => {
                    debug!(queue = %queue.name(), "consumption cancelled past grace");
                    requeue(&queue, payload, &bus).await;
                }
                outcome = consumer.consume(&payload) => match outcome {
                    Ok(()) => {
                        failures.store(0, Ordering::Relaxed);
                        bus.publish(Event::new(EventKind::ConsumeOk).with_queue(queue.name()));
                    }
                    Err(e) => {
                        let attempt = failures.fetch_add(1, Ordering::Relaxed) + 1;
                        warn!(queue = %queue.name(), attempt, error = %e, "consumption failed");
                        bus.publish(
                            Event::new(EventKind::ConsumeFailed)
                                .with_queue(queue.name())
                                .with_attempt(attempt)
                                .with_reason(e.to_string()),
                        );
                        requeue(&queue, payload, &bus).await;
                    }
                },
            }
        });
    }

    debug!("dispatch loop exited");
}

/// Removes the head record off the async runtime.
///
/// Returns `None` on absorbed failures: an empty queue (a spurious wake-up or
/// a race with another caller), an undecodable record (already removed by the
/// store, dropped), or an unexpected store failure.
async fn take_head<P: Payload>(ctx: &DispatchCtx<P>) -> Option<P> {
    let queue = Arc::clone(&ctx.queue);
    let joined = tokio::task::spawn_blocking(move || queue.remove()).await;

    match joined {
        Ok(Ok(payload)) => Some(payload),
        Ok(Err(e)) if e.is_skippable() => {
            debug!(queue = %ctx.queue.name(), error = %e, "head skipped");
            ctx.bus.publish(
                Event::new(EventKind::PayloadSkipped)
                    .with_queue(ctx.queue.name())
                    .with_reason(e.to_string()),
            );
            None
        }
        Ok(Err(e)) => {
            warn!(queue = %ctx.queue.name(), error = %e, "head removal failed");
            ctx.bus.publish(
                Event::new(EventKind::PayloadSkipped)
                    .with_queue(ctx.queue.name())
                    .with_reason(e.to_string()),
            );
            None
        }
        Err(join_err) => {
            warn!(queue = %ctx.queue.name(), error = %join_err, "head removal task failed");
            None
        }
    }
}

/// Pushes a payload back onto the tail. Failure to do so loses the payload;
/// that is logged and published as [`EventKind::PayloadLost`].
async fn requeue<P: Payload>(queue: &Arc<PersistentQueue<P>>, payload: P, bus: &Bus) {
    let q = Arc::clone(queue);
    let joined = tokio::task::spawn_blocking(move || q.push(&payload)).await;

    let reason = match joined {
        Ok(Ok(())) => return,
        Ok(Err(e)) => e.to_string(),
        Err(join_err) => join_err.to_string(),
    };
    warn!(queue = %queue.name(), error = %reason, "requeue failed, payload lost");
    bus.publish(
        Event::new(EventKind::PayloadLost)
            .with_queue(queue.name())
            .with_reason(reason),
    );
}
