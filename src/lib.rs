//! # persistq
//!
//! **Persistq** is a crash-durable FIFO queue with an unloading engine.
//!
//! Payloads are persisted in an embedded ordered store under monotonically
//! increasing numeric keys, so iteration order is insertion order and the
//! queue survives process restarts. The unloading engine drains the queue
//! into a user [`Consumer`], with bounded concurrency, failure backoff, and
//! automatic requeue.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  push(&payload)                                   poll()/peek()/remove()
//!       │                                                  ▲
//!       ▼                                                  │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  PersistentQueue<P>                                               │
//! │  - Payload codec (P: Payload → bytes)                             │
//! │  - availability Semaphore (wake-up counter)                       │
//! │  - QueueStore: redb table keyed by u64, batched durability        │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                │ acquire_item() / remove()
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  QueueUnloader<P>                                                 │
//! │  - dispatch loop: semaphore ─► remove ─► backoff? ─► worker slot  │
//! │  - worker pool (Semaphore, N slots) running consume tasks         │
//! │  - WaitStrategy: delay between dispatches under sustained failure │
//! │  - requeue: failed payloads go back to the tail under a fresh key │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publishes Events (ConsumeOk, ConsumeFailed, BackoffScheduled, ...)
//!        ▼
//! ┌────────────────────────┐      ┌──────────────────────────────────┐
//! │  Bus (broadcast)       │ ───► │  SubscriberSet (per-sub queues)  │
//! └────────────────────────┘      │   worker1  worker2 ... workerN   │
//!                                 │   sub.on_event(&Event)           │
//!                                 └──────────────────────────────────┘
//! ```
//!
//! ### Durability
//! Every mutating queue operation runs in its own store transaction. With a
//! durability batch of 1 (the default) each operation is synced to disk
//! before it returns; with batch `B > 1` at most `B` operations can be lost
//! to a crash, and [`PersistentQueue::flush`] forces an immediate sync.
//!
//! ## Features
//! | Area              | Description                                                      | Key types / traits                          |
//! |-------------------|------------------------------------------------------------------|---------------------------------------------|
//! | **Queue**         | Durable FIFO: push/poll/peek/remove/size over any payload type.  | [`PersistentQueue`], [`Payload`]            |
//! | **Consumption**   | Async handler invoked per payload by the engine.                 | [`Consumer`]                                |
//! | **Engine**        | Dispatch loop, worker pool, graceful stop with a grace window.   | [`QueueUnloader`], [`UnloaderConfig`]       |
//! | **Backoff**       | Delay schedules applied under sustained consumer failure.        | [`WaitStrategy`]                            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom sinks).     | [`Subscribe`], [`Event`], [`EventKind`]     |
//! | **Errors**        | Typed errors per layer.                                          | [`QueueError`], [`EngineError`]             |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use persistq::{
//!     ConsumeError, Consumer, PersistentQueue, QueueUnloader, UnloaderConfig, WaitStrategy,
//! };
//!
//! struct Printer;
//!
//! #[async_trait::async_trait]
//! impl Consumer<String> for Printer {
//!     async fn consume(&self, payload: &String) -> Result<(), ConsumeError> {
//!         println!("got: {payload}");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let queue: Arc<PersistentQueue<String>> =
//!         Arc::new(PersistentQueue::open("./data", "printer")?);
//!
//!     queue.push(&"hello".to_string())?;
//!
//!     let cfg = UnloaderConfig::builder()
//!         .consumer(Printer)
//!         .workers(2)
//!         .wait(WaitStrategy::incrementing(
//!             Duration::from_millis(5),
//!             Duration::from_millis(100),
//!             Duration::from_secs(5),
//!         ))
//!         .grace(Duration::from_secs(10))
//!         .build()?;
//!
//!     let unloader = QueueUnloader::new(Arc::clone(&queue), cfg);
//!     unloader.start().await;
//!
//!     tokio::time::sleep(Duration::from_millis(200)).await;
//!     unloader.stop().await?;
//!     Ok(())
//! }
//! ```

mod codec;
mod consumer;
mod engine;
mod error;
mod events;
mod policies;
mod queue;
mod subscribers;

// ---- Public re-exports ----

pub use codec::{CodecError, Payload};
pub use consumer::{ConsumeError, Consumer};
pub use engine::{QueueUnloader, UnloaderConfig, UnloaderConfigBuilder, UnloaderState};
pub use error::{ConfigError, EngineError, QueueError, StoreError};
pub use events::{Bus, Event, EventKind};
pub use policies::WaitStrategy;
pub use queue::PersistentQueue;
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
