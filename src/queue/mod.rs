//! # Queue: durable FIFO storage.
//!
//! ```text
//! PersistentQueue<P>         typed FIFO API + availability semaphore
//!        │
//!        ▼
//!    QueueStore              redb tables, key assignment, batched sync
//! ```
//!
//! - [`PersistentQueue`] is the public face: `push` / `poll` / `peek` and
//!   friends over any [`Payload`](crate::Payload) type.
//! - [`store::QueueStore`] maps one queue to one redb table keyed by a
//!   monotonically assigned `u64`, so iteration order is FIFO order.

mod persistent;
pub(crate) mod store;

pub use persistent::PersistentQueue;
