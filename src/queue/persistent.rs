//! # PersistentQueue: the crash-durable FIFO.
//!
//! A [`PersistentQueue`] owns one [`QueueStore`](super::store::QueueStore)
//! plus an availability semaphore. All methods are synchronous and safe to
//! call from any number of threads; ordering and key assignment are enforced
//! by the store's single-writer transactions.
//!
//! ## Durability
//! The batch size passed to [`PersistentQueue::open_with_batch`] bounds
//! crash loss: at most that many mutating operations can be undone by a
//! crash. The default of 1 makes every push/poll durable before it returns.
//!
//! ## The semaphore
//! The semaphore **approximates** the entry count. It is initialized from
//! the persisted count at open, released by `push`, consumed by the
//! unloading engine's dispatch loop, and bumped once more by `stop()` to
//! unpark the loop. It is a wake-up counter only; emptiness is always
//! decided by the store (`poll` returning `None`, `size()` reading the live
//! count).

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::codec::Payload;
use crate::error::QueueError;

use super::store::QueueStore;

/// Crash-durable FIFO queue of byte-serializable payloads.
///
/// # Example
/// ```no_run
/// use persistq::PersistentQueue;
///
/// # fn main() -> Result<(), persistq::QueueError> {
/// let queue: PersistentQueue<String> = PersistentQueue::open("./data", "orders")?;
/// queue.push(&"first".to_string())?;
/// assert_eq!(queue.poll()?, Some("first".to_string()));
/// assert_eq!(queue.poll()?, None);
/// queue.close()?;
/// # Ok(())
/// # }
/// ```
pub struct PersistentQueue<P> {
    name: String,
    store: QueueStore,
    items: Arc<Semaphore>,
    _payload: PhantomData<fn() -> P>,
}

impl<P: Payload> PersistentQueue<P> {
    /// Opens (or creates) the queue `name` under `dir` with a durability
    /// batch size of 1: every mutating operation is flushed before it
    /// returns.
    pub fn open(dir: impl AsRef<Path>, name: &str) -> Result<Self, QueueError> {
        Self::open_with_batch(dir, name, 1)
    }

    /// Opens (or creates) the queue `name` under `dir`.
    ///
    /// `batch` is the number of mutating operations tolerated between forced
    /// flushes — the crash-loss bound. Values below 1 are clamped to 1.
    pub fn open_with_batch(
        dir: impl AsRef<Path>,
        name: &str,
        batch: u64,
    ) -> Result<Self, QueueError> {
        let store = QueueStore::open(dir.as_ref(), name, batch)?;
        let count = store.len()?;
        let permits = count.min(Semaphore::MAX_PERMITS as u64) as usize;
        Ok(Self {
            name: name.to_string(),
            store,
            items: Arc::new(Semaphore::new(permits)),
            _payload: PhantomData,
        })
    }

    /// Appends a payload at the tail under a freshly assigned key and
    /// releases one availability permit.
    ///
    /// Fails with [`QueueError::Enqueue`] on store failure and
    /// [`QueueError::Serialization`] if the payload cannot be encoded;
    /// neither is retryable at this layer.
    pub fn push(&self, payload: &P) -> Result<(), QueueError> {
        let bytes = payload
            .to_bytes()
            .map_err(|e| QueueError::Serialization {
                reason: e.to_string(),
            })?;
        self.store
            .append(&bytes)
            .map_err(|source| QueueError::Enqueue { source })?;
        self.items.add_permits(1);
        Ok(())
    }

    /// Removes and returns the head payload, or `None` on an empty queue.
    ///
    /// The record is deleted in the same store transaction that read it;
    /// a decode failure therefore drops the record and surfaces
    /// [`QueueError::Serialization`].
    pub fn poll(&self) -> Result<Option<P>, QueueError> {
        match self.store.take_first()? {
            None => Ok(None),
            Some((_key, bytes)) => {
                let payload = P::from_bytes(&bytes).map_err(|e| QueueError::Serialization {
                    reason: e.to_string(),
                })?;
                Ok(Some(payload))
            }
        }
    }

    /// Like [`poll`](Self::poll) but signals [`QueueError::Empty`] instead
    /// of returning `None`.
    pub fn remove(&self) -> Result<P, QueueError> {
        self.poll()?.ok_or(QueueError::Empty)
    }

    /// Returns the head payload without removing it, or `None` on empty.
    pub fn peek(&self) -> Result<Option<P>, QueueError> {
        match self.store.first()? {
            None => Ok(None),
            Some((_key, bytes)) => {
                let payload = P::from_bytes(&bytes).map_err(|e| QueueError::Serialization {
                    reason: e.to_string(),
                })?;
                Ok(Some(payload))
            }
        }
    }

    /// Like [`peek`](Self::peek) but signals [`QueueError::Empty`] instead
    /// of returning `None`.
    pub fn element(&self) -> Result<P, QueueError> {
        self.peek()?.ok_or(QueueError::Empty)
    }

    /// Live persisted entry count — always the post-last-operation state,
    /// never the semaphore's approximation.
    pub fn size(&self) -> Result<u64, QueueError> {
        Ok(self.store.len()?)
    }

    /// True when no entries are persisted.
    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.size()? == 0)
    }

    /// The queue's stable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forces all deferred writes to stable media and resets the batching
    /// counter.
    pub fn flush(&self) -> Result<(), QueueError> {
        Ok(self.store.flush()?)
    }

    /// Flushes the store one final time. A first failure is logged and the
    /// flush retried unconditionally. The backing file handle is released
    /// when the last owner of the queue is dropped.
    pub fn close(&self) -> Result<(), QueueError> {
        if let Err(e) = self.store.flush() {
            warn!(queue = %self.name, error = %e, "close flush failed, retrying once");
            return self.flush_again();
        }
        Ok(())
    }

    fn flush_again(&self) -> Result<(), QueueError> {
        Ok(self.store.flush()?)
    }

    /// Blocks until at least one availability permit is present and consumes
    /// it. Returns `false` if the semaphore was closed.
    ///
    /// Crate-internal: this is the dispatch loop's sole suspension point.
    pub(crate) async fn acquire_item(&self) -> bool {
        match self.items.acquire().await {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_closed) => false,
        }
    }

    /// Releases one availability permit without pushing, used by `stop()` to
    /// unpark a dispatch loop parked on [`acquire_item`](Self::acquire_item).
    pub(crate) fn release_one(&self) {
        self.items.add_permits(1);
    }

    /// Current semaphore value, exposed for tests of the approximation.
    #[cfg(test)]
    pub(crate) fn available_permits(&self) -> usize {
        self.items.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_queue(dir: &Path) -> PersistentQueue<String> {
        PersistentQueue::open(dir, "persistent_tests").unwrap()
    }

    #[test]
    fn push_then_poll_round_trips() {
        let dir = tempdir().unwrap();
        let queue = open_queue(dir.path());

        queue.push(&"one".to_string()).unwrap();
        queue.push(&"two".to_string()).unwrap();
        assert_eq!(queue.size().unwrap(), 2);

        assert_eq!(queue.poll().unwrap(), Some("one".to_string()));
        assert_eq!(queue.poll().unwrap(), Some("two".to_string()));
        assert_eq!(queue.poll().unwrap(), None);
        assert!(queue.is_empty().unwrap());
    }

    #[test]
    fn remove_and_element_signal_empty() {
        let dir = tempdir().unwrap();
        let queue = open_queue(dir.path());

        assert!(matches!(queue.remove(), Err(QueueError::Empty)));
        assert!(matches!(queue.element(), Err(QueueError::Empty)));
    }

    #[test]
    fn peek_does_not_remove() {
        let dir = tempdir().unwrap();
        let queue = open_queue(dir.path());

        queue.push(&"head".to_string()).unwrap();
        assert_eq!(queue.peek().unwrap(), Some("head".to_string()));
        assert_eq!(queue.element().unwrap(), "head".to_string());
        assert_eq!(queue.size().unwrap(), 1);
        assert_eq!(queue.poll().unwrap(), Some("head".to_string()));
    }

    #[test]
    fn push_releases_permits_and_open_counts_existing() {
        let dir = tempdir().unwrap();
        {
            let queue = open_queue(dir.path());
            queue.push(&"a".to_string()).unwrap();
            queue.push(&"b".to_string()).unwrap();
            assert_eq!(queue.available_permits(), 2);
            queue.close().unwrap();
        }
        let reopened = open_queue(dir.path());
        assert_eq!(reopened.available_permits(), 2);
        assert_eq!(reopened.size().unwrap(), 2);
    }

    #[test]
    fn poisoned_record_is_dropped_on_poll() {
        let dir = tempdir().unwrap();
        // a Vec<u8> writer can store bytes that are not valid UTF-8
        {
            let raw: PersistentQueue<Vec<u8>> =
                PersistentQueue::open(dir.path(), "persistent_tests").unwrap();
            raw.push(&vec![0xff, 0xfe]).unwrap();
            raw.close().unwrap();
        }
        let queue = open_queue(dir.path());
        let err = queue.poll().unwrap_err();
        assert!(matches!(err, QueueError::Serialization { .. }));
        // the undecodable record is already gone
        assert_eq!(queue.size().unwrap(), 0);
    }
}
