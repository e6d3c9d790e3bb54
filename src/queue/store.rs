//! # Ordered durable store adapter.
//!
//! Wraps a redb database holding one table of `u64 → &[u8]` records. The key
//! type gives numeric ordering natively, so storage order and insertion-key
//! order coincide at every key magnitude — there is no byte-lexicographic
//! ordering to reinterpret.
//!
//! ## Durability batching
//! Every mutating operation commits a transaction; the commit's durability is
//! decided by the pending-ops counter. When the counter would reach the
//! configured batch size, the commit is durable (fsync) and the counter
//! resets; otherwise the commit is deferred (no fsync) and the counter
//! advances. A crash loses at most `batch` deferred operations.
//!
//! ## Concurrency
//! redb admits a single writer at a time, so the read-last/assign/insert
//! sequence in [`QueueStore::append`] is one exclusive critical section per
//! store — two concurrent appenders can never observe the same last key.
//! Reads run on snapshots and never block writers.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use redb::{Database, Durability, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction};

use crate::error::StoreError;

/// Adapter over one redb table acting as an ordered `u64 → bytes` log.
pub(crate) struct QueueStore {
    db: Database,
    /// Table name; doubles as the queue's logical namespace inside the file.
    name: String,
    /// Mutating ops tolerated between durable commits (`>= 1`).
    batch: u64,
    /// Deferred-commit counter; resets on every durable commit.
    pending: Mutex<u64>,
}

impl QueueStore {
    /// Opens (or creates) the store file `<dir>/<name>.redb` and makes sure
    /// the queue table exists, so later reads never race table creation.
    pub(crate) fn open(dir: &Path, name: &str, batch: u64) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let db = Database::create(dir.join(format!("{name}.redb")))?;

        let store = Self {
            db,
            name: name.to_string(),
            batch: batch.max(1),
            pending: Mutex::new(0),
        };
        let txn = store.db.begin_write()?;
        {
            let _table = txn.open_table(store.table())?;
        }
        txn.commit()?;
        Ok(store)
    }

    fn table(&self) -> TableDefinition<'_, u64, &'static [u8]> {
        TableDefinition::new(&self.name)
    }

    /// Commits `txn` under the batching policy and updates the counter.
    ///
    /// The counter lock is held across the commit so flush accounting stays
    /// exact under concurrent mutators.
    fn commit_batched(&self, mut txn: WriteTransaction) -> Result<(), StoreError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if *pending + 1 >= self.batch {
            txn.set_durability(Durability::Immediate);
            txn.commit()?;
            *pending = 0;
        } else {
            txn.set_durability(Durability::None);
            txn.commit()?;
            *pending += 1;
        }
        Ok(())
    }

    /// Inserts `value` under the next monotonic key and returns that key.
    ///
    /// The successor is derived from the largest live key, so keys are
    /// strictly increasing among the entries currently held and never
    /// collide under concurrent appenders. An empty table starts (or
    /// restarts, after a full drain) at key 0.
    pub(crate) fn append(&self, value: &[u8]) -> Result<u64, StoreError> {
        let txn = self.db.begin_write()?;
        let key = {
            let mut table = txn.open_table(self.table())?;
            let next = match table.last()? {
                Some((last, _)) => last
                    .value()
                    .checked_add(1)
                    .ok_or(StoreError::KeySpaceExhausted)?,
                None => 0,
            };
            let _prev = table.insert(next, value)?;
            next
        };
        self.commit_batched(txn)?;
        Ok(key)
    }

    /// Removes and returns the record with the smallest key, if any.
    ///
    /// Read and delete happen inside one write transaction, so the sequence
    /// is atomic per record across concurrent pollers.
    pub(crate) fn take_first(&self) -> Result<Option<(u64, Vec<u8>)>, StoreError> {
        let txn = self.db.begin_write()?;
        let head = {
            let mut table = txn.open_table(self.table())?;
            let head = table
                .first()?
                .map(|(key, value)| (key.value(), value.value().to_vec()));
            if let Some((key, _)) = &head {
                let _removed = table.remove(*key)?;
            }
            head
        };
        match head {
            Some(record) => {
                self.commit_batched(txn)?;
                Ok(Some(record))
            }
            None => {
                // nothing changed; no need to spend a commit on durability
                txn.abort()?;
                Ok(None)
            }
        }
    }

    /// Returns the record with the smallest key without removing it.
    pub(crate) fn first(&self) -> Result<Option<(u64, Vec<u8>)>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(self.table())?;
        let head = table
            .first()?
            .map(|(key, value)| (key.value(), value.value().to_vec()));
        Ok(head)
    }

    /// Live persisted record count.
    pub(crate) fn len(&self) -> Result<u64, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(self.table())?;
        Ok(table.len()?)
    }

    /// Forces a durable commit covering all deferred operations and resets
    /// the pending-ops counter.
    pub(crate) fn flush(&self) -> Result<(), StoreError> {
        // Lock order everywhere is write txn first, then counter.
        let mut txn = self.db.begin_write()?;
        txn.set_durability(Durability::Immediate);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        txn.commit()?;
        *pending = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> QueueStore {
        QueueStore::open(dir, "store_tests", 1).unwrap()
    }

    #[test]
    fn keys_start_at_zero_and_increase() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());

        assert_eq!(store.append(b"a").unwrap(), 0);
        assert_eq!(store.append(b"b").unwrap(), 1);
        assert_eq!(store.append(b"c").unwrap(), 2);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn take_first_returns_smallest_key() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.append(b"first").unwrap();
        store.append(b"second").unwrap();

        let (key, value) = store.take_first().unwrap().unwrap();
        assert_eq!(key, 0);
        assert_eq!(value, b"first");
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn take_first_on_empty_is_none() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        assert!(store.take_first().unwrap().is_none());
        assert!(store.first().unwrap().is_none());
    }

    #[test]
    fn keys_continue_past_partial_drain() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.append(b"a").unwrap();
        store.append(b"b").unwrap();
        store.take_first().unwrap();

        // tail key 1 is still live; the next key must not collide with it
        assert_eq!(store.append(b"c").unwrap(), 2);
    }

    #[test]
    fn keys_restart_at_zero_after_full_drain() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.append(b"a").unwrap();
        store.take_first().unwrap();

        assert_eq!(store.append(b"b").unwrap(), 0);
    }

    #[test]
    fn deferred_batch_still_flushes_on_demand() {
        let dir = tempdir().unwrap();
        let store = QueueStore::open(dir.path(), "store_tests", 100).unwrap();
        for i in 0..10u8 {
            store.append(&[i]).unwrap();
        }
        store.flush().unwrap();
        assert_eq!(store.len().unwrap(), 10);
    }

    #[test]
    fn reopen_sees_durable_records() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.append(b"kept").unwrap();
        }
        let store = open_store(dir.path());
        assert_eq!(store.len().unwrap(), 1);
        let (key, value) = store.first().unwrap().unwrap();
        assert_eq!(key, 0);
        assert_eq!(value, b"kept");
    }
}
