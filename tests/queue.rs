//! End-to-end behavior of [`PersistentQueue`]: ordering, concurrency, and
//! durability across reopen.

use std::sync::Arc;
use std::thread;

use tempfile::tempdir;

use persistq::{PersistentQueue, QueueError};

#[test]
fn fifo_order_preserved() {
    let dir = tempdir().unwrap();
    let queue: PersistentQueue<String> = PersistentQueue::open(dir.path(), "fifo").unwrap();

    for i in 0..100 {
        queue.push(&format!("payload-{i:03}")).unwrap();
    }
    assert_eq!(queue.size().unwrap(), 100);

    for i in 0..100 {
        assert_eq!(queue.poll().unwrap(), Some(format!("payload-{i:03}")));
    }
    assert_eq!(queue.poll().unwrap(), None);
    assert!(queue.is_empty().unwrap());
}

#[test]
fn empty_queue_signals() {
    let dir = tempdir().unwrap();
    let queue: PersistentQueue<String> = PersistentQueue::open(dir.path(), "empty").unwrap();

    assert_eq!(queue.poll().unwrap(), None);
    assert_eq!(queue.peek().unwrap(), None);
    assert!(matches!(queue.remove(), Err(QueueError::Empty)));
    assert!(matches!(queue.element(), Err(QueueError::Empty)));
}

#[test]
fn concurrent_pushers_lose_nothing() {
    let dir = tempdir().unwrap();
    let queue: Arc<PersistentQueue<String>> =
        Arc::new(PersistentQueue::open_with_batch(dir.path(), "racy", 64).unwrap());

    let mut handles = Vec::new();
    for t in 0..8 {
        let q = Arc::clone(&queue);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                q.push(&format!("t{t}-{i:02}")).unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(queue.size().unwrap(), 200);

    // Global order depends on thread interleaving, but each pusher's own
    // payloads must come out in its push order.
    let mut last_per_thread: [Option<String>; 8] = std::array::from_fn(|_| None);
    let mut drained = 0;
    while let Some(p) = queue.poll().unwrap() {
        let t: usize = p[1..2].parse().unwrap();
        if let Some(prev) = &last_per_thread[t] {
            assert!(prev < &p, "{prev} dequeued before {p}");
        }
        last_per_thread[t] = Some(p);
        drained += 1;
    }
    assert_eq!(drained, 200);
}

#[test]
fn order_holds_across_key_width_boundaries() {
    let dir = tempdir().unwrap();
    let queue: PersistentQueue<String> =
        PersistentQueue::open_with_batch(dir.path(), "wide", 512).unwrap();

    // Enough entries to cross the one-byte and two-byte key regions of any
    // length-prefixed encoding.
    for i in 0..300u32 {
        queue.push(&format!("e{i}")).unwrap();
    }
    for i in 0..300u32 {
        assert_eq!(queue.poll().unwrap(), Some(format!("e{i}")));
    }
    assert!(queue.is_empty().unwrap());
}

#[test]
fn contents_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let queue: PersistentQueue<String> = PersistentQueue::open(dir.path(), "kept").unwrap();
        queue.push(&"a".to_string()).unwrap();
        queue.push(&"b".to_string()).unwrap();
        queue.push(&"c".to_string()).unwrap();
        queue.close().unwrap();
    }

    let queue: PersistentQueue<String> = PersistentQueue::open(dir.path(), "kept").unwrap();
    assert_eq!(queue.size().unwrap(), 3);
    assert_eq!(queue.poll().unwrap(), Some("a".to_string()));
    assert_eq!(queue.poll().unwrap(), Some("b".to_string()));
    assert_eq!(queue.poll().unwrap(), Some("c".to_string()));
}

#[test]
fn interleaved_push_poll_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let queue: PersistentQueue<String> = PersistentQueue::open(dir.path(), "mix").unwrap();
        queue.push(&"one".to_string()).unwrap();
        queue.push(&"two".to_string()).unwrap();
        assert_eq!(queue.poll().unwrap(), Some("one".to_string()));
        queue.push(&"three".to_string()).unwrap();
        queue.close().unwrap();
    }

    let queue: PersistentQueue<String> = PersistentQueue::open(dir.path(), "mix").unwrap();
    assert_eq!(queue.size().unwrap(), 2);
    assert_eq!(queue.poll().unwrap(), Some("two".to_string()));
    assert_eq!(queue.poll().unwrap(), Some("three".to_string()));
}

#[test]
fn flush_makes_batched_writes_durable() {
    let dir = tempdir().unwrap();
    {
        let queue: PersistentQueue<String> =
            PersistentQueue::open_with_batch(dir.path(), "batched", 1000).unwrap();
        for i in 0..5 {
            queue.push(&format!("v{i}")).unwrap();
        }
        queue.flush().unwrap();
    }

    let queue: PersistentQueue<String> =
        PersistentQueue::open_with_batch(dir.path(), "batched", 1000).unwrap();
    assert_eq!(queue.size().unwrap(), 5);
    for i in 0..5 {
        assert_eq!(queue.poll().unwrap(), Some(format!("v{i}")));
    }
}

#[test]
fn two_queues_in_one_directory_are_independent() {
    let dir = tempdir().unwrap();
    let orders: PersistentQueue<String> = PersistentQueue::open(dir.path(), "orders").unwrap();
    let audits: PersistentQueue<String> = PersistentQueue::open(dir.path(), "audits").unwrap();

    orders.push(&"o1".to_string()).unwrap();
    audits.push(&"a1".to_string()).unwrap();
    audits.push(&"a2".to_string()).unwrap();

    assert_eq!(orders.size().unwrap(), 1);
    assert_eq!(audits.size().unwrap(), 2);
    assert_eq!(orders.poll().unwrap(), Some("o1".to_string()));
    assert_eq!(audits.poll().unwrap(), Some("a1".to_string()));
}
