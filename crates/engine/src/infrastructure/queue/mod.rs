//! Bounded, single-consumer, many-producer write queue with `DropOldest`
//! overflow (§4.A), and the worker that drains it against
//! `NpcMemoryStore::add`.
//!
//! Grounded in the teacher's `infrastructure/queues/memory_queue.rs`
//! (async-`RwLock`-guarded `Vec` + notifier-driven dequeue), simplified
//! from its priority/delay/retry queue down to the FIFO-with-drop-oldest
//! semantics this spec actually asks for.

mod writer;

pub use writer::{MemoryWriteJob, QueueMetrics, WriteQueueHandle, WriteQueueWorker};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, Notify};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,
}

/// Floor applied to configured queue capacity (§4.A: `max(100, configured)`).
pub const MIN_QUEUE_CAPACITY: usize = 100;

struct Inner<T> {
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    capacity: usize,
    closed: std::sync::atomic::AtomicBool,
    dropped: AtomicU64,
    enqueued: AtomicU64,
}

/// A bounded FIFO queue that drops its oldest entry rather than reject a
/// new enqueue once full — preserves recency under sustained load.
pub struct BoundedDropOldestQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for BoundedDropOldestQueue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Send + 'static> BoundedDropOldestQueue<T> {
    pub fn new(configured_capacity: usize) -> Self {
        let capacity = configured_capacity.max(MIN_QUEUE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                items: Mutex::new(VecDeque::with_capacity(capacity)),
                notify: Notify::new(),
                capacity,
                closed: std::sync::atomic::AtomicBool::new(false),
                dropped: AtomicU64::new(0),
                enqueued: AtomicU64::new(0),
            }),
        }
    }

    /// Non-blocking. Returns whether the item was accepted (always `true`
    /// unless the queue has been closed — an accepted item may still
    /// immediately evict the oldest entry rather than itself).
    pub async fn enqueue(&self, item: T) -> bool {
        if self.inner.closed.load(Ordering::Acquire) {
            return false;
        }
        let mut items = self.inner.items.lock().await;
        if items.len() >= self.inner.capacity {
            items.pop_front();
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
        }
        items.push_back(item);
        self.inner.enqueued.fetch_add(1, Ordering::Relaxed);
        drop(items);
        self.inner.notify.notify_one();
        true
    }

    /// Waits for an item or for the queue to be closed with nothing left
    /// to drain.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            {
                let mut items = self.inner.items.lock().await;
                if let Some(item) = items.pop_front() {
                    return item.into();
                }
                if self.inner.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            self.inner.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn metrics(&self) -> QueueMetrics {
        QueueMetrics {
            dropped: self.inner.dropped.load(Ordering::Relaxed),
            enqueued: self.inner.enqueued.load(Ordering::Relaxed),
        }
    }
}
