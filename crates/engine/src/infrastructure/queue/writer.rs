//! The bounded asynchronous writer: a dedicated worker that drains the
//! memory-write queue one job at a time, soft-rate-limited.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use loreweave_domain::NpcMemoryWrite;

use crate::infrastructure::persistence::NpcMemoryStorePort;
use crate::infrastructure::queue::BoundedDropOldestQueue;

pub type MemoryWriteJob = NpcMemoryWrite;

#[derive(Debug, Clone, Copy, Default)]
pub struct QueueMetrics {
    pub dropped: u64,
    pub enqueued: u64,
}

/// Producer-side handle: the cognition pipeline enqueues through this,
/// never touching the worker directly.
#[derive(Clone)]
pub struct WriteQueueHandle {
    queue: BoundedDropOldestQueue<MemoryWriteJob>,
}

impl WriteQueueHandle {
    pub fn new(queue: BoundedDropOldestQueue<MemoryWriteJob>) -> Self {
        Self { queue }
    }

    /// Non-blocking; returns acceptance, never waits on the store.
    pub async fn enqueue(&self, job: MemoryWriteJob) -> bool {
        self.queue.enqueue(job).await
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.queue.metrics()
    }
}

/// Consumer-side worker. `max_writes_per_second` of `0` disables rate
/// limiting (drains as fast as the store accepts writes).
pub struct WriteQueueWorker {
    queue: BoundedDropOldestQueue<MemoryWriteJob>,
    store: Arc<dyn NpcMemoryStorePort>,
    max_writes_per_second: u32,
}

impl WriteQueueWorker {
    pub fn new(
        queue: BoundedDropOldestQueue<MemoryWriteJob>,
        store: Arc<dyn NpcMemoryStorePort>,
        max_writes_per_second: u32,
    ) -> Self {
        Self { queue, store, max_writes_per_second }
    }

    fn inter_write_delay(&self) -> Duration {
        if self.max_writes_per_second == 0 {
            Duration::from_millis(0)
        } else {
            Duration::from_millis((1000 / self.max_writes_per_second as u64).max(0))
        }
    }

    /// Runs until the queue is closed and drained, or `cancel` fires.
    /// Writer exceptions are logged and swallowed — a single bad write
    /// must never stop the loop (§4.A, §7).
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("memory write worker started");
            loop {
                let job = tokio::select! {
                    job = self.queue.dequeue() => job,
                    _ = cancel.cancelled() => {
                        tracing::info!("memory write worker cancelled");
                        break;
                    }
                };
                let Some(job) = job else {
                    tracing::info!("memory write worker drained and exiting");
                    break;
                };
                if let Err(err) = self.store.add(job).await {
                    tracing::warn!(error = %err, "memory write failed, dropping");
                }
                let delay = self.inter_write_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loreweave_domain::{DomainError, MemoryRecallQuery, NpcMemory};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        count: AtomicUsize,
    }

    #[async_trait]
    impl NpcMemoryStorePort for CountingStore {
        async fn add(&self, _write: NpcMemoryWrite) -> Result<(), DomainError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn recall(&self, _query: MemoryRecallQuery) -> Vec<NpcMemory> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn worker_drains_enqueued_jobs_into_the_store() {
        let queue = BoundedDropOldestQueue::new(100);
        let handle = WriteQueueHandle::new(queue.clone());
        let store = Arc::new(CountingStore { count: AtomicUsize::new(0) });
        let worker = WriteQueueWorker::new(queue.clone(), store.clone(), 0);
        let cancel = CancellationToken::new();
        let join = worker.spawn(cancel.clone());

        handle
            .enqueue(NpcMemoryWrite {
                id: loreweave_domain::MemoryId::new(),
                npc_id: loreweave_domain::NpcId::new("barnaby"),
                subject: None,
                room_id: None,
                area_id: None,
                kind: "conversation".to_string(),
                importance: 30,
                tags: vec![],
                content: "hello".to_string(),
                expires_at: None,
                embedding: None,
            })
            .await;

        // give the worker a moment to drain, then close and join.
        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();
        join.await.unwrap();
        assert_eq!(store.count.load(Ordering::SeqCst), 1);
    }
}
