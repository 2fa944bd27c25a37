//! # Operation Queue
//!
//! Deduplicating FIFO of operation IDs serviced by a fixed pool of workers.
//!
//! The dirty/processing bookkeeping guarantees at most one worker runs a
//! given operation ID at a time: adding an ID that is currently being
//! processed marks it dirty, and it is redelivered exactly once after the
//! in-flight execute finishes. Workers never sleep on behalf of an
//! operation; a requested redrive delay is honored by re-adding the ID
//! after the delay elapses.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::executor::OperationExecutor;

struct QueueState {
    queue: VecDeque<String>,
    dirty: HashSet<String>,
    processing: HashSet<String>,
}

struct QueueInner {
    executor: Arc<dyn OperationExecutor>,
    state: Mutex<QueueState>,
    /// One permit per queued ID; closed on shutdown.
    items: Semaphore,
}

impl QueueInner {
    fn add(&self, operation_id: &str) {
        let mut state = self.state.lock();
        if state.dirty.contains(operation_id) {
            return;
        }
        state.dirty.insert(operation_id.to_string());
        if state.processing.contains(operation_id) {
            // Redelivered by done() once the in-flight execute finishes
            return;
        }
        state.queue.push_back(operation_id.to_string());
        drop(state);
        self.items.add_permits(1);
    }

    async fn next(&self) -> Option<String> {
        loop {
            match self.items.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return None,
            }
            let mut state = self.state.lock();
            if let Some(operation_id) = state.queue.pop_front() {
                state.dirty.remove(&operation_id);
                state.processing.insert(operation_id.clone());
                return Some(operation_id);
            }
        }
    }

    fn done(&self, operation_id: &str) {
        let mut state = self.state.lock();
        state.processing.remove(operation_id);
        if state.dirty.contains(operation_id) {
            state.queue.push_back(operation_id.to_string());
            drop(state);
            self.items.add_permits(1);
        }
    }
}

/// Work queue exposed to process bootstrap code.
pub struct OperationQueue {
    inner: Arc<QueueInner>,
    worker_count: usize,
}

impl OperationQueue {
    pub fn new(executor: Arc<dyn OperationExecutor>, worker_count: usize) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                executor,
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                }),
                items: Semaphore::new(0),
            }),
            worker_count,
        }
    }

    /// Enqueue an operation ID. IDs already queued or being processed are
    /// deduplicated; a processed-while-added ID is redelivered once.
    pub fn add(&self, operation_id: &str) {
        self.inner.add(operation_id);
    }

    /// Start the worker pool. Returns the worker handles so bootstrap code
    /// can await them after [`Self::shutdown`].
    pub fn run(&self) -> Vec<JoinHandle<()>> {
        info!(workers = self.worker_count, "Starting operation queue");
        (0..self.worker_count)
            .map(|worker_id| {
                let inner = self.inner.clone();
                tokio::spawn(worker_loop(inner, worker_id))
            })
            .collect()
    }

    /// Stop accepting new work. In-flight executes run to completion;
    /// workers exit once they come back for the next item.
    pub fn shutdown(&self) {
        info!("Shutting down operation queue");
        self.inner.items.close();
    }

    /// Shut down and wait for every worker to finish its in-flight execute.
    pub async fn shutdown_and_wait(&self, workers: Vec<JoinHandle<()>>) {
        self.shutdown();
        futures::future::join_all(workers).await;
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

async fn worker_loop(inner: Arc<QueueInner>, worker_id: usize) {
    debug!(worker_id, "Queue worker started");
    while let Some(operation_id) = inner.next().await {
        match inner.executor.execute(&operation_id).await {
            Ok(when) if when > Duration::ZERO => {
                debug!(
                    worker_id,
                    operation_id = %operation_id,
                    redrive_secs = when.as_secs(),
                    "Re-queueing operation after requested delay"
                );
                let inner = inner.clone();
                let id = operation_id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(when).await;
                    inner.add(&id);
                });
            }
            Ok(_) => {
                debug!(worker_id, operation_id = %operation_id, "Operation processing finished");
            }
            Err(err) => {
                warn!(
                    worker_id,
                    operation_id = %operation_id,
                    error = %err,
                    "Operation processing failed, dropping it from the queue"
                );
            }
        }
        inner.done(&operation_id);
    }
    debug!(worker_id, "Queue worker stopped");
}
