//! Fixed-size worker pool with a bounded submission queue.
//!
//! A pool owns `capacity` worker tasks that pull jobs off one bounded
//! `mpsc` queue. Submitting waits for queue space, so a saturated pool
//! pushes back on its callers instead of buffering without limit.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::PoolConfig;
use crate::types::OperationClass;
use crate::{HuginnError, Result};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    pending: AtomicUsize,
    dispatched: AtomicU64,
}

/// Decrements `pending` when the job carrying it is finished or dropped.
struct PendingGuard(Arc<Counters>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Point-in-time utilization of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub class: OperationClass,
    pub id: usize,
    pub capacity: usize,
    /// Tasks running right now.
    pub active: usize,
    /// Tasks accepted and not yet finished, queued ones included.
    pub pending: usize,
    /// Tasks accepted since the pool started.
    pub dispatched: u64,
}

pub struct WorkerPool {
    class: OperationClass,
    id: usize,
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl WorkerPool {
    /// Start a pool and its workers.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context; the workers are spawned immediately.
    pub fn start(class: OperationClass, id: usize, config: &PoolConfig) -> Result<Self> {
        if config.workers == 0 || config.queue_depth == 0 {
            return Err(HuginnError::Configuration(format!(
                "{} pool: workers and queue_depth must be at least 1",
                class.as_str()
            )));
        }

        let (sender, receiver) = mpsc::channel::<Job>(config.queue_depth);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..config.workers)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                tokio::spawn(async move {
                    loop {
                        // Hold the receiver lock only while waiting for the next job.
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                    debug!(class = class.as_str(), pool = id, worker, "worker exiting");
                })
            })
            .collect();

        Ok(Self {
            class,
            id,
            capacity: config.workers,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            counters: Arc::new(Counters::default()),
        })
    }

    /// Run `task` on this pool and wait for its output.
    ///
    /// Waits for queue space when the pool is saturated. A panic inside
    /// `task` is contained and reported as [`HuginnError::Internal`]; the
    /// worker that ran it keeps serving.
    pub async fn submit<T, Fut>(&self, task: Fut) -> Result<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let sender = lock(&self.sender)
            .clone()
            .ok_or(HuginnError::ShuttingDown)?;

        self.counters.pending.fetch_add(1, Ordering::AcqRel);
        let guard = PendingGuard(Arc::clone(&self.counters));
        let counters = Arc::clone(&self.counters);
        let (result_tx, result_rx) = oneshot::channel();
        let (class, id) = (self.class, self.id);

        let job: Job = Box::pin(async move {
            let _guard = guard;
            counters.active.fetch_add(1, Ordering::AcqRel);
            let outcome = AssertUnwindSafe(task).catch_unwind().await;
            counters.active.fetch_sub(1, Ordering::AcqRel);

            let result = outcome.unwrap_or_else(|_| {
                error!(class = class.as_str(), pool = id, "pool task panicked");
                Err(HuginnError::Internal("pool task panicked".to_owned()))
            });
            result_tx.send(result).ok();
        });

        if sender.send(job).await.is_err() {
            return Err(HuginnError::ShuttingDown);
        }
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);

        result_rx.await.unwrap_or(Err(HuginnError::ShuttingDown))
    }

    /// Stop accepting work, drain the queue and wait for every worker.
    ///
    /// Submissions after this call fail with [`HuginnError::ShuttingDown`].
    /// Idempotent.
    pub async fn shutdown(&self) {
        lock(&self.sender).take();
        let workers = std::mem::take(&mut *lock(&self.workers));
        for worker in workers {
            if let Err(err) = worker.await {
                error!(class = self.class.as_str(), pool = self.id, %err, "worker failed");
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        lock(&self.sender).is_none()
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::Acquire)
    }

    pub fn pending(&self) -> usize {
        self.counters.pending.load(Ordering::Acquire)
    }

    pub fn dispatched(&self) -> u64 {
        self.counters.dispatched.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            class: self.class,
            id: self.id,
            capacity: self.capacity,
            active: self.active(),
            pending: self.pending(),
            dispatched: self.dispatched(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
