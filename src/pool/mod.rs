//! Worker pools for extraction work.
//!
//! Each operation class gets a [`PoolSet`]: a handful of fixed-size
//! [`WorkerPool`]s plus [`select_least_loaded`] to spread submissions across
//! them. A pool caps how many extractor calls of its class run at once; the
//! set caps the class as a whole at `pools × workers`.

mod balancer;
mod worker;

pub use balancer::select_least_loaded;
pub use worker::{PoolStats, WorkerPool};

use std::future::Future;

use tracing::info;

use crate::telemetry;
use crate::types::OperationClass;
use crate::{HuginnError, Result};

/// Sizing for one operation class.
///
/// ```rust
/// # use huginn::PoolConfig;
/// let config = PoolConfig::new().pools(2).workers(8).queue_depth(128);
/// assert_eq!(config.pools, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of pools. Default: 3.
    pub pools: usize,
    /// Workers per pool. Default: 4.
    pub workers: usize,
    /// Bounded queue length per pool. Default: 64.
    pub queue_depth: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pools: 3,
            workers: 4,
            queue_depth: 64,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pools(mut self, n: usize) -> Self {
        self.pools = n;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn queue_depth(mut self, n: usize) -> Self {
        self.queue_depth = n;
        self
    }
}

/// All pools serving one operation class.
pub struct PoolSet {
    class: OperationClass,
    pools: Vec<WorkerPool>,
}

impl PoolSet {
    /// Start `config.pools` pools for `class`.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn start(class: OperationClass, config: &PoolConfig) -> Result<Self> {
        if config.pools == 0 {
            return Err(HuginnError::Configuration(format!(
                "{} pools: at least one pool is required",
                class.as_str()
            )));
        }
        let pools = (0..config.pools)
            .map(|id| WorkerPool::start(class, id, config))
            .collect::<Result<Vec<_>>>()?;
        info!(
            class = class.as_str(),
            pools = config.pools,
            workers = config.workers,
            "worker pools started"
        );
        Ok(Self { class, pools })
    }

    /// Submit `task` to the least loaded pool and wait for its output.
    pub async fn submit<T, Fut>(&self, task: Fut) -> Result<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let pool = select_least_loaded(&self.pools).ok_or(HuginnError::ShuttingDown)?;
        metrics::counter!(
            telemetry::POOL_DISPATCHED_TOTAL,
            "operation" => self.class.as_str(),
            "pool" => pool.id().to_string()
        )
        .increment(1);
        pool.submit(task).await
    }

    pub fn class(&self) -> OperationClass {
        self.class
    }

    pub fn pools(&self) -> &[WorkerPool] {
        &self.pools
    }

    /// Maximum number of tasks this class runs at once.
    pub fn capacity(&self) -> usize {
        self.pools.iter().map(WorkerPool::capacity).sum()
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.pools.iter().map(WorkerPool::stats).collect()
    }

    /// Shut every pool down, draining queued work.
    pub async fn shutdown(&self) {
        for pool in &self.pools {
            pool.shutdown().await;
        }
        info!(class = self.class.as_str(), "worker pools stopped");
    }
}
