//! Integration tests for worker pools and least-loaded dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use huginn::{HuginnError, OperationClass, PoolConfig, PoolSet, WorkerPool, select_least_loaded};
use tokio::sync::Semaphore;

// ============================================================================
// Helpers
// ============================================================================

/// Tracks how many tasks run at once and the highest value reached.
#[derive(Default)]
struct Concurrency {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Concurrency {
    async fn run(self: Arc<Self>, hold: Duration) -> huginn::Result<()> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(hold).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn single_pool(workers: usize) -> WorkerPool {
    WorkerPool::start(
        OperationClass::Audio,
        0,
        &PoolConfig::new().pools(1).workers(workers),
    )
    .unwrap()
}

async fn boom() -> huginn::Result<u32> {
    panic!("task exploded");
}

// ============================================================================
// WorkerPool
// ============================================================================

#[tokio::test]
async fn submit_returns_task_output() {
    let pool = single_pool(2);
    let value = pool.submit(async { Ok::<_, HuginnError>(21 * 2) }).await.unwrap();
    assert_eq!(value, 42);
    assert_eq!(pool.dispatched(), 1);
    assert_eq!(pool.pending(), 0);
}

#[tokio::test]
async fn submit_propagates_task_error() {
    let pool = single_pool(1);
    let err = pool
        .submit(async { Err::<(), _>(HuginnError::NotFound("x".into())) })
        .await
        .unwrap_err();
    assert_eq!(err, HuginnError::NotFound("x".into()));
}

#[tokio::test(start_paused = true)]
async fn running_tasks_never_exceed_worker_count() {
    let pool = single_pool(2);
    let tracker = Arc::new(Concurrency::default());

    let tasks = (0..8).map(|_| pool.submit(Arc::clone(&tracker).run(Duration::from_millis(10))));
    let results = join_all(tasks).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(tracker.peak.load(Ordering::SeqCst), 2);
    assert_eq!(pool.dispatched(), 8);
    assert_eq!(pool.active(), 0);
}

#[tokio::test]
async fn panicking_task_does_not_kill_worker() {
    let pool = single_pool(1);

    let err = pool.submit(boom()).await.unwrap_err();
    assert!(matches!(err, HuginnError::Internal(_)));

    let value = pool.submit(async { Ok::<_, HuginnError>(7) }).await.unwrap();
    assert_eq!(value, 7);
    assert_eq!(pool.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_drains_queued_work() {
    let pool = Arc::new(single_pool(1));
    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move {
                pool.submit(async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, HuginnError>(i)
                })
                .await
            })
        })
        .collect();
    tokio::task::yield_now().await;
    assert_eq!(pool.pending(), 4);

    pool.shutdown().await;
    assert!(pool.is_shut_down());

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), Ok(i as u32));
    }
}

#[tokio::test]
async fn submit_after_shutdown_is_refused() {
    let pool = single_pool(1);
    pool.shutdown().await;
    pool.shutdown().await;

    let err = pool.submit(async { Ok::<_, HuginnError>(()) }).await.unwrap_err();
    assert_eq!(err, HuginnError::ShuttingDown);
    assert_eq!(pool.dispatched(), 0);
}

#[tokio::test]
async fn zero_workers_is_a_configuration_error() {
    let err = WorkerPool::start(OperationClass::Search, 0, &PoolConfig::new().workers(0))
        .err()
        .unwrap();
    assert!(matches!(err, HuginnError::Configuration(_)));

    let err = WorkerPool::start(OperationClass::Search, 0, &PoolConfig::new().queue_depth(0))
        .err()
        .unwrap();
    assert!(matches!(err, HuginnError::Configuration(_)));
}

// ============================================================================
// PoolSet and balancing
// ============================================================================

#[tokio::test]
async fn pool_set_starts_configured_pools() {
    let set = PoolSet::start(
        OperationClass::Video,
        &PoolConfig::new().pools(3).workers(2),
    )
    .unwrap();

    assert_eq!(set.class(), OperationClass::Video);
    assert_eq!(set.pools().len(), 3);
    assert_eq!(set.capacity(), 6);
    let ids: Vec<_> = set.stats().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[tokio::test]
async fn zero_pools_is_a_configuration_error() {
    let err = PoolSet::start(OperationClass::Search, &PoolConfig::new().pools(0))
        .err()
        .unwrap();
    assert!(matches!(err, HuginnError::Configuration(_)));
}

#[tokio::test]
async fn idle_pools_tie_break_to_first() {
    let set = PoolSet::start(OperationClass::Audio, &PoolConfig::new().pools(3)).unwrap();
    assert_eq!(select_least_loaded(set.pools()).map(WorkerPool::id), Some(0));
    assert!(select_least_loaded(&[]).is_none());
}

#[tokio::test]
async fn load_spreads_evenly_across_pools() {
    let set = Arc::new(
        PoolSet::start(
            OperationClass::Audio,
            &PoolConfig::new().pools(3).workers(1),
        )
        .unwrap(),
    );
    let gate = Arc::new(Semaphore::new(0));

    let handles: Vec<_> = (0..9)
        .map(|_| {
            let set = Arc::clone(&set);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                set.submit(async move {
                    let _permit = gate
                        .acquire()
                        .await
                        .map_err(|e| HuginnError::Internal(e.to_string()))?;
                    Ok::<(), HuginnError>(())
                })
                .await
            })
        })
        .collect();
    tokio::task::yield_now().await;

    let pending: Vec<_> = set.stats().iter().map(|s| s.pending).collect();
    let max = pending.iter().max().copied().unwrap_or(0);
    let min = pending.iter().min().copied().unwrap_or(0);
    assert_eq!(pending.iter().sum::<usize>(), 9);
    assert!(max - min <= 1, "uneven spread: {pending:?}");

    gate.add_permits(9);
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    let dispatched: Vec<_> = set.stats().iter().map(|s| s.dispatched).collect();
    assert_eq!(dispatched, vec![3, 3, 3]);
}

#[tokio::test]
async fn pool_set_refuses_work_after_shutdown() {
    let set = PoolSet::start(OperationClass::Search, &PoolConfig::new().pools(2)).unwrap();
    set.shutdown().await;
    let err = set.submit(async { Ok::<_, HuginnError>(1) }).await.unwrap_err();
    assert_eq!(err, HuginnError::ShuttingDown);
}
