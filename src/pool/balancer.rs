use super::WorkerPool;

/// Pick the pool with the fewest accepted-but-unfinished tasks.
///
/// Ties go to the earliest pool. The load is read without holding any lock
/// across selection and submission, so two concurrent callers may pick the
/// same pool; the spread still stays within one task under even load.
pub fn select_least_loaded(pools: &[WorkerPool]) -> Option<&WorkerPool> {
    pools.iter().min_by_key(|pool| pool.pending())
}
