use serde::Serialize;

use crate::cache::CacheStats;
use crate::pool::PoolStats;

/// Cache counters for every operation class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatsReport {
    pub search: CacheStats,
    pub audio: CacheStats,
    pub video: CacheStats,
}

/// Snapshot of the whole lookup service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub caches: CacheStatsReport,
    /// Extractions currently running or queued under deduplication.
    pub in_flight: usize,
    pub pools: Vec<PoolStats>,
}
