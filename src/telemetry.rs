//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Embedders install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `operation`: lookup class: "search", "audio" or "video"
//! - `status`: outcome: "ok" or the error kind (e.g. "private", "rate_limited")
//! - `strategy`: extraction strategy name (e.g. "bestaudio", "music")
//! - `pool`: worker pool index within its class

/// Total lookups served by the service, cache hits included.
///
/// Labels: `operation`, `status` ("ok" | error kind).
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Lookup duration in seconds, measured from entry to response.
///
/// Labels: `operation`.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Total cache hits.
///
/// Labels: `operation`.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total cache misses.
///
/// Labels: `operation`.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total cache entries evicted for capacity (expiry sweeps not counted).
///
/// Labels: `operation`.
pub const CACHE_EVICTIONS_TOTAL: &str = "huginn_cache_evictions_total";

/// Total callers that attached to an already running extraction instead of
/// starting their own.
///
/// Labels: `operation`.
pub const DEDUP_JOINS_TOTAL: &str = "huginn_dedup_joins_total";

/// Total extraction attempts, one per strategy tried.
///
/// Labels: `operation`, `strategy`, `status`.
pub const EXTRACTIONS_TOTAL: &str = "huginn_extractions_total";

/// Tasks dispatched to worker pools.
///
/// Labels: `operation`, `pool`.
pub const POOL_DISPATCHED_TOTAL: &str = "huginn_pool_dispatched_total";
