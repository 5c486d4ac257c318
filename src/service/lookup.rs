//! The lookup service: cache, deduplication and worker pools around an
//! [`Extractor`].
//!
//! Every lookup follows the same path:
//!
//! 1. derive a key from the operation name and normalized parameters;
//! 2. probe the class's cache, returning a hit tagged `cached = true`;
//! 3. on a miss, run or join the single flight for that key. The leader
//!    submits the extractor call to the least loaded pool of the class and,
//!    on success, stores the value in the cache before the flight is
//!    deregistered;
//! 4. return the value tagged `cached = false`.
//!
//! Failures are never cached and never retried here; the next call for the
//! same key starts a fresh extraction.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use super::SearchLimits;
use crate::cache::{ExpiringCache, cache_key};
use crate::dedup::SingleFlightGroup;
use crate::extractor::{Extractor, validate_item_id};
use crate::pool::PoolSet;
use crate::telemetry;
use crate::types::{
    AudioStream, CacheStatsReport, Cached, OperationClass, SearchItem, ServiceStats, VideoStream,
};
use crate::{HuginnError, Result};

/// Any value that can travel through the shared dedup keyspace.
#[derive(Debug, Clone)]
enum Extracted {
    Search(Vec<SearchItem>),
    Audio(AudioStream),
    Video(VideoStream),
}

trait FlightValue: Clone + Send + Sync + 'static {
    fn into_flight(self) -> Extracted;
    fn from_flight(flight: Extracted) -> Option<Self>;
}

impl FlightValue for Vec<SearchItem> {
    fn into_flight(self) -> Extracted {
        Extracted::Search(self)
    }

    fn from_flight(flight: Extracted) -> Option<Self> {
        match flight {
            Extracted::Search(items) => Some(items),
            _ => None,
        }
    }
}

impl FlightValue for AudioStream {
    fn into_flight(self) -> Extracted {
        Extracted::Audio(self)
    }

    fn from_flight(flight: Extracted) -> Option<Self> {
        match flight {
            Extracted::Audio(stream) => Some(stream),
            _ => None,
        }
    }
}

impl FlightValue for VideoStream {
    fn into_flight(self) -> Extracted {
        Extracted::Video(self)
    }

    fn from_flight(flight: Extracted) -> Option<Self> {
        match flight {
            Extracted::Video(stream) => Some(stream),
            _ => None,
        }
    }
}

/// One cache per operation class.
#[derive(Clone)]
pub(crate) struct Caches {
    pub search: Arc<ExpiringCache<Vec<SearchItem>>>,
    pub audio: Arc<ExpiringCache<AudioStream>>,
    pub video: Arc<ExpiringCache<VideoStream>>,
}

impl Caches {
    fn clear(&self) {
        self.search.clear();
        self.audio.clear();
        self.video.clear();
    }

    fn purge_expired(&self) -> usize {
        self.search.purge_expired() + self.audio.purge_expired() + self.video.purge_expired()
    }

    fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            search: self.search.stats(),
            audio: self.audio.stats(),
            video: self.video.stats(),
        }
    }
}

/// One pool set per operation class.
pub(crate) struct Pools {
    pub search: Arc<PoolSet>,
    pub audio: Arc<PoolSet>,
    pub video: Arc<PoolSet>,
}

impl Pools {
    fn get(&self, class: OperationClass) -> &Arc<PoolSet> {
        match class {
            OperationClass::Search => &self.search,
            OperationClass::Audio => &self.audio,
            OperationClass::Video => &self.video,
        }
    }
}

/// Caching, deduplicating front for an [`Extractor`].
///
/// Built with [`Huginn::builder()`](crate::Huginn::builder). Cheap to share
/// behind an `Arc`; every method takes `&self`.
pub struct LookupService {
    extractor: Arc<dyn Extractor>,
    caches: Caches,
    pools: Pools,
    dedup: SingleFlightGroup<Extracted>,
    limits: SearchLimits,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl LookupService {
    pub(crate) fn new(
        extractor: Arc<dyn Extractor>,
        caches: Caches,
        pools: Pools,
        limits: SearchLimits,
    ) -> Self {
        Self {
            extractor,
            caches,
            pools,
            dedup: SingleFlightGroup::new(),
            limits,
            sweeper: Mutex::new(None),
        }
    }

    /// Search for items matching `query`.
    ///
    /// The query is trimmed and must be at least two characters. `limit`
    /// must be within `1..=max_search_limit`; without it the default fetch
    /// count is used. An upstream search with no usable entries yields an
    /// empty list.
    #[instrument(skip(self), fields(operation = "search"))]
    pub async fn search(&self, query: &str, limit: Option<usize>) -> Result<Cached<Vec<SearchItem>>> {
        let start = Instant::now();
        let result = match self.normalize_search(query, limit) {
            Ok((query, fetch_count)) => {
                let key = cache_key("search", &[&query, &fetch_count.to_string()]);
                let extractor = Arc::clone(&self.extractor);
                self.lookup(OperationClass::Search, key, &self.caches.search, async move {
                    extractor.search(&query, fetch_count).await
                })
                .await
            }
            Err(e) => Err(e),
        };
        record_request(OperationClass::Search, start, &result);
        result
    }

    /// Resolve a directly playable audio URL for `item_id`.
    #[instrument(skip(self), fields(operation = "audio"))]
    pub async fn resolve_audio_stream(&self, item_id: &str) -> Result<Cached<AudioStream>> {
        let start = Instant::now();
        let result = match validate_item_id(item_id) {
            Ok(()) => {
                let key = cache_key("audio", &[item_id]);
                let extractor = Arc::clone(&self.extractor);
                let item_id = item_id.to_owned();
                self.lookup(OperationClass::Audio, key, &self.caches.audio, async move {
                    extractor.audio_stream(&item_id).await
                })
                .await
            }
            Err(e) => Err(e),
        };
        record_request(OperationClass::Audio, start, &result);
        result
    }

    /// Resolve playable video URL(s) for `item_id`.
    #[instrument(skip(self), fields(operation = "video"))]
    pub async fn resolve_video_stream(&self, item_id: &str) -> Result<Cached<VideoStream>> {
        let start = Instant::now();
        let result = match validate_item_id(item_id) {
            Ok(()) => {
                let key = cache_key("video", &[item_id]);
                let extractor = Arc::clone(&self.extractor);
                let item_id = item_id.to_owned();
                self.lookup(OperationClass::Video, key, &self.caches.video, async move {
                    extractor.video_stream(&item_id).await
                })
                .await
            }
            Err(e) => Err(e),
        };
        record_request(OperationClass::Video, start, &result);
        result
    }

    /// Drop every cached entry of every class.
    pub fn clear_cache(&self) {
        self.caches.clear();
        info!("all caches cleared");
    }

    pub fn cache_stats(&self) -> CacheStatsReport {
        self.caches.stats()
    }

    pub fn service_stats(&self) -> ServiceStats {
        ServiceStats {
            caches: self.caches.stats(),
            in_flight: self.dedup.in_flight(),
            pools: OperationClass::ALL
                .into_iter()
                .flat_map(|class| self.pools.get(class).stats())
                .collect(),
        }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    /// Purge expired cache entries every `every`, replacing any previous
    /// sweeper. A zero interval disables sweeping.
    ///
    /// # Panics
    ///
    /// Requires a tokio runtime context.
    pub fn spawn_sweeper(&self, every: Duration) {
        if every.is_zero() {
            if let Some(previous) = lock(&self.sweeper).take() {
                previous.abort();
            }
            return;
        }

        let caches = self.caches.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = caches.purge_expired();
                if purged > 0 {
                    debug!(purged, "purged expired cache entries");
                }
            }
        });

        if let Some(previous) = lock(&self.sweeper).replace(handle) {
            previous.abort();
        }
    }

    /// Stop the sweeper and shut every worker pool down, draining work
    /// already queued. Lookups after this fail with
    /// [`HuginnError::ShuttingDown`] unless served from cache.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = lock(&self.sweeper).take() {
            sweeper.abort();
        }
        for class in OperationClass::ALL {
            self.pools.get(class).shutdown().await;
        }
        info!("lookup service stopped");
    }

    fn normalize_search(&self, query: &str, limit: Option<usize>) -> Result<(String, usize)> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Err(HuginnError::InvalidArgument(
                "query must be at least 2 characters".to_owned(),
            ));
        }
        let fetch_count = match limit {
            None => self.limits.default_fetch_count,
            Some(limit) if (1..=self.limits.max_search_limit).contains(&limit) => limit,
            Some(limit) => {
                return Err(HuginnError::InvalidArgument(format!(
                    "limit {limit} out of range 1..={}",
                    self.limits.max_search_limit
                )));
            }
        };
        Ok((query.to_owned(), fetch_count))
    }

    async fn lookup<T, Fut>(
        &self,
        class: OperationClass,
        key: String,
        cache: &Arc<ExpiringCache<T>>,
        extract: Fut,
    ) -> Result<Cached<T>>
    where
        T: FlightValue,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let operation = class.as_str();
        if let Some(value) = cache.get(&key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "operation" => operation).increment(1);
            debug!(key, "cache hit");
            return Ok(Cached::hit(value));
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "operation" => operation).increment(1);
        debug!(key, "cache miss");

        let cache = Arc::clone(cache);
        let pools = Arc::clone(self.pools.get(class));
        let store_key = key.clone();
        let extracted = self
            .dedup
            .get_or_execute(&key, move || async move {
                let value = pools.submit(extract).await?;
                cache.set(store_key, value.clone());
                Ok(value.into_flight())
            })
            .await?;

        T::from_flight(extracted).map(Cached::miss).ok_or_else(|| {
            HuginnError::Internal(format!("in-flight result for {key} has the wrong type"))
        })
    }
}

impl Drop for LookupService {
    fn drop(&mut self) {
        if let Some(sweeper) = lock(&self.sweeper).take() {
            sweeper.abort();
        }
    }
}

fn record_request<T>(class: OperationClass, start: Instant, result: &Result<T>) {
    let status = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    let elapsed = start.elapsed().as_secs_f64();
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "operation" => class.as_str(),
        "status" => status,
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
        "operation" => class.as_str(),
    )
    .record(elapsed);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
