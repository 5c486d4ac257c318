//! Builder for configuring lookup service instances

use std::sync::Arc;
use std::time::Duration;

use super::SearchLimits;
use super::lookup::{Caches, LookupService, Pools};
use crate::cache::{CacheConfig, ExpiringCache};
use crate::extractor::{Extractor, YtDlpConfig, YtDlpExtractor};
use crate::pool::{PoolConfig, PoolSet};
use crate::types::OperationClass;
use crate::{HuginnError, Result};

/// Default interval between background sweeps of expired cache entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Main entry point for creating lookup service instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the service.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring lookup service instances.
pub struct HuginnBuilder {
    extractor: Option<Arc<dyn Extractor>>,
    yt_dlp: YtDlpConfig,
    search_cache: CacheConfig,
    audio_cache: CacheConfig,
    video_cache: CacheConfig,
    search_pools: PoolConfig,
    audio_pools: PoolConfig,
    video_pools: PoolConfig,
    limits: SearchLimits,
    sweep_interval: Option<Duration>,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            extractor: None,
            yt_dlp: YtDlpConfig::default(),
            search_cache: CacheConfig::search_defaults(),
            audio_cache: CacheConfig::audio_defaults(),
            video_cache: CacheConfig::video_defaults(),
            search_pools: PoolConfig::default(),
            audio_pools: PoolConfig::default(),
            video_pools: PoolConfig::default(),
            limits: SearchLimits::default(),
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
        }
    }

    /// Use a custom extractor instead of yt-dlp.
    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Configure the yt-dlp extractor (ignored when [`extractor()`](Self::extractor) is set).
    pub fn yt_dlp(mut self, config: YtDlpConfig) -> Self {
        self.yt_dlp = config;
        self
    }

    /// Search results cache (default: 1,000 entries, 30 minutes).
    pub fn search_cache(mut self, config: CacheConfig) -> Self {
        self.search_cache = config;
        self
    }

    /// Audio stream cache (default: 500 entries, 60 minutes).
    pub fn audio_cache(mut self, config: CacheConfig) -> Self {
        self.audio_cache = config;
        self
    }

    /// Video stream cache (default: 300 entries, 60 minutes).
    pub fn video_cache(mut self, config: CacheConfig) -> Self {
        self.video_cache = config;
        self
    }

    pub fn search_pools(mut self, config: PoolConfig) -> Self {
        self.search_pools = config;
        self
    }

    pub fn audio_pools(mut self, config: PoolConfig) -> Self {
        self.audio_pools = config;
        self
    }

    pub fn video_pools(mut self, config: PoolConfig) -> Self {
        self.video_pools = config;
        self
    }

    /// Apply the same pool sizing to all three classes.
    pub fn pools(self, config: PoolConfig) -> Self {
        self.search_pools(config.clone())
            .audio_pools(config.clone())
            .video_pools(config)
    }

    pub fn max_search_limit(mut self, n: usize) -> Self {
        self.limits.max_search_limit = n;
        self
    }

    pub fn default_fetch_count(mut self, n: usize) -> Self {
        self.limits.default_fetch_count = n;
        self
    }

    /// How often expired cache entries are purged in the background
    /// (default: 5 minutes).
    pub fn sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = Some(every);
        self
    }

    /// Rely on lazy expiry only; no background sweeper task.
    pub fn disable_sweeper(mut self) -> Self {
        self.sweep_interval = None;
        self
    }

    /// Build the service, starting its worker pools and sweeper.
    ///
    /// # Errors
    ///
    /// [`HuginnError::Configuration`] when a cache has no capacity, a pool
    /// set has no pools/workers/queue, or the search limits are zero.
    ///
    /// # Panics
    ///
    /// Must be called within a tokio runtime; pool workers are spawned here.
    pub fn build(self) -> Result<LookupService> {
        if self.limits.max_search_limit == 0 || self.limits.default_fetch_count == 0 {
            return Err(HuginnError::Configuration(
                "max_search_limit and default_fetch_count must be at least 1".to_owned(),
            ));
        }

        let caches = Caches {
            search: Arc::new(ExpiringCache::new("search", &self.search_cache)?),
            audio: Arc::new(ExpiringCache::new("audio", &self.audio_cache)?),
            video: Arc::new(ExpiringCache::new("video", &self.video_cache)?),
        };

        let pools = Pools {
            search: Arc::new(PoolSet::start(OperationClass::Search, &self.search_pools)?),
            audio: Arc::new(PoolSet::start(OperationClass::Audio, &self.audio_pools)?),
            video: Arc::new(PoolSet::start(OperationClass::Video, &self.video_pools)?),
        };

        let extractor: Arc<dyn Extractor> = match self.extractor {
            Some(extractor) => extractor,
            None => Arc::new(YtDlpExtractor::new(self.yt_dlp)),
        };

        let service = LookupService::new(extractor, caches, pools, self.limits);
        if let Some(every) = self.sweep_interval {
            service.spawn_sweeper(every);
        }
        Ok(service)
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}
