//! Caching subsystem.
//!
//! [`ExpiringCache`] is a bounded, sliding-TTL map. The lookup service owns
//! one per operation class (search, audio, video), each sized by its own
//! [`CacheConfig`]. Keys come from [`cache_key`] so the three classes never
//! collide even if they ever shared a map.

mod expiring;
mod key;

pub use expiring::{CacheStats, ExpiringCache};
pub use key::cache_key;

use std::time::Duration;

/// Configuration for one expiring cache.
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(500)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,000.
    pub max_entries: usize,
    /// Idle time after which an entry expires. Default: 30 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with the search-cache defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the idle time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Defaults for the search-results cache: 1,000 entries, 30 minutes.
    pub fn search_defaults() -> Self {
        Self::default()
    }

    /// Defaults for the audio stream cache: 500 entries, 60 minutes.
    pub fn audio_defaults() -> Self {
        Self::new().max_entries(500).ttl(Duration::from_secs(60 * 60))
    }

    /// Defaults for the video stream cache: 300 entries, 60 minutes.
    pub fn video_defaults() -> Self {
        Self::new().max_entries(300).ttl(Duration::from_secs(60 * 60))
    }
}
