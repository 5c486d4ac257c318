//! Bounded key/value store with sliding expiry.
//!
//! Every entry remembers when it was last read. Reads older than the TTL
//! count as misses and drop the entry. Inserts sweep expired entries first
//! and, when the cache is still full, evict the least recently read fifth
//! of it in one pass, so a burst of inserts into a full cache does not pay
//! for an eviction scan on every call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use super::CacheConfig;
use crate::telemetry;
use crate::{HuginnError, Result};

/// Fraction of a full cache evicted in one pass, as a divisor.
const EVICTION_DIVISOR: usize = 5;

struct Entry<V> {
    value: V,
    last_access: Instant,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    hits: u64,
    requests: u64,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub requests: u64,
    /// `hits / requests`, 0.0 before the first read.
    pub hit_ratio: f64,
}

/// Thread-safe expiring cache.
///
/// All operations take one short-lived lock; values are cloned out so
/// callers never hold references into the map.
pub struct ExpiringCache<V> {
    name: &'static str,
    max_entries: usize,
    ttl: Duration,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> ExpiringCache<V> {
    /// Create an empty cache. `name` labels logs and metrics.
    ///
    /// Fails with [`HuginnError::Configuration`] if `max_entries` is zero.
    pub fn new(name: &'static str, config: &CacheConfig) -> Result<Self> {
        if config.max_entries == 0 {
            return Err(HuginnError::Configuration(format!(
                "{name} cache: max_entries must be at least 1"
            )));
        }
        Ok(Self {
            name,
            max_entries: config.max_entries,
            ttl: config.ttl,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                requests: 0,
            }),
        })
    }

    /// Look up a value, refreshing its last-access time on a hit.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.lock();
        inner.requests += 1;

        match inner.entries.get_mut(key) {
            None => return None,
            Some(entry) if !is_expired(entry.last_access, now, self.ttl) => {
                entry.last_access = now;
                let value = entry.value.clone();
                inner.hits += 1;
                return Some(value);
            }
            Some(_) => {}
        }

        inner.entries.remove(key);
        debug!(cache = self.name, key, "dropped expired entry on read");
        None
    }

    /// Insert or overwrite a value.
    ///
    /// Sweeps expired entries, then evicts the oldest fifth (at least one
    /// entry) if the cache is still at capacity, overwrites included.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = Instant::now();
        let mut inner = self.lock();

        let swept = sweep(&mut inner.entries, now, self.ttl);
        if swept > 0 {
            debug!(cache = self.name, swept, "swept expired entries");
        }

        if inner.entries.len() >= self.max_entries {
            let evicted = evict_oldest(&mut inner.entries, EVICTION_DIVISOR);
            metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "operation" => self.name)
                .increment(evicted as u64);
            debug!(cache = self.name, evicted, "evicted least recently used entries");
        }

        inner.entries.insert(
            key,
            Entry {
                value,
                last_access: now,
            },
        );
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        sweep(&mut inner.entries, now, self.ttl)
    }

    /// Remove all entries. Hit counters are kept.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of entries currently stored, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let hit_ratio = if inner.requests == 0 {
            0.0
        } else {
            inner.hits as f64 / inner.requests as f64
        };
        CacheStats {
            size: inner.entries.len(),
            max_size: self.max_entries,
            hits: inner.hits,
            requests: inner.requests,
            hit_ratio,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_expired(last_access: Instant, now: Instant, ttl: Duration) -> bool {
    ttl.is_zero() || now.saturating_duration_since(last_access) > ttl
}

fn sweep<V>(entries: &mut HashMap<String, Entry<V>>, now: Instant, ttl: Duration) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !is_expired(entry.last_access, now, ttl));
    before - entries.len()
}

fn evict_oldest<V>(entries: &mut HashMap<String, Entry<V>>, divisor: usize) -> usize {
    let count = (entries.len() / divisor).max(1);
    let mut by_age: Vec<(Instant, String)> = entries
        .iter()
        .map(|(key, entry)| (entry.last_access, key.clone()))
        .collect();
    by_age.sort_unstable_by_key(|(last_access, _)| *last_access);
    for (_, key) in by_age.into_iter().take(count) {
        entries.remove(&key);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_entries: usize, ttl_secs: u64) -> ExpiringCache<u32> {
        let config = CacheConfig::new()
            .max_entries(max_entries)
            .ttl(Duration::from_secs(ttl_secs));
        ExpiringCache::new("test", &config).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = CacheConfig::new().max_entries(0);
        let err = ExpiringCache::<u32>::new("test", &config).err().unwrap();
        assert!(matches!(err, HuginnError::Configuration(_)));
    }

    #[test]
    fn zero_ttl_is_always_stale() {
        let cache = cache(10, 0);
        cache.set("a", 1);
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_before_any_read() {
        let cache = cache(10, 60);
        let stats = cache.stats();
        assert_eq!(stats.requests, 0);
        assert_eq!(stats.hit_ratio, 0.0);
        assert_eq!(stats.max_size, 10);
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let cache = cache(10, 60);
        cache.set("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.hit_ratio, 0.5);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn full_cache_evicts_at_least_one() {
        let cache = cache(2, 60);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("c", 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = cache(10, 60);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
