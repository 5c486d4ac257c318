//! Configuration loading for huginnd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.huginn/config.toml` (user)
//! 3. `/etc/huginn/config.toml` (system)
//! 4. Built-in defaults
//!
//! Every field is optional; missing sections fall back to their defaults.

use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::extractor::{DEFAULT_USER_AGENT, YtDlpConfig};
use crate::pool::PoolConfig;
use crate::service::{Huginn, HuginnBuilder};
use crate::{HuginnError, Result};

/// Daemon configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub pools: PoolsSection,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8000).
    #[serde(default = "default_address")]
    pub address: String,
    /// Log filter used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            log_level: default_log_level(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[cache]`: sweep interval plus one table per operation class.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Seconds between background purges of expired entries; 0 disables
    /// the sweeper (default: 300).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "CacheTable::search", deserialize_with = "search_table")]
    pub search: CacheTable,
    #[serde(default = "CacheTable::audio", deserialize_with = "audio_table")]
    pub audio: CacheTable,
    #[serde(default = "CacheTable::video", deserialize_with = "video_table")]
    pub video: CacheTable,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            search: CacheTable::search(),
            audio: CacheTable::audio(),
            video: CacheTable::video(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    300
}

/// `[cache.<class>]`.
///
/// Fields left out of a table keep that class's defaults (search 1,000 /
/// 30 min, audio 500 / 60 min, video 300 / 60 min).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTable {
    pub max_entries: usize,
    pub ttl_secs: u64,
}

/// A `[cache.<class>]` table as written, before class defaults fill the gaps.
#[derive(Debug, Deserialize)]
struct CacheTableOverrides {
    max_entries: Option<usize>,
    ttl_secs: Option<u64>,
}

impl CacheTableOverrides {
    fn over(self, defaults: CacheTable) -> CacheTable {
        CacheTable {
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            ttl_secs: self.ttl_secs.unwrap_or(defaults.ttl_secs),
        }
    }
}

fn search_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<CacheTable, D::Error> {
    CacheTableOverrides::deserialize(d).map(|o| o.over(CacheTable::search()))
}

fn audio_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<CacheTable, D::Error> {
    CacheTableOverrides::deserialize(d).map(|o| o.over(CacheTable::audio()))
}

fn video_table<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<CacheTable, D::Error> {
    CacheTableOverrides::deserialize(d).map(|o| o.over(CacheTable::video()))
}

impl CacheTable {
    fn from_config(config: CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            ttl_secs: config.ttl.as_secs(),
        }
    }

    fn search() -> Self {
        Self::from_config(CacheConfig::search_defaults())
    }

    fn audio() -> Self {
        Self::from_config(CacheConfig::audio_defaults())
    }

    fn video() -> Self {
        Self::from_config(CacheConfig::video_defaults())
    }

    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.max_entries)
            .ttl(Duration::from_secs(self.ttl_secs))
    }
}

/// `[pools]`: one table per operation class.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolsSection {
    #[serde(default)]
    pub search: PoolTable,
    #[serde(default)]
    pub audio: PoolTable,
    #[serde(default)]
    pub video: PoolTable,
}

/// `[pools.<class>]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolTable {
    /// Number of pools (default: 3).
    #[serde(default = "default_pools")]
    pub pools: usize,
    /// Workers per pool (default: 4).
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Queue length per pool (default: 64).
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

impl Default for PoolTable {
    fn default() -> Self {
        Self {
            pools: default_pools(),
            workers: default_workers(),
            queue_depth: default_queue_depth(),
        }
    }
}

fn default_pools() -> usize {
    PoolConfig::default().pools
}

fn default_workers() -> usize {
    PoolConfig::default().workers
}

fn default_queue_depth() -> usize {
    PoolConfig::default().queue_depth
}

impl PoolTable {
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .pools(self.pools)
            .workers(self.workers)
            .queue_depth(self.queue_depth)
    }
}

/// `[extractor]`: how to run yt-dlp.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Program to run (default: "yt-dlp").
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Per-call timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Network socket timeout passed to yt-dlp, in seconds (default: 15).
    #[serde(default = "default_socket_timeout")]
    pub socket_timeout_secs: u64,
    /// Retries passed to yt-dlp (default: 1).
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Extra arguments appended to every invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_timeout(),
            socket_timeout_secs: default_socket_timeout(),
            retries: default_retries(),
            user_agent: default_user_agent(),
            extra_args: Vec::new(),
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    30
}

fn default_socket_timeout() -> u64 {
    15
}

fn default_retries() -> u32 {
    1
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ExtractorConfig {
    pub fn to_yt_dlp_config(&self) -> YtDlpConfig {
        YtDlpConfig::new()
            .binary(self.binary.clone())
            .timeout(Duration::from_secs(self.timeout_secs))
            .socket_timeout(Duration::from_secs(self.socket_timeout_secs))
            .retries(self.retries)
            .user_agent(self.user_agent.clone())
            .extra_args(self.extra_args.clone())
    }
}

/// `[limits]`: search request bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted `limit` (default: 100).
    #[serde(default = "default_max_search_limit")]
    pub max_search_limit: usize,
    /// Results fetched when no `limit` is given (default: 50).
    #[serde(default = "default_fetch_count")]
    pub default_fetch_count: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_search_limit: default_max_search_limit(),
            default_fetch_count: default_fetch_count(),
        }
    }
}

fn default_max_search_limit() -> usize {
    100
}

fn default_fetch_count() -> usize {
    50
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.huginn/config.toml`
    /// 3. `/etc/huginn/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` means use defaults.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(HuginnError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".huginn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/huginn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// A service builder carrying every setting from this configuration.
    pub fn builder(&self) -> HuginnBuilder {
        let builder = Huginn::builder()
            .yt_dlp(self.extractor.to_yt_dlp_config())
            .search_cache(self.cache.search.to_cache_config())
            .audio_cache(self.cache.audio.to_cache_config())
            .video_cache(self.cache.video.to_cache_config())
            .search_pools(self.pools.search.to_pool_config())
            .audio_pools(self.pools.audio.to_pool_config())
            .video_pools(self.pools.video.to_pool_config())
            .max_search_limit(self.limits.max_search_limit)
            .default_fetch_count(self.limits.default_fetch_count);

        match self.cache.sweep_interval_secs {
            0 => builder.disable_sweeper(),
            secs => builder.sweep_interval(Duration::from_secs(secs)),
        }
    }
}
