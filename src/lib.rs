//! Huginn - cached, deduplicated search and stream lookup
//!
//! Huginn sits in front of a slow, rate-limited media extractor and turns
//! it into a service with low tail latency and bounded resource use:
//!
//! - an [`ExpiringCache`] per operation class answers repeat lookups;
//! - a [`SingleFlightGroup`] collapses concurrent identical lookups into
//!   one extraction;
//! - a [`PoolSet`] per class caps concurrent extractions and spreads them
//!   across worker pools by load.
//!
//! The extraction itself sits behind the [`Extractor`] trait;
//! [`YtDlpExtractor`] is the bundled implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{Huginn, YtDlpConfig};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let service = Huginn::builder()
//!         .yt_dlp(YtDlpConfig::new().binary("/usr/local/bin/yt-dlp"))
//!         .build()?;
//!
//!     let results = service.search("daft punk around the world", Some(5)).await?;
//!     for item in &results.value {
//!         println!("{} ({})", item.title, item.duration_formatted);
//!     }
//!
//!     let audio = service.resolve_audio_stream(&results.value[0].item_id).await?;
//!     println!("{} cached={}", audio.value.stream_url, audio.cached);
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod pool;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheStats, ExpiringCache, cache_key};
pub use dedup::SingleFlightGroup;
pub use error::{HuginnError, Result};
pub use extractor::{Extractor, YtDlpConfig, YtDlpExtractor, validate_item_id};
pub use pool::{PoolConfig, PoolSet, PoolStats, WorkerPool, select_least_loaded};
pub use service::{Huginn, HuginnBuilder, LookupService, SearchLimits};
pub use types::{
    AudioStream, CacheStatsReport, Cached, OperationClass, SearchItem, ServiceStats, StreamType,
    VideoStream, format_duration, format_view_count,
};
pub use version::{BuildInfo, PKG_VERSION, version_string};
