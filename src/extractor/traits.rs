use async_trait::async_trait;

use crate::Result;
use crate::types::{AudioStream, SearchItem, VideoStream};

/// Backend that turns queries and item ids into playable results.
///
/// Implementations do the slow, rate-limited upstream work; the lookup
/// service wraps them with caching, deduplication and worker pools.
/// Failures should be classified into the [`HuginnError`](crate::HuginnError)
/// taxonomy so callers get a meaningful status.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extractor name for logging/debugging.
    fn name(&self) -> &str;

    /// Search for up to `fetch_count` items.
    ///
    /// An empty list is a valid answer, not an error.
    async fn search(&self, query: &str, fetch_count: usize) -> Result<Vec<SearchItem>>;

    /// Resolve a directly playable audio URL for `item_id`.
    async fn audio_stream(&self, item_id: &str) -> Result<AudioStream>;

    /// Resolve playable video (and possibly separate audio) URLs for `item_id`.
    async fn video_stream(&self, item_id: &str) -> Result<VideoStream>;
}
