//! Public types for the Huginn API.

mod cached;
mod format;
mod operation;
mod search;
mod stats;
mod stream;

pub use cached::Cached;
pub use format::{format_duration, format_view_count};
pub use operation::OperationClass;
pub use search::SearchItem;
pub use stats::{CacheStatsReport, ServiceStats};
pub use stream::{AudioStream, StreamType, VideoStream};
