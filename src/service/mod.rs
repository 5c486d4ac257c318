//! The lookup service and its builder.

mod builder;
mod lookup;

pub use builder::{Huginn, HuginnBuilder};
pub use lookup::LookupService;

/// Bounds on search requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Largest `limit` a caller may ask for. Default: 100.
    pub max_search_limit: usize,
    /// Results fetched when the caller gives no limit. Default: 50.
    pub default_fetch_count: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_search_limit: 100,
            default_fetch_count: 50,
        }
    }
}
