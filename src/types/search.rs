use serde::{Deserialize, Serialize};

/// One playable result from a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    /// Trimmed, at most 100 characters.
    pub title: String,
    pub thumbnail_url: String,
    pub item_id: String,
    /// Trimmed, at most 50 characters; "Unknown" when upstream has none.
    pub uploader: String,
    /// `M:SS` or `H:MM:SS`.
    pub duration_formatted: String,
    /// e.g. `1.2M views`.
    pub view_count_formatted: String,
    pub url: String,
}
