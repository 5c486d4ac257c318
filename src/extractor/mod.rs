//! Extraction backends.
//!
//! [`Extractor`] is the seam between the lookup service and whatever
//! actually talks to the video platform. [`YtDlpExtractor`] drives the
//! `yt-dlp` program; tests and embedders can plug in their own.
//!
//! Audio and video resolution try several [`Strategy`]s in order (see
//! [`strategy`]), so one throttled or format-less response does not fail
//! the lookup.

mod convert;
mod raw;
pub mod strategy;
mod traits;
mod ytdlp;

pub use strategy::{AUDIO_STRATEGIES, Strategy, Target, VIDEO_STRATEGIES};
pub use traits::Extractor;
pub use ytdlp::{DEFAULT_USER_AGENT, YtDlpConfig, YtDlpExtractor};

use crate::{HuginnError, Result};

const ITEM_ID_MAX_LEN: usize = 64;

/// Check that `item_id` looks like a platform item id: 1 to 64 characters
/// of `[A-Za-z0-9_-]`.
///
/// Ids end up in URLs and on the extractor's command line, so anything
/// else is rejected up front.
pub fn validate_item_id(item_id: &str) -> Result<()> {
    let valid = !item_id.is_empty()
        && item_id.len() <= ITEM_ID_MAX_LEN
        && item_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(HuginnError::InvalidArgument(format!(
            "invalid item id {item_id:?}: expected 1-{ITEM_ID_MAX_LEN} characters of [A-Za-z0-9_-]"
        )))
    }
}
