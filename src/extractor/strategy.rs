//! Extraction strategies and the sequential fallback chain.
//!
//! Upstream throttling and format availability vary per request, so audio
//! and video lookups try a short list of format selectors / target URLs in
//! order. A terminal verdict (not found, private, copyright) ends the chain
//! at once since no other strategy can change it; anything else falls
//! through to the next strategy.

use std::future::Future;

use tracing::{debug, warn};

use super::convert::{music_watch_url, watch_url};
use crate::telemetry;
use crate::{HuginnError, Result};

/// Which page an extraction strategy points the extractor at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The regular watch page.
    Watch,
    /// The music site's watch page, served by different backends.
    MusicWatch,
}

impl Target {
    pub fn url(self, item_id: &str) -> String {
        match self {
            Target::Watch => watch_url(item_id),
            Target::MusicWatch => music_watch_url(item_id),
        }
    }
}

/// One way of asking the extractor for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    /// Short name for logs and metric labels.
    pub name: &'static str,
    /// Format selector passed to `-f`.
    pub format: &'static str,
    pub target: Target,
}

const BEST_AUDIO_FORMAT: &str = "bestaudio[ext=webm]/bestaudio[ext=m4a]/bestaudio";

pub const AUDIO_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "bestaudio",
        format: BEST_AUDIO_FORMAT,
        target: Target::Watch,
    },
    Strategy {
        name: "permissive",
        format: "bestaudio[acodec^=mp4a]/bestaudio/best[acodec!=none]/best",
        target: Target::Watch,
    },
    Strategy {
        name: "music",
        format: BEST_AUDIO_FORMAT,
        target: Target::MusicWatch,
    },
];

pub const VIDEO_STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "best-split",
        format: concat!(
            "bestvideo[height>=2160][ext=mp4]+bestaudio[ext=m4a]/",
            "bestvideo[height>=1440][ext=mp4]+bestaudio[ext=m4a]/",
            "bestvideo[height>=1080][ext=mp4]+bestaudio[ext=m4a]/",
            "bestvideo[height>=720][ext=mp4]+bestaudio[ext=m4a]/",
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/",
            "bestvideo+bestaudio[ext=m4a]/",
            "bestvideo+bestaudio/",
            "best[ext=mp4][height>=1080]/",
            "best[ext=mp4][height>=720]/",
            "best[ext=mp4]/",
            "best[height>=720]/",
            "best"
        ),
        target: Target::Watch,
    },
    Strategy {
        name: "single-file",
        format: "best[ext=mp4]/best",
        target: Target::Watch,
    },
];

/// Run `attempt` for each strategy until one succeeds.
///
/// Stops at the first terminal error. When every strategy fails, returns
/// the first anti-abuse error seen (so callers get a retry hint), the sole
/// error if there was only one, or an [`HuginnError::Extraction`] listing
/// each strategy's failure.
pub async fn run_chain<T, F, Fut>(
    operation: &'static str,
    strategies: &[Strategy],
    mut attempt: F,
) -> Result<T>
where
    F: FnMut(Strategy) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures: Vec<(&'static str, HuginnError)> = Vec::new();

    for &strategy in strategies {
        match attempt(strategy).await {
            Ok(value) => {
                record_attempt(operation, strategy.name, "ok");
                if !failures.is_empty() {
                    debug!(operation, strategy = strategy.name, "fallback strategy succeeded");
                }
                return Ok(value);
            }
            Err(e) if e.is_terminal() => {
                record_attempt(operation, strategy.name, e.kind());
                debug!(operation, strategy = strategy.name, error = %e, "terminal extraction error");
                return Err(e);
            }
            Err(e) => {
                record_attempt(operation, strategy.name, e.kind());
                warn!(
                    operation,
                    strategy = strategy.name,
                    error = %e,
                    "extraction strategy failed, trying next"
                );
                failures.push((strategy.name, e));
            }
        }
    }

    Err(aggregate(failures))
}

fn aggregate(mut failures: Vec<(&'static str, HuginnError)>) -> HuginnError {
    if let Some(index) = failures.iter().position(|(_, e)| e.is_transient()) {
        return failures.swap_remove(index).1;
    }
    match failures.len() {
        0 => HuginnError::Internal("no extraction strategies configured".to_owned()),
        1 => failures.remove(0).1,
        _ => HuginnError::Extraction(format!(
            "all strategies failed: {}",
            failures
                .iter()
                .map(|(name, e)| format!("{name}: {e}"))
                .collect::<Vec<_>>()
                .join("; ")
        )),
    }
}

fn record_attempt(operation: &'static str, strategy: &'static str, status: &'static str) {
    metrics::counter!(
        telemetry::EXTRACTIONS_TOTAL,
        "operation" => operation,
        "strategy" => strategy,
        "status" => status
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_build_expected_urls() {
        assert_eq!(
            Target::Watch.url("abc123"),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(
            Target::MusicWatch.url("abc123"),
            "https://music.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn audio_chain_ends_on_music_site() {
        let last = AUDIO_STRATEGIES.last().unwrap();
        assert_eq!(last.target, Target::MusicWatch);
    }

    #[test]
    fn aggregate_prefers_transient_error() {
        let err = aggregate(vec![
            ("a", HuginnError::Extraction("boom".into())),
            ("b", HuginnError::RateLimited { retry_after: None }),
        ]);
        assert!(err.is_transient());
    }

    #[test]
    fn aggregate_lists_every_failure() {
        let err = aggregate(vec![
            ("a", HuginnError::Extraction("first".into())),
            ("b", HuginnError::Json("second".into())),
        ]);
        let HuginnError::Extraction(message) = err else {
            panic!("expected Extraction, got {err:?}");
        };
        assert!(message.contains("a: extraction failed: first"));
        assert!(message.contains("b: malformed extractor output: second"));
    }

    #[test]
    fn aggregate_single_failure_is_returned_as_is() {
        let err = aggregate(vec![("a", HuginnError::Json("bad".into()))]);
        assert_eq!(err, HuginnError::Json("bad".into()));
    }
}
