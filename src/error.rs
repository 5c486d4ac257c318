//! Huginn error types

use std::time::Duration;

/// Back-off suggested to callers when upstream blocks us without saying for how long.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Huginn error types.
///
/// `Clone` so a single failed extraction can be handed to every caller
/// waiting on the same in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HuginnError {
    // Caller errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Terminal upstream verdicts
    #[error("not found: {0}")]
    NotFound(String),

    #[error("private: {0}")]
    Private(String),

    #[error("copyright restricted: {0}")]
    CopyrightRestricted(String),

    // Upstream anti-abuse signals
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("temporarily blocked by upstream: {message}")]
    TemporarilyBlocked {
        message: String,
        retry_after: Option<Duration>,
    },

    // Generic upstream failure
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("malformed extractor output: {0}")]
    Json(String),

    // Service errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("service is shutting down")]
    ShuttingDown,

    #[error("internal error: {0}")]
    Internal(String),
}

impl HuginnError {
    /// Classify a raw extractor failure message into the error taxonomy.
    ///
    /// The extractor reports failures as free text, so this is keyword
    /// matching, most specific first.
    pub fn from_extractor_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("not a bot") || lower.contains("sign in") {
            HuginnError::TemporarilyBlocked {
                message,
                retry_after: None,
            }
        } else if lower.contains("429") || lower.contains("too many requests") {
            HuginnError::RateLimited { retry_after: None }
        } else if lower.contains("private") {
            HuginnError::Private(message)
        } else if lower.contains("copyright") {
            HuginnError::CopyrightRestricted(message)
        } else if lower.contains("unavailable")
            || lower.contains("not found")
            || lower.contains("removed")
        {
            HuginnError::NotFound(message)
        } else {
            HuginnError::Extraction(message)
        }
    }

    /// Upstream says the item is permanently unusable; trying another
    /// extraction strategy will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HuginnError::NotFound(_)
                | HuginnError::Private(_)
                | HuginnError::CopyrightRestricted(_)
                | HuginnError::InvalidArgument(_)
        )
    }

    /// Upstream anti-abuse signal. The caller may retry after [`retry_after()`](Self::retry_after).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HuginnError::RateLimited { .. } | HuginnError::TemporarilyBlocked { .. }
        )
    }

    /// Suggested back-off for transient errors, `None` for everything else.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HuginnError::RateLimited { retry_after }
            | HuginnError::TemporarilyBlocked { retry_after, .. } => {
                Some(retry_after.unwrap_or(DEFAULT_RETRY_AFTER))
            }
            _ => None,
        }
    }

    /// Stable snake_case name of the variant, used in API error bodies and
    /// metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            HuginnError::InvalidArgument(_) => "invalid_argument",
            HuginnError::NotFound(_) => "not_found",
            HuginnError::Private(_) => "private",
            HuginnError::CopyrightRestricted(_) => "copyright_restricted",
            HuginnError::RateLimited { .. } => "rate_limited",
            HuginnError::TemporarilyBlocked { .. } => "temporarily_blocked",
            HuginnError::Extraction(_) => "extraction_failed",
            HuginnError::Json(_) => "malformed_output",
            HuginnError::Configuration(_) => "configuration",
            HuginnError::ShuttingDown => "shutting_down",
            HuginnError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for HuginnError {
    fn from(err: serde_json::Error) -> Self {
        HuginnError::Json(err.to_string())
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, HuginnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_bot_check_as_blocked() {
        let err = HuginnError::from_extractor_message(
            "ERROR: Sign in to confirm you're not a bot",
        );
        assert!(matches!(err, HuginnError::TemporarilyBlocked { .. }));
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), Some(DEFAULT_RETRY_AFTER));
    }

    #[test]
    fn words_containing_bot_are_not_a_bot_check() {
        let err = HuginnError::from_extractor_message(
            "ERROR: [youtube] robot_dance: Video unavailable",
        );
        assert!(matches!(err, HuginnError::NotFound(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn classifies_http_429_as_rate_limited() {
        let err = HuginnError::from_extractor_message("HTTP Error 429: Too Many Requests");
        assert_eq!(err, HuginnError::RateLimited { retry_after: None });
    }

    #[test]
    fn classifies_private_video() {
        let err = HuginnError::from_extractor_message("ERROR: [youtube] xyz: Video is private");
        assert!(matches!(err, HuginnError::Private(_)));
        assert!(err.is_terminal());
    }

    #[test]
    fn classifies_copyright_claim() {
        let err = HuginnError::from_extractor_message(
            "This video contains content blocked on copyright grounds",
        );
        assert!(matches!(err, HuginnError::CopyrightRestricted(_)));
    }

    #[test]
    fn classifies_unavailable_as_not_found() {
        let err = HuginnError::from_extractor_message("Video unavailable");
        assert!(matches!(err, HuginnError::NotFound(_)));
    }

    #[test]
    fn unknown_message_is_generic_extraction_failure() {
        let err = HuginnError::from_extractor_message("something odd happened");
        assert_eq!(err, HuginnError::Extraction("something odd happened".into()));
        assert!(!err.is_terminal());
        assert!(!err.is_transient());
        assert_eq!(err.retry_after(), None);
    }

    #[test]
    fn explicit_retry_after_wins() {
        let err = HuginnError::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    }
}
