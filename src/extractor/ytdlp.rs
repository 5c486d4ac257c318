//! [`Extractor`] backed by the `yt-dlp` command-line program.
//!
//! Each call spawns one `yt-dlp --dump-single-json` process, waits for it
//! under a timeout and parses its stdout. The child is killed if the call is
//! dropped or times out. Non-zero exits are classified from yt-dlp's error
//! line via [`HuginnError::from_extractor_message`].

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::raw::RawInfo;
use super::strategy::{AUDIO_STRATEGIES, Strategy, VIDEO_STRATEGIES, run_chain};
use super::{Extractor, convert, validate_item_id};
use crate::types::{AudioStream, SearchItem, VideoStream};
use crate::{HuginnError, Result};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const BROWSER_HEADERS: &[&str] = &[
    "Accept:text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "Accept-Language:en-US,en;q=0.9",
    "Sec-Fetch-Mode:navigate",
    "DNT:1",
];

/// How to run `yt-dlp`.
///
/// ```rust
/// # use huginn::YtDlpConfig;
/// # use std::time::Duration;
/// let config = YtDlpConfig::new()
///     .binary("/usr/local/bin/yt-dlp")
///     .timeout(Duration::from_secs(45));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YtDlpConfig {
    /// Program to run. Default: `yt-dlp` from `PATH`.
    pub binary: PathBuf,
    /// Wall-clock limit for one process. Default: 30 seconds.
    pub timeout: Duration,
    /// Passed as `--socket-timeout`. Default: 15 seconds.
    pub socket_timeout: Duration,
    /// Passed as `--retries`. Default: 1.
    pub retries: u32,
    pub user_agent: String,
    /// Appended before the target URL, e.g. `["--cookies", "/path"]`.
    pub extra_args: Vec<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            timeout: Duration::from_secs(30),
            socket_timeout: Duration::from_secs(15),
            retries: 1,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            extra_args: Vec::new(),
        }
    }
}

impl YtDlpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// What a single yt-dlp invocation should fetch.
enum Request<'a> {
    Search { query: &'a str, fetch_count: usize },
    Item { format: &'a str, url: String },
}

pub struct YtDlpExtractor {
    config: YtDlpConfig,
}

impl YtDlpExtractor {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    fn build_args(&self, request: &Request<'_>) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--dump-single-json".into(),
            "--no-warnings".into(),
            "--quiet".into(),
            "--socket-timeout".into(),
            self.config.socket_timeout.as_secs().max(1).to_string(),
            "--retries".into(),
            self.config.retries.to_string(),
            "--user-agent".into(),
            self.config.user_agent.clone(),
        ];
        for header in BROWSER_HEADERS {
            args.push("--add-header".into());
            args.push((*header).into());
        }

        let target = match request {
            Request::Search { query, fetch_count } => {
                args.push("--flat-playlist".into());
                format!("ytsearch{fetch_count}:{query}")
            }
            Request::Item { format, url } => {
                args.push("--no-playlist".into());
                args.push("-f".into());
                args.push((*format).into());
                url.clone()
            }
        };

        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".into());
        args.push(target);
        args
    }

    async fn run(&self, request: Request<'_>) -> Result<RawInfo> {
        let args = self.build_args(&request);
        let mut command = Command::new(&self.config.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.config.timeout, command.output()).await {
            Err(_) => {
                return Err(HuginnError::Extraction(format!(
                    "yt-dlp timed out after {}s",
                    self.config.timeout.as_secs()
                )));
            }
            Ok(Err(err)) => {
                return Err(HuginnError::Configuration(format!(
                    "failed to run {}: {err}",
                    self.config.binary.display()
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = error_line(&stderr)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(HuginnError::from_extractor_message(message));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn item(&self, strategy: Strategy, item_id: &str) -> Result<RawInfo> {
        debug!(strategy = strategy.name, item_id, "running yt-dlp");
        self.run(Request::Item {
            format: strategy.format,
            url: strategy.target.url(item_id),
        })
        .await
    }
}

/// The most informative line of yt-dlp's stderr: the first `ERROR:` line,
/// else the last non-empty one.
fn error_line(stderr: &str) -> Option<&str> {
    let lines = stderr.lines().map(str::trim).filter(|line| !line.is_empty());
    lines
        .clone()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self), fields(extractor = "yt-dlp"))]
    async fn search(&self, query: &str, fetch_count: usize) -> Result<Vec<SearchItem>> {
        let raw = self.run(Request::Search { query, fetch_count }).await?;
        Ok(convert::search_items(raw, fetch_count))
    }

    #[instrument(skip(self), fields(extractor = "yt-dlp"))]
    async fn audio_stream(&self, item_id: &str) -> Result<AudioStream> {
        validate_item_id(item_id)?;
        run_chain("audio", AUDIO_STRATEGIES, |strategy| async move {
            let raw = self.item(strategy, item_id).await?;
            convert::audio_stream(raw, item_id)
        })
        .await
    }

    #[instrument(skip(self), fields(extractor = "yt-dlp"))]
    async fn video_stream(&self, item_id: &str) -> Result<VideoStream> {
        validate_item_id(item_id)?;
        run_chain("video", VIDEO_STRATEGIES, |strategy| async move {
            let raw = self.item(strategy, item_id).await?;
            convert::video_stream(raw, item_id)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_args_use_flat_playlist_and_ytsearch() {
        let extractor = YtDlpExtractor::new(YtDlpConfig::new().retries(2));
        assert_eq!(extractor.config().retries, 2);
        let args = extractor.build_args(&Request::Search {
            query: "-rf song",
            fetch_count: 5,
        });
        assert!(args.contains(&"--flat-playlist".to_owned()));
        assert!(!args.contains(&"-f".to_owned()));
        let retries = args.iter().position(|a| a == "--retries").unwrap();
        assert_eq!(args[retries + 1], "2");
        assert_eq!(args[args.len() - 2], "--");
        assert_eq!(args[args.len() - 1], "ytsearch5:-rf song");
    }

    #[test]
    fn item_args_carry_format_and_extra_args() {
        let extractor = YtDlpExtractor::new(
            YtDlpConfig::new().extra_args(vec!["--cookies".into(), "/tmp/c.txt".into()]),
        );
        let args = extractor.build_args(&Request::Item {
            format: "bestaudio",
            url: "https://www.youtube.com/watch?v=abc".into(),
        });
        let format = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[format + 1], "bestaudio");
        assert!(args.contains(&"--no-playlist".to_owned()));
        let cookies = args.iter().position(|a| a == "--cookies").unwrap();
        assert!(cookies < args.len() - 2);
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn error_line_prefers_error_prefix() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Video unavailable\n\ntrailer\n";
        assert_eq!(
            error_line(stderr),
            Some("ERROR: [youtube] abc: Video unavailable")
        );
    }

    #[test]
    fn error_line_falls_back_to_last_line() {
        assert_eq!(error_line("first\nlast\n\n"), Some("last"));
        assert_eq!(error_line("   \n"), None);
    }

    #[tokio::test]
    async fn missing_binary_is_configuration_error() {
        let extractor =
            YtDlpExtractor::new(YtDlpConfig::new().binary("/nonexistent/huginn-yt-dlp"));
        let err = extractor.search("song", 1).await.unwrap_err();
        assert!(matches!(err, HuginnError::Configuration(_)));
    }

    #[tokio::test]
    async fn invalid_item_id_is_rejected_before_spawning() {
        let extractor = YtDlpExtractor::new(YtDlpConfig::new());
        let err = extractor.audio_stream("--exec=rm").await.unwrap_err();
        assert!(matches!(err, HuginnError::InvalidArgument(_)));
    }
}
