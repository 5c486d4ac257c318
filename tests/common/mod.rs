//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use huginn::{AudioStream, Extractor, HuginnError, Result, SearchItem, StreamType, VideoStream};

/// Extractor that fabricates results and counts how often it is called.
///
/// Failures can be scripted per item id with [`MockExtractor::fail_with`].
#[derive(Default)]
pub struct MockExtractor {
    pub search_calls: AtomicU32,
    pub audio_calls: AtomicU32,
    pub video_calls: AtomicU32,
    pub last_fetch_count: AtomicUsize,
    delay: Duration,
    failures: Mutex<HashMap<String, HuginnError>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail_with(&self, item_id: &str, err: HuginnError) {
        self.failures
            .lock()
            .unwrap()
            .insert(item_id.to_owned(), err);
    }

    pub fn recover(&self, item_id: &str) {
        self.failures.lock().unwrap().remove(item_id);
    }

    pub fn audio_calls(&self) -> u32 {
        self.audio_calls.load(Ordering::SeqCst)
    }

    pub fn video_calls(&self) -> u32 {
        self.video_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn scripted_failure(&self, item_id: &str) -> Option<HuginnError> {
        self.failures.lock().unwrap().get(item_id).cloned()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, fetch_count: usize) -> Result<Vec<SearchItem>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.last_fetch_count.store(fetch_count, Ordering::SeqCst);
        self.pause().await;
        if let Some(err) = self.scripted_failure(query) {
            return Err(err);
        }
        Ok((0..fetch_count.min(10))
            .map(|i| search_item(&format!("item_{i}"), &format!("{query} #{i}")))
            .collect())
    }

    async fn audio_stream(&self, item_id: &str) -> Result<AudioStream> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(err) = self.scripted_failure(item_id) {
            return Err(err);
        }
        Ok(AudioStream {
            stream_url: format!("https://media.example/{item_id}/audio.webm"),
            title: format!("Title of {item_id}"),
            duration_seconds: 212,
            thumbnail_url: format!("https://img.example/{item_id}.jpg"),
            format: "webm".to_owned(),
            quality: "160kbps".to_owned(),
        })
    }

    async fn video_stream(&self, item_id: &str) -> Result<VideoStream> {
        self.video_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(err) = self.scripted_failure(item_id) {
            return Err(err);
        }
        Ok(VideoStream {
            video_url: format!("https://media.example/{item_id}/video.mp4"),
            audio_url: Some(format!("https://media.example/{item_id}/audio.m4a")),
            title: format!("Title of {item_id}"),
            duration_seconds: 212,
            thumbnail_url: format!("https://img.example/{item_id}.jpg"),
            quality: "1080p".to_owned(),
            stream_type: StreamType::Separate,
        })
    }
}

pub fn search_item(item_id: &str, title: &str) -> SearchItem {
    SearchItem {
        title: title.to_owned(),
        thumbnail_url: format!("https://img.example/{item_id}.jpg"),
        item_id: item_id.to_owned(),
        uploader: "Uploader".to_owned(),
        duration_formatted: "3:32".to_owned(),
        view_count_formatted: "1.2M".to_owned(),
        url: format!("https://www.youtube.com/watch?v={item_id}"),
    }
}
