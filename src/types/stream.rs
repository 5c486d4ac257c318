use serde::{Deserialize, Serialize};

/// A directly playable audio URL for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStream {
    pub stream_url: String,
    pub title: String,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
    /// Container extension, e.g. `webm` or `m4a`.
    pub format: String,
    /// e.g. `160kbps`, or `unknown`.
    pub quality: String,
}

/// Whether video and audio come from one URL or two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    /// Video-only and audio-only URLs that the player muxes.
    Separate,
    /// One URL carrying both tracks.
    Combined,
}

/// Playable video URL(s) for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStream {
    pub video_url: String,
    /// Present only for [`StreamType::Separate`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub title: String,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
    /// e.g. `1080p60fps (2500kbps)`.
    pub quality: String,
    pub stream_type: StreamType,
}
