//! Subset of the yt-dlp `--dump-single-json` document that we read.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    #[serde(flatten)]
    pub format: RawFormat,
    pub requested_formats: Option<Vec<RawFormat>>,
    pub formats: Option<Vec<RawFormat>>,
    /// Search results; individual entries may be null.
    pub entries: Option<Vec<Option<RawInfo>>>,
}

/// One downloadable format, or the format fields of the selected result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFormat {
    pub url: Option<String>,
    pub ext: Option<String>,
    pub protocol: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub abr: Option<f64>,
    pub tbr: Option<f64>,
    pub vbr: Option<f64>,
    pub fps: Option<f64>,
    pub height: Option<u32>,
    pub format_note: Option<String>,
}

const MANIFEST_MARKERS: [&str; 3] = ["m3u8", "manifest", "playlist"];
const MANIFEST_PROTOCOLS: [&str; 3] = ["m3u8", "m3u8_native", "hls"];

impl RawFormat {
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|codec| codec != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|codec| codec != "none")
    }

    /// yt-dlp omits the codec field when it does not know it; only an
    /// explicit `"none"` rules a track out.
    pub fn may_have_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    pub fn is_video_only(&self) -> bool {
        self.has_video() && self.acodec.as_deref() == Some("none")
    }

    pub fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none") && self.may_have_audio()
    }

    /// A non-empty URL that points at media rather than a manifest.
    pub fn direct_url(&self) -> Option<&str> {
        let url = self.url.as_deref().filter(|url| !url.is_empty())?;
        let lower = url.to_lowercase();
        if MANIFEST_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return None;
        }
        if self
            .protocol
            .as_deref()
            .is_some_and(|protocol| MANIFEST_PROTOCOLS.contains(&protocol))
        {
            return None;
        }
        Some(url)
    }

    /// Audio bitrate, falling back to total bitrate.
    pub fn audio_bitrate(&self) -> Option<f64> {
        positive(self.abr).or(positive(self.tbr))
    }
}

pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
