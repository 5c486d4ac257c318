//! Conversion from raw extractor output to public record types.

use std::collections::HashSet;

use super::raw::{RawFormat, RawInfo, positive};
use crate::types::{
    AudioStream, SearchItem, StreamType, VideoStream, format_duration, format_view_count,
};
use crate::{HuginnError, Result};

const TITLE_MAX_CHARS: usize = 100;
const UPLOADER_MAX_CHARS: usize = 50;
const UNKNOWN_TITLE: &str = "Unknown Title";

pub fn watch_url(item_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={item_id}")
}

pub fn music_watch_url(item_id: &str) -> String {
    format!("https://music.youtube.com/watch?v={item_id}")
}

fn thumbnail_url(item_id: &str, variant: &str) -> String {
    format!("https://img.youtube.com/vi/{item_id}/{variant}.jpg")
}

fn truncate_trimmed(value: &str, max_chars: usize) -> String {
    value.trim().chars().take(max_chars).collect()
}

fn duration_secs(duration: Option<f64>) -> u64 {
    positive(duration).map_or(0, |secs| secs as u64)
}

/// Turn a flat search playlist into at most `limit` search items.
///
/// Null entries, entries without an id, repeated ids and entries without a
/// positive duration (live streams, channels) are skipped.
pub fn search_items(raw: RawInfo, limit: usize) -> Vec<SearchItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for entry in raw.entries.unwrap_or_default().into_iter().flatten() {
        if items.len() >= limit {
            break;
        }
        let Some(id) = entry.id.filter(|id| !id.is_empty()) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        if positive(entry.duration).is_none() {
            continue;
        }

        let uploader = entry
            .uploader
            .as_deref()
            .map(|uploader| truncate_trimmed(uploader, UPLOADER_MAX_CHARS))
            .filter(|uploader| !uploader.is_empty())
            .unwrap_or_else(|| "Unknown".to_owned());

        items.push(SearchItem {
            title: truncate_trimmed(entry.title.as_deref().unwrap_or("No Title"), TITLE_MAX_CHARS),
            thumbnail_url: thumbnail_url(&id, "mqdefault"),
            uploader,
            duration_formatted: format_duration(entry.duration),
            view_count_formatted: format_view_count(entry.view_count),
            url: watch_url(&id),
            item_id: id,
        });
    }

    items
}

fn kbps(bitrate: Option<f64>) -> String {
    match bitrate {
        Some(rate) => format!("{rate:.0}kbps"),
        None => "unknown".to_owned(),
    }
}

/// Pick a directly playable audio URL from one extraction.
///
/// The selected result's own URL wins when it is a direct media URL;
/// otherwise the highest-bitrate direct format carrying audio is used,
/// audio-only formats first on equal bitrate.
pub fn audio_stream(raw: RawInfo, item_id: &str) -> Result<AudioStream> {
    let chosen: &RawFormat = if raw.format.direct_url().is_some() {
        &raw.format
    } else {
        raw.formats
            .iter()
            .flatten()
            .filter(|fmt| fmt.may_have_audio() && fmt.direct_url().is_some())
            .filter(|fmt| fmt.is_audio_only() || looks_like_audio_file(fmt))
            .max_by(|a, b| {
                let rate = |fmt: &RawFormat| fmt.audio_bitrate().unwrap_or(0.0);
                rate(a)
                    .total_cmp(&rate(b))
                    .then(a.is_audio_only().cmp(&b.is_audio_only()))
            })
            .ok_or_else(|| {
                HuginnError::Extraction(format!("no direct audio URL for {item_id}"))
            })?
    };

    let stream_url = chosen.direct_url().unwrap_or_default().to_owned();
    Ok(AudioStream {
        stream_url,
        title: raw.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_owned()),
        duration_seconds: duration_secs(raw.duration),
        thumbnail_url: thumbnail_url(item_id, "mqdefault"),
        format: chosen.ext.clone().unwrap_or_else(|| "unknown".to_owned()),
        quality: kbps(chosen.audio_bitrate()),
    })
}

fn looks_like_audio_file(fmt: &RawFormat) -> bool {
    const AUDIO_EXTENSIONS: [&str; 5] = [".m4a", ".mp3", ".aac", ".ogg", ".wav"];
    fmt.url.as_deref().is_some_and(|url| {
        let lower = url.to_lowercase();
        AUDIO_EXTENSIONS.iter().any(|ext| lower.contains(ext))
    })
}

fn video_quality(fmt: &RawFormat) -> String {
    let mut quality = match (fmt.height, fmt.format_note.as_deref()) {
        (Some(height), _) if height > 0 => format!("{height}p"),
        (_, Some(note)) if !note.is_empty() => note.to_owned(),
        _ => "unknown".to_owned(),
    };
    if let Some(fps) = positive(fmt.fps)
        && fps > 30.0
    {
        quality.push_str(&format!("{fps:.0}fps"));
    }
    if let Some(vbr) = positive(fmt.vbr) {
        quality.push_str(&format!(" ({vbr:.0}kbps)"));
    }
    quality
}

/// Pick playable video URL(s) from one extraction.
///
/// Preference order: the selected split pair (`requested_formats`), the
/// selected single file when it carries both tracks, then the best
/// video-only plus best audio-only format from the full format list.
pub fn video_stream(raw: RawInfo, item_id: &str) -> Result<VideoStream> {
    let title = raw.title.clone().unwrap_or_else(|| UNKNOWN_TITLE.to_owned());
    let duration_seconds = duration_secs(raw.duration);
    let thumbnail_url = thumbnail_url(item_id, "maxresdefault");

    let separate = |video: &RawFormat, audio: &RawFormat| {
        let video_url = video.url.clone()?;
        let audio_url = audio.url.clone()?;
        Some(VideoStream {
            video_url,
            audio_url: Some(audio_url),
            title: title.clone(),
            duration_seconds,
            thumbnail_url: thumbnail_url.clone(),
            quality: video_quality(video),
            stream_type: StreamType::Separate,
        })
    };

    if let Some(requested) = raw.requested_formats.as_deref() {
        let video = requested.iter().find(|fmt| fmt.is_video_only());
        let audio = requested
            .iter()
            .find(|fmt| fmt.is_audio_only() && fmt.has_audio());
        if let (Some(video), Some(audio)) = (video, audio)
            && let Some(stream) = separate(video, audio)
        {
            return Ok(stream);
        }
    }

    if let Some(url) = raw.format.url.as_deref().filter(|url| !url.is_empty())
        && raw.format.has_video()
        && raw.format.has_audio()
    {
        return Ok(VideoStream {
            video_url: url.to_owned(),
            audio_url: None,
            title: title.clone(),
            duration_seconds,
            thumbnail_url: thumbnail_url.clone(),
            quality: video_quality(&raw.format),
            stream_type: StreamType::Combined,
        });
    }

    let formats = raw.formats.as_deref().unwrap_or_default();
    let best_video = formats
        .iter()
        .filter(|fmt| fmt.is_video_only() && fmt.direct_url().is_some())
        .max_by_key(|fmt| fmt.height.unwrap_or(0));
    let best_audio = formats
        .iter()
        .filter(|fmt| fmt.is_audio_only() && fmt.has_audio() && fmt.direct_url().is_some())
        .max_by(|a, b| {
            let rate = |fmt: &RawFormat| fmt.audio_bitrate().unwrap_or(0.0);
            rate(a).total_cmp(&rate(b))
        });
    if let (Some(video), Some(audio)) = (best_video, best_audio)
        && let Some(stream) = separate(video, audio)
    {
        return Ok(stream);
    }

    Err(HuginnError::Extraction(format!(
        "no suitable video stream for {item_id}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RawInfo {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn search_filters_and_limits() {
        let raw = parse(
            r#"{"entries": [
                null,
                {"title": "no id", "duration": 10},
                {"id": "a1", "title": "  First  ", "uploader": "Band", "duration": 212, "view_count": 1500},
                {"id": "a1", "title": "dup", "duration": 100},
                {"id": "live", "title": "Live now", "duration": null},
                {"id": "b2", "title": "Second", "duration": 3725.0},
                {"id": "c3", "title": "Third", "duration": 60}
            ]}"#,
        );
        let items = search_items(raw, 2);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_id, "a1");
        assert_eq!(items[0].title, "First");
        assert_eq!(items[0].uploader, "Band");
        assert_eq!(items[0].duration_formatted, "3:32");
        assert_eq!(items[0].view_count_formatted, "1.5K views");
        assert_eq!(
            items[0].thumbnail_url,
            "https://img.youtube.com/vi/a1/mqdefault.jpg"
        );
        assert_eq!(items[0].url, "https://www.youtube.com/watch?v=a1");
        assert_eq!(items[1].item_id, "b2");
        assert_eq!(items[1].uploader, "Unknown");
        assert_eq!(items[1].duration_formatted, "1:02:05");
    }

    #[test]
    fn search_truncates_long_fields() {
        let title = "t".repeat(150);
        let uploader = "u".repeat(80);
        let raw = parse(&format!(
            r#"{{"entries": [{{"id": "x", "title": "{title}", "uploader": "{uploader}", "duration": 5}}]}}"#
        ));
        let items = search_items(raw, 10);
        assert_eq!(items[0].title.chars().count(), 100);
        assert_eq!(items[0].uploader.chars().count(), 50);
    }

    #[test]
    fn search_without_entries_is_empty() {
        assert!(search_items(parse("{}"), 10).is_empty());
    }

    #[test]
    fn audio_uses_direct_top_level_url() {
        let raw = parse(
            r#"{"title": "Song", "duration": 200.5, "url": "https://cdn/audio.webm",
                "ext": "webm", "abr": 160.2, "vcodec": "none", "acodec": "opus"}"#,
        );
        let stream = audio_stream(raw, "abc123").unwrap();
        assert_eq!(stream.stream_url, "https://cdn/audio.webm");
        assert_eq!(stream.duration_seconds, 200);
        assert_eq!(stream.format, "webm");
        assert_eq!(stream.quality, "160kbps");
    }

    #[test]
    fn audio_skips_manifest_and_picks_best_direct_format() {
        let raw = parse(
            r#"{"title": "Song", "url": "https://cdn/master.m3u8", "formats": [
                {"url": "https://cdn/low.m4a", "ext": "m4a", "abr": 48, "vcodec": "none", "acodec": "mp4a"},
                {"url": "https://cdn/hls.m3u8", "ext": "mp4", "abr": 320, "vcodec": "none", "acodec": "mp4a"},
                {"url": "https://cdn/high.webm", "ext": "webm", "abr": 128, "vcodec": "none", "acodec": "opus", "protocol": "https"},
                {"url": "https://cdn/video.mp4", "ext": "mp4", "tbr": 900, "vcodec": "avc1", "acodec": "mp4a"},
                {"url": "https://cdn/silent.mp4", "ext": "mp4", "vcodec": "avc1", "acodec": "none"}
            ]}"#,
        );
        let stream = audio_stream(raw, "abc123").unwrap();
        assert_eq!(stream.stream_url, "https://cdn/high.webm");
        assert_eq!(stream.quality, "128kbps");
        assert_eq!(stream.format, "webm");
    }

    #[test]
    fn audio_without_direct_url_fails() {
        let raw = parse(r#"{"url": "https://cdn/master.m3u8", "formats": []}"#);
        let err = audio_stream(raw, "abc123").unwrap_err();
        assert!(matches!(err, HuginnError::Extraction(_)));
    }

    #[test]
    fn video_prefers_requested_split_formats() {
        let raw = parse(
            r#"{"title": "Clip", "duration": 90, "requested_formats": [
                {"url": "https://cdn/v.mp4", "vcodec": "avc1", "acodec": "none", "height": 1080, "fps": 60, "vbr": 2500.4},
                {"url": "https://cdn/a.m4a", "vcodec": "none", "acodec": "mp4a", "abr": 128}
            ]}"#,
        );
        let stream = video_stream(raw, "vid").unwrap();
        assert_eq!(stream.stream_type, StreamType::Separate);
        assert_eq!(stream.video_url, "https://cdn/v.mp4");
        assert_eq!(stream.audio_url.as_deref(), Some("https://cdn/a.m4a"));
        assert_eq!(stream.quality, "1080p60fps (2500kbps)");
        assert_eq!(
            stream.thumbnail_url,
            "https://img.youtube.com/vi/vid/maxresdefault.jpg"
        );
    }

    #[test]
    fn video_falls_back_to_combined_url() {
        let raw = parse(
            r#"{"title": "Clip", "url": "https://cdn/both.mp4", "vcodec": "avc1",
                "acodec": "mp4a", "height": 720, "fps": 30}"#,
        );
        let stream = video_stream(raw, "vid").unwrap();
        assert_eq!(stream.stream_type, StreamType::Combined);
        assert_eq!(stream.audio_url, None);
        assert_eq!(stream.quality, "720p");
    }

    #[test]
    fn video_assembles_pair_from_format_list() {
        let raw = parse(
            r#"{"formats": [
                {"url": "https://cdn/360.mp4", "vcodec": "avc1", "acodec": "none", "height": 360},
                {"url": "https://cdn/1440.mp4", "vcodec": "vp9", "acodec": "none", "height": 1440, "format_note": "1440p"},
                {"url": "https://cdn/a-low.m4a", "vcodec": "none", "acodec": "mp4a", "abr": 48},
                {"url": "https://cdn/a-high.webm", "vcodec": "none", "acodec": "opus", "abr": 160}
            ]}"#,
        );
        let stream = video_stream(raw, "vid").unwrap();
        assert_eq!(stream.video_url, "https://cdn/1440.mp4");
        assert_eq!(stream.audio_url.as_deref(), Some("https://cdn/a-high.webm"));
        assert_eq!(stream.title, "Unknown Title");
    }

    #[test]
    fn video_without_usable_formats_fails() {
        let err = video_stream(parse("{}"), "vid").unwrap_err();
        assert!(matches!(err, HuginnError::Extraction(_)));
    }
}
