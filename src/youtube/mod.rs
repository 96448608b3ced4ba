use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use crate::TubescribeError;

pub mod captions;
pub mod downloader;

/// URL patterns a video ID can be extracted from
const VIDEO_ID_PATTERNS: &[&str] = &[
    r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&?/]+)",
    r"youtube\.com/watch\?.*v=([^&]+)",
    r"youtube\.com/shorts/([^&?/]+)",
];

/// A validated YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the video ID from a YouTube URL
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|_| TubescribeError::UnsupportedUrl(url.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TubescribeError::UnsupportedUrl(url.to_string()).into());
        }

        for pattern in VIDEO_ID_PATTERNS {
            let re = Regex::new(pattern)?;
            if let Some(caps) = re.captures(url) {
                if let Some(id) = caps.get(1) {
                    return Ok(VideoId(id.as_str().to_string()));
                }
            }
        }

        Err(TubescribeError::UnsupportedUrl(url.to_string()).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    /// Default thumbnail URL, valid even when the metadata probe fails
    pub fn thumbnail_url(&self) -> String {
        format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single caption track as listed by yt-dlp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub url: String,

    /// Track format (json3, vtt, ttml, ...)
    #[serde(default)]
    pub ext: String,

    /// Human-readable track name
    #[serde(default)]
    pub name: Option<String>,
}

/// Video metadata from the yt-dlp probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: VideoId,
    pub title: String,
    pub uploader: Option<String>,

    /// Duration in seconds
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,

    /// Manually created caption tracks, keyed by language code
    #[serde(default, skip_serializing)]
    pub subtitles: HashMap<String, Vec<CaptionTrack>>,

    /// Auto-generated caption tracks, keyed by language code
    #[serde(default, skip_serializing)]
    pub automatic_captions: HashMap<String, Vec<CaptionTrack>>,
}

impl VideoMetadata {
    /// Minimal record for when the probe fails; the thumbnail URL pattern
    /// works without any metadata.
    pub fn stub(id: &VideoId) -> Self {
        Self {
            id: id.clone(),
            title: format!("Video {}", id),
            uploader: None,
            duration: None,
            thumbnail: Some(id.thumbnail_url()),
            subtitles: HashMap::new(),
            automatic_captions: HashMap::new(),
        }
    }
}

/// Fields we read out of `yt-dlp --dump-json`
#[derive(Debug, Deserialize)]
struct ProbePayload {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    subtitles: HashMap<String, Vec<CaptionTrack>>,
    #[serde(default)]
    automatic_captions: HashMap<String, Vec<CaptionTrack>>,
}

/// Metadata access via yt-dlp
pub struct YoutubeClient {
    yt_dlp_path: String,
}

impl YoutubeClient {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Probe video metadata without downloading. A failed probe degrades to a
    /// stub record so transcription can still be attempted.
    pub async fn probe(&self, id: &VideoId) -> Result<VideoMetadata> {
        match self.probe_inner(id).await {
            Ok(metadata) => Ok(metadata),
            Err(e) => {
                tracing::warn!("Metadata probe failed for {}: {:#}", id, e);
                Ok(VideoMetadata::stub(id))
            }
        }
    }

    async fn probe_inner(&self, id: &VideoId) -> Result<VideoMetadata> {
        if !self.check_availability().await {
            anyhow::bail!(
                "yt-dlp is not available. Please install it: https://github.com/yt-dlp/yt-dlp"
            );
        }

        tracing::debug!("Probing video metadata for: {}", id);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--dump-json",
                "--no-playlist",
                "--skip-download",
                &id.watch_url(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        let payload: ProbePayload = serde_json::from_slice(&output.stdout)
            .context("Failed to parse yt-dlp metadata")?;

        Ok(VideoMetadata {
            id: id.clone(),
            title: payload.title.unwrap_or_else(|| format!("Video {}", id)),
            uploader: payload.uploader,
            duration: payload.duration,
            thumbnail: payload.thumbnail.or_else(|| Some(id.thumbnail_url())),
            subtitles: payload.subtitles,
            automatic_captions: payload.automatic_captions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_urls() {
        let id = VideoId::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_short_urls() {
        let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_embed_urls() {
        let id = VideoId::parse("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn parses_shorts_urls() {
        let id = VideoId::parse("https://www.youtube.com/shorts/abc123XYZ_-").unwrap();
        assert_eq!(id.as_str(), "abc123XYZ_-");
    }

    #[test]
    fn parses_watch_urls_with_extra_params() {
        let id = VideoId::parse("https://www.youtube.com/watch?list=PL123&v=dQw4w9WgXcQ").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn strips_trailing_params() {
        let id = VideoId::parse("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn rejects_non_youtube_urls() {
        assert!(VideoId::parse("https://vimeo.com/12345").is_err());
        assert!(VideoId::parse("not-a-url").is_err());
        assert!(VideoId::parse("ftp://youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn stub_metadata_has_thumbnail() {
        let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let stub = VideoMetadata::stub(&id);
        assert_eq!(stub.title, "Video dQw4w9WgXcQ");
        assert_eq!(
            stub.thumbnail.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg")
        );
    }

    #[test]
    fn probe_payload_parses_caption_maps() {
        let json = r#"{
            "title": "Test",
            "uploader": "Someone",
            "duration": 63.0,
            "thumbnail": "https://example.com/t.jpg",
            "subtitles": {"en": [{"url": "https://example.com/c", "ext": "json3", "name": "English"}]},
            "automatic_captions": {}
        }"#;
        let payload: ProbePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.subtitles["en"][0].ext, "json3");
        assert!(payload.automatic_captions.is_empty());
    }
}
