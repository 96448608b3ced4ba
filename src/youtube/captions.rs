use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{CaptionTrack, VideoMetadata};

/// A single timed caption line
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Whether a track was written by a human or generated by YouTube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionKind {
    Manual,
    Generated,
}

/// A fetched caption transcript
#[derive(Debug, Clone)]
pub struct FetchedCaptions {
    pub language: String,
    pub kind: CaptionKind,
    pub cues: Vec<CaptionCue>,
}

/// Fetches caption tracks listed in the video metadata.
pub struct CaptionFetcher {
    client: Client,
    preferred_languages: Vec<String>,
}

impl CaptionFetcher {
    pub fn new(preferred_languages: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            preferred_languages,
        }
    }

    /// Fetch the most suitable caption track, if the video has one.
    /// Preference order: a manual track in a preferred language, an
    /// auto-generated track in a preferred language, then any manual track.
    /// Absence of captions is not an error.
    pub async fn fetch(&self, video: &VideoMetadata) -> Result<Option<FetchedCaptions>> {
        let Some((language, kind, track)) = self.select_track(video) else {
            tracing::debug!("No usable caption track for {}", video.id);
            return Ok(None);
        };

        tracing::info!(
            "Fetching {} captions ({:?}) for {}",
            language,
            kind,
            video.id
        );

        let cues = self.fetch_track(track).await?;
        if cues.is_empty() {
            tracing::debug!("Caption track for {} contained no text", video.id);
            return Ok(None);
        }

        Ok(Some(FetchedCaptions {
            language,
            kind,
            cues,
        }))
    }

    fn select_track<'a>(
        &self,
        video: &'a VideoMetadata,
    ) -> Option<(String, CaptionKind, &'a CaptionTrack)> {
        for lang in &self.preferred_languages {
            if let Some(track) = json3_track(video.subtitles.get(lang)) {
                return Some((lang.clone(), CaptionKind::Manual, track));
            }
        }

        for lang in &self.preferred_languages {
            if let Some(track) = json3_track(video.automatic_captions.get(lang)) {
                return Some((lang.clone(), CaptionKind::Generated, track));
            }
        }

        // Fall back to any manual track; sorted for a deterministic pick
        let mut languages: Vec<&String> = video.subtitles.keys().collect();
        languages.sort();
        for lang in languages {
            if let Some(track) = json3_track(video.subtitles.get(lang)) {
                return Some((lang.clone(), CaptionKind::Manual, track));
            }
        }

        None
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionCue>> {
        let response = self
            .client
            .get(&track.url)
            .send()
            .await
            .context("Failed to fetch caption track")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch caption track: HTTP {}", response.status());
        }

        let body = response
            .text()
            .await
            .context("Failed to read caption track body")?;

        parse_json3(&body)
    }
}

fn json3_track(tracks: Option<&Vec<CaptionTrack>>) -> Option<&CaptionTrack> {
    tracks?.iter().find(|t| t.ext == "json3")
}

/// YouTube json3 caption payload
#[derive(Debug, Deserialize)]
struct Json3Payload {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Default, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs")]
    start_ms: Option<u64>,

    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,

    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    utf8: Option<String>,
}

fn parse_json3(body: &str) -> Result<Vec<CaptionCue>> {
    let payload: Json3Payload =
        serde_json::from_str(body).context("Failed to parse json3 caption payload")?;

    let mut cues = Vec::new();
    for event in payload.events {
        let Some(segs) = event.segs else { continue };

        let text: String = segs
            .into_iter()
            .filter_map(|s| s.utf8)
            .collect::<String>()
            .replace('\n', " ")
            .trim()
            .to_string();

        if text.is_empty() {
            continue;
        }

        let start = event.start_ms.unwrap_or(0) as f64 / 1000.0;
        let end = start + event.duration_ms.unwrap_or(0) as f64 / 1000.0;

        cues.push(CaptionCue { start, end, text });
    }

    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::VideoId;
    use std::collections::HashMap;

    fn track(ext: &str) -> CaptionTrack {
        CaptionTrack {
            url: format!("https://example.com/{ext}"),
            ext: ext.to_string(),
            name: None,
        }
    }

    fn video_with(
        subtitles: Vec<(&str, Vec<CaptionTrack>)>,
        automatic: Vec<(&str, Vec<CaptionTrack>)>,
    ) -> VideoMetadata {
        let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        let mut video = VideoMetadata::stub(&id);
        video.subtitles = subtitles
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>();
        video.automatic_captions = automatic
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>();
        video
    }

    #[test]
    fn prefers_manual_over_generated() {
        let fetcher = CaptionFetcher::new(vec!["en".to_string()]);
        let video = video_with(
            vec![("en", vec![track("json3")])],
            vec![("en", vec![track("json3")])],
        );
        let (lang, kind, _) = fetcher.select_track(&video).unwrap();
        assert_eq!(lang, "en");
        assert_eq!(kind, CaptionKind::Manual);
    }

    #[test]
    fn falls_back_to_generated_in_preferred_language() {
        let fetcher = CaptionFetcher::new(vec!["en".to_string()]);
        let video = video_with(
            vec![("fr", vec![track("json3")])],
            vec![("en", vec![track("json3")])],
        );
        let (lang, kind, _) = fetcher.select_track(&video).unwrap();
        assert_eq!(lang, "en");
        assert_eq!(kind, CaptionKind::Generated);
    }

    #[test]
    fn falls_back_to_any_manual_track() {
        let fetcher = CaptionFetcher::new(vec!["en".to_string()]);
        let video = video_with(vec![("fr", vec![track("json3")])], vec![]);
        let (lang, kind, _) = fetcher.select_track(&video).unwrap();
        assert_eq!(lang, "fr");
        assert_eq!(kind, CaptionKind::Manual);
    }

    #[test]
    fn ignores_tracks_without_json3() {
        let fetcher = CaptionFetcher::new(vec!["en".to_string()]);
        let video = video_with(vec![("en", vec![track("vtt")])], vec![]);
        assert!(fetcher.select_track(&video).is_none());
    }

    #[test]
    fn no_captions_selects_nothing() {
        let fetcher = CaptionFetcher::new(vec!["en".to_string()]);
        let video = video_with(vec![], vec![]);
        assert!(fetcher.select_track(&video).is_none());
    }

    #[test]
    fn parses_json3_events() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello "}, {"utf8": "world"}]},
                {"tStartMs": 1500, "dDurationMs": 1000, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2500, "dDurationMs": 2000, "segs": [{"utf8": "again"}]},
                {"tStartMs": 9000}
            ]
        }"#;
        let cues = parse_json3(body).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Hello world");
        assert!((cues[0].start - 0.0).abs() < f64::EPSILON);
        assert!((cues[0].end - 1.5).abs() < f64::EPSILON);
        assert_eq!(cues[1].text, "again");
        assert!((cues[1].start - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn bad_json3_is_an_error() {
        assert!(parse_json3("{not json").is_err());
    }
}
