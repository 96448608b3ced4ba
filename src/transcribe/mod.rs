use anyhow::{Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

use crate::config::Config;
use crate::translate::TranslationClient;
use crate::youtube::captions::{CaptionFetcher, CaptionKind};
use crate::youtube::downloader::AudioDownloader;
use crate::youtube::{VideoId, VideoMetadata, YoutubeClient};
use crate::TubescribeError;

pub mod whisper;

use whisper::WhisperTranscriber;

/// Transcription result with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// The transcribed text
    pub transcript: String,

    /// Segments with timestamps
    pub segments: Vec<TranscriptSegment>,

    /// Where the transcript came from
    pub origin: TranscriptOrigin,

    /// Probed video metadata
    pub video: VideoMetadata,

    /// Translation, when one was requested
    pub translation: Option<Translation>,

    /// Path to the preserved audio file (if kept)
    pub audio_path: Option<PathBuf>,

    /// Run metadata
    pub metadata: RunMetadata,
}

/// Individual transcript segment with timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start_time: f64,

    /// End time in seconds
    pub end_time: f64,

    /// Segment text
    pub text: String,
}

/// How the transcript was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TranscriptOrigin {
    /// Captions hosted by YouTube
    Captions { language: String, generated: bool },

    /// Local Whisper transcription
    Whisper { model: String },
}

/// A translated rendition of the transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    /// Target language code
    pub language: String,

    /// Translated text
    pub text: String,
}

/// Metadata about the transcription run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Language of the transcript, when known
    pub language: Option<String>,

    /// Processing time in seconds
    pub processing_duration: Option<f64>,

    /// Timestamp when the run completed
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// What a transcript source yields
#[derive(Debug, Clone)]
pub struct SourcedTranscript {
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    pub language: Option<String>,
    pub origin: TranscriptOrigin,

    /// Set when the source had to download audio
    pub audio_path: Option<PathBuf>,
}

/// A provider that may yield a transcript for a probed video. Sources are
/// tried in order; yielding `None` passes the video to the next one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video: &VideoMetadata) -> Result<Option<SourcedTranscript>>;

    fn source_name(&self) -> &'static str;
}

/// Transcript source backed by YouTube's own captions
pub struct CaptionSource {
    fetcher: CaptionFetcher,
}

impl CaptionSource {
    pub fn new(fetcher: CaptionFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl TranscriptSource for CaptionSource {
    async fn fetch_transcript(&self, video: &VideoMetadata) -> Result<Option<SourcedTranscript>> {
        // A broken caption fetch should not abort the run; the next source
        // still gets its chance.
        let fetched = match self.fetcher.fetch(video).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Caption fetch failed, falling back: {:#}", e);
                return Ok(None);
            }
        };

        let Some(captions) = fetched else {
            return Ok(None);
        };

        let text = captions
            .cues
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let segments = captions
            .cues
            .iter()
            .map(|c| TranscriptSegment {
                start_time: c.start,
                end_time: c.end,
                text: c.text.clone(),
            })
            .collect();

        Ok(Some(SourcedTranscript {
            text,
            segments,
            language: Some(captions.language.clone()),
            origin: TranscriptOrigin::Captions {
                language: captions.language,
                generated: matches!(captions.kind, CaptionKind::Generated),
            },
            audio_path: None,
        }))
    }

    fn source_name(&self) -> &'static str {
        "YouTube captions"
    }
}

/// Transcript source that downloads the audio track and runs Whisper
pub struct WhisperSource {
    downloader: AudioDownloader,
    transcriber: WhisperTranscriber,
    work_dir: PathBuf,
}

impl WhisperSource {
    pub fn new(downloader: AudioDownloader, transcriber: WhisperTranscriber, work_dir: PathBuf) -> Self {
        Self {
            downloader,
            transcriber,
            work_dir,
        }
    }
}

#[async_trait]
impl TranscriptSource for WhisperSource {
    async fn fetch_transcript(&self, video: &VideoMetadata) -> Result<Option<SourcedTranscript>> {
        let filename = format!("audio_{}.mp3", &Uuid::new_v4().to_string()[..8]);
        let audio_path = self.work_dir.join(filename);

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.enable_steady_tick(Duration::from_millis(100));
        progress.set_message("Downloading audio with yt-dlp...");

        self.downloader.download(&video.id, &audio_path).await?;
        progress.finish_with_message("Download complete");

        let transcript = self
            .transcriber
            .transcribe(&audio_path, &self.work_dir)
            .await?;

        let segments = transcript
            .segments
            .iter()
            .map(|s| TranscriptSegment {
                start_time: s.start,
                end_time: s.end,
                text: s.text.trim().to_string(),
            })
            .collect();

        Ok(Some(SourcedTranscript {
            text: transcript.text.trim().to_string(),
            segments,
            language: transcript.language.clone(),
            origin: TranscriptOrigin::Whisper {
                model: self.transcriber.model().to_string(),
            },
            audio_path: Some(audio_path),
        }))
    }

    fn source_name(&self) -> &'static str {
        "Whisper"
    }
}

/// Options assembled from the `transcribe` command line
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Skip the caption lookup entirely
    pub no_captions: bool,

    /// Whisper model override
    pub model: Option<String>,

    /// Whisper language hint override
    pub language: Option<String>,

    /// Translate the transcript into this language
    pub translate_to: Option<String>,

    /// Keep the downloaded audio in the current directory
    pub save_audio: bool,
}

/// Main transcription pipeline
pub struct TranscriptionPipeline {
    youtube: YoutubeClient,
    sources: Vec<Box<dyn TranscriptSource>>,
    translator: Option<(TranslationClient, String)>,
    save_audio: bool,
    temp_dir: TempDir,
}

impl TranscriptionPipeline {
    /// Create a new transcription pipeline
    pub fn new(config: Config, options: PipelineOptions) -> Result<Self> {
        let temp_dir = match &config.app.temp_dir {
            Some(dir) => {
                fs_err::create_dir_all(dir)?;
                TempDir::new_in(dir)
            }
            None => TempDir::new(),
        }
        .context("Failed to create temporary directory")?;

        let mut sources: Vec<Box<dyn TranscriptSource>> = Vec::new();

        if !options.no_captions {
            sources.push(Box::new(CaptionSource::new(CaptionFetcher::new(
                config.youtube.caption_languages.clone(),
            ))));
        }

        let mut transcriber = WhisperTranscriber::new(&config.whisper)
            .with_language(options.language.clone());
        if let Some(model) = &options.model {
            transcriber = transcriber.with_model(model.clone());
        }

        sources.push(Box::new(WhisperSource::new(
            AudioDownloader::new(&config.youtube),
            transcriber,
            temp_dir.path().to_path_buf(),
        )));

        let translator = match &options.translate_to {
            Some(target) => Some((
                TranslationClient::new(&config.translation)?,
                target.clone(),
            )),
            None => None,
        };

        Ok(Self {
            youtube: YoutubeClient::new(config.youtube.yt_dlp_path.clone()),
            sources,
            translator,
            save_audio: options.save_audio || config.app.keep_audio,
            temp_dir,
        })
    }

    /// Transcribe a video from its URL
    pub async fn transcribe(&self, url: &str) -> Result<TranscriptionResult> {
        let video_id = VideoId::parse(url)?;

        tracing::info!("Probing video: {}", video_id);
        let video = self.youtube.probe(&video_id).await?;
        tracing::info!("Processing \"{}\"", video.title);

        let started = std::time::Instant::now();
        let sourced = self.resolve_transcript(&video).await?;

        if sourced.text.trim().is_empty() {
            return Err(TubescribeError::TranscriptionFailed(
                "no text was produced".to_string(),
            )
            .into());
        }

        let translation = match &self.translator {
            Some((client, target)) => {
                tracing::info!("Translating transcript to {}", target);
                let text = client.translate(&sourced.text, target).await?;
                Some(Translation {
                    language: target.clone(),
                    text,
                })
            }
            None => None,
        };

        let audio_path = match (&sourced.audio_path, self.save_audio) {
            (Some(temp_path), true) => Some(self.preserve_audio_file(temp_path, &video)?),
            _ => None,
        };

        Ok(TranscriptionResult {
            transcript: sourced.text,
            segments: sourced.segments,
            origin: sourced.origin,
            metadata: RunMetadata {
                language: sourced.language,
                processing_duration: Some(started.elapsed().as_secs_f64()),
                completed_at: chrono::Utc::now(),
            },
            video,
            translation,
            audio_path,
        })
    }

    /// Try each source in order; the first transcript wins.
    async fn resolve_transcript(&self, video: &VideoMetadata) -> Result<SourcedTranscript> {
        for source in &self.sources {
            match source.fetch_transcript(video).await? {
                Some(transcript) => {
                    tracing::info!("Transcript obtained from {}", source.source_name());
                    return Ok(transcript);
                }
                None => {
                    tracing::info!("No transcript available from {}", source.source_name());
                }
            }
        }

        Err(TubescribeError::TranscriptionFailed(
            "no source could produce a transcript".to_string(),
        )
        .into())
    }

    /// Copy the temp audio file into the current directory under a name
    /// derived from the video title.
    fn preserve_audio_file(&self, temp_path: &PathBuf, video: &VideoMetadata) -> Result<PathBuf> {
        let sanitized = crate::utils::sanitize_filename(&video.title);
        let filename = if sanitized.is_empty() {
            crate::utils::generate_unique_filename("audio", "mp3")
        } else {
            format!("{}.mp3", sanitized)
        };

        let output_path = std::env::current_dir()?.join(filename);
        fs_err::copy(temp_path, &output_path)?;

        tracing::debug!(
            "Preserved audio file: {} (temp dir {})",
            output_path.display(),
            self.temp_dir.path().display()
        );

        Ok(output_path)
    }
}
