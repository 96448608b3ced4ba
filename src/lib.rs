//! Tubescribe - A Rust CLI tool for transcribing and translating YouTube videos
//!
//! This library fetches transcripts for YouTube videos, preferring the captions
//! the platform already hosts and falling back to a local Whisper backend when
//! none are available. Transcripts can optionally be translated via the public
//! Google Translate endpoint.

pub mod cli;
pub mod config;
pub mod output;
pub mod transcribe;
pub mod translate;
pub mod utils;
pub mod youtube;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use transcribe::{TranscriptionPipeline, TranscriptionResult};
pub use youtube::{VideoId, VideoMetadata};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to tubescribe
#[derive(thiserror::Error, Debug)]
pub enum TubescribeError {
    #[error("Not a recognized YouTube URL: {0}")]
    UnsupportedUrl(String),

    #[error("Audio download failed: {0}")]
    DownloadFailed(String),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Translation failed: {0}")]
    TranslationFailed(String),

    #[error("File operation failed: {0}")]
    FileError(String),
}
