use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tubescribe",
    about = "Tubescribe - Generate and translate transcripts for YouTube videos",
    version,
    long_about = "A CLI tool for transcribing YouTube videos. Uses the captions YouTube already hosts when available, and falls back to a local Whisper backend otherwise. Transcripts can be translated into a number of languages via Google Translate."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators and dependency warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe a YouTube video
    Transcribe {
        /// YouTube video URL (watch, youtu.be, embed, or shorts form)
        #[arg(value_name = "URL")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format (falls back to the configured default)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Translate the transcript into this language after producing it
        #[arg(long, value_name = "LANG")]
        translate_to: Option<String>,

        /// Language hint passed to Whisper (auto-detect if not specified)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Skip the caption lookup and always transcribe with Whisper
        #[arg(long)]
        no_captions: bool,

        /// Whisper model to use (overrides the configured model)
        #[arg(long, value_name = "NAME")]
        model: Option<String>,

        /// Keep the downloaded audio file in the current directory
        #[arg(long)]
        save_audio: bool,

        /// Include timestamps in text output (srt/vtt formats always include timestamps)
        #[arg(long)]
        timestamps: bool,
    },

    /// Translate an existing transcript file (use "-" to read from stdin)
    Translate {
        /// Path to a text file, or "-" for stdin
        #[arg(value_name = "FILE")]
        input: String,

        /// Target language code (see the `languages` command)
        #[arg(long, value_name = "LANG")]
        to: Option<String>,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Only detect and print the language of the input
        #[arg(long)]
        detect_only: bool,
    },

    /// Show video metadata without transcribing
    Info {
        /// YouTube video URL
        #[arg(value_name = "URL")]
        url: String,
    },

    /// List supported translation languages
    Languages,

    /// Show configuration and its location
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with segments and metadata
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}
