use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::WhisperConfig;
use crate::TubescribeError;

/// Parsed output of a Whisper run
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperTranscript {
    pub text: String,

    pub language: Option<String>,

    #[serde(default)]
    pub segments: Vec<WhisperSegment>,
}

/// One segment of Whisper's JSON output; unknown fields (tokens, logprobs)
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Runs the Whisper CLI against a local audio file.
pub struct WhisperTranscriber {
    binary: String,
    model: String,
    language: Option<String>,
    timeout: Duration,
}

impl WhisperTranscriber {
    pub fn new(config: &WhisperConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the configured model
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Override the configured language hint
    pub fn with_language(mut self, language: Option<String>) -> Self {
        if language.is_some() {
            self.language = language;
        }
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check if the Whisper binary is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.binary)
            .arg("--help")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Transcribe an audio file, writing Whisper's JSON output into
    /// `work_dir` and parsing it back.
    pub async fn transcribe(&self, audio_path: &Path, work_dir: &Path) -> Result<WhisperTranscript> {
        let metadata = fs_err::metadata(audio_path)
            .map_err(|_| TubescribeError::FileError(format!(
                "audio file not found at {}",
                audio_path.display()
            )))?;
        if metadata.len() == 0 {
            return Err(TubescribeError::FileError("audio file is empty".to_string()).into());
        }

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.enable_steady_tick(Duration::from_millis(100));
        progress.set_message(format!(
            "Transcribing with Whisper ({} model, this may take a few minutes)...",
            self.model
        ));

        let start_time = std::time::Instant::now();
        let result = timeout(self.timeout, self.run_whisper(audio_path, work_dir)).await;

        match result {
            Ok(Ok(())) => {
                progress.finish_with_message(format!(
                    "Transcription finished in {:.0}s",
                    start_time.elapsed().as_secs_f64()
                ));
            }
            Ok(Err(e)) => {
                progress.finish_with_message("Transcription failed");
                return Err(e);
            }
            Err(_) => {
                progress.finish_with_message("Transcription timed out");
                return Err(TubescribeError::TranscriptionFailed(format!(
                    "whisper did not finish within {}s",
                    self.timeout.as_secs()
                ))
                .into());
            }
        }

        self.parse_output(audio_path, work_dir)
    }

    async fn run_whisper(&self, audio_path: &Path, work_dir: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary);

        cmd.arg(audio_path)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_dir")
            .arg(work_dir)
            .arg("--output_format")
            .arg("json")
            .arg("--verbose")
            .arg("False")
            .arg("--fp16")
            .arg("False")
            .arg("--temperature")
            .arg("0.0");

        if let Some(language) = &self.language {
            cmd.arg("--language").arg(language);
        }

        tracing::debug!("Executing whisper command: {:?}", cmd);

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run whisper")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("whisper failed: {}", error.trim());
        }

        Ok(())
    }

    /// Whisper writes `<audio stem>.json` into the output directory.
    fn parse_output(&self, audio_path: &Path, work_dir: &Path) -> Result<WhisperTranscript> {
        let json_path = self.output_json_path(audio_path, work_dir);

        let content = fs_err::read_to_string(&json_path)
            .with_context(|| format!("Whisper output not found at {}", json_path.display()))?;

        let transcript: WhisperTranscript =
            serde_json::from_str(&content).context("Failed to parse whisper JSON output")?;

        Ok(transcript)
    }

    fn output_json_path(&self, audio_path: &Path, work_dir: &Path) -> PathBuf {
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        work_dir.join(format!("{stem}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn transcriber() -> WhisperTranscriber {
        WhisperTranscriber::new(&Config::default().whisper)
    }

    #[test]
    fn output_path_uses_audio_stem() {
        let path = transcriber()
            .output_json_path(Path::new("/tmp/work/audio_ab12cd34.mp3"), Path::new("/tmp/work"));
        assert_eq!(path, Path::new("/tmp/work/audio_ab12cd34.json"));
    }

    #[test]
    fn model_override_applies() {
        let t = transcriber().with_model("small".to_string());
        assert_eq!(t.model(), "small");
    }

    #[test]
    fn language_override_keeps_configured_value_when_absent() {
        let mut config = Config::default().whisper;
        config.language = Some("en".to_string());
        let t = WhisperTranscriber::new(&config).with_language(None);
        assert_eq!(t.language.as_deref(), Some("en"));

        let t = WhisperTranscriber::new(&config).with_language(Some("de".to_string()));
        assert_eq!(t.language.as_deref(), Some("de"));
    }

    #[test]
    fn parses_whisper_json() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("clip.mp3");
        let json = r#"{
            "text": " Hello there. General Kenobi.",
            "language": "en",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 2.1, "text": " Hello there.",
                 "tokens": [1, 2], "temperature": 0.0, "avg_logprob": -0.2,
                 "compression_ratio": 1.1, "no_speech_prob": 0.01},
                {"id": 1, "seek": 0, "start": 2.1, "end": 4.0, "text": " General Kenobi.",
                 "tokens": [3], "temperature": 0.0, "avg_logprob": -0.3,
                 "compression_ratio": 1.2, "no_speech_prob": 0.02}
            ]
        }"#;
        fs_err::write(dir.path().join("clip.json"), json).unwrap();

        let transcript = transcriber().parse_output(&audio, dir.path()).unwrap();
        assert_eq!(transcript.language.as_deref(), Some("en"));
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[1].text.trim(), "General Kenobi.");
    }

    #[test]
    fn missing_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("clip.mp3");
        assert!(transcriber().parse_output(&audio, dir.path()).is_err());
    }

    #[tokio::test]
    async fn transcribe_rejects_missing_audio() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp3");
        assert!(transcriber().transcribe(&missing, dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn transcribe_rejects_empty_audio() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("empty.mp3");
        fs_err::write(&audio, b"").unwrap();
        assert!(transcriber().transcribe(&audio, dir.path()).await.is_err());
    }
}
