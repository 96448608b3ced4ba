use anyhow::{Context, Result};
use rand::Rng;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::sleep;

use super::VideoId;
use crate::config::YoutubeConfig;
use crate::TubescribeError;

/// Downloads the audio track of a video via yt-dlp, retrying throttled
/// requests the way YouTube tends to require.
pub struct AudioDownloader {
    yt_dlp_path: String,
    max_retries: u32,
    initial_delay: Duration,
}

impl AudioDownloader {
    pub fn new(config: &YoutubeConfig) -> Self {
        Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            max_retries: config.max_retries,
            initial_delay: Duration::from_secs(config.initial_retry_delay_secs),
        }
    }

    /// Download audio as MP3 to `output_path`. Retries on HTTP 403 with
    /// exponential backoff and jitter; any other failure is fatal.
    pub async fn download(&self, id: &VideoId, output_path: &Path) -> Result<()> {
        let mut delay = self.initial_delay;
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.run_yt_dlp(id, output_path).await {
                Ok(()) => {
                    self.verify_output(output_path)?;
                    return Ok(());
                }
                Err(e) => {
                    let retryable = e.to_string().contains("HTTP Error 403");
                    if retryable && attempt < self.max_retries {
                        let jitter = delay.mul_f64(rand::thread_rng().gen_range(0.0..0.1));
                        tracing::warn!(
                            "Download attempt {}/{} throttled, retrying in {:.1}s",
                            attempt,
                            self.max_retries,
                            (delay + jitter).as_secs_f64()
                        );
                        sleep(delay + jitter).await;
                        delay *= 2;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            TubescribeError::DownloadFailed("retries exhausted".to_string()).into()
        }))
    }

    async fn run_yt_dlp(&self, id: &VideoId, output_path: &Path) -> Result<()> {
        tracing::debug!("Downloading audio for {} to {}", id, output_path.display());

        // yt-dlp replaces %(ext)s with the post-processed extension
        let template = output_path.with_extension("%(ext)s");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--format",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "192K",
                "--no-playlist",
                "--no-warnings",
                "--output",
                &template.to_string_lossy(),
                &id.watch_url(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp audio download failed: {}", error.trim());
        }

        Ok(())
    }

    /// The postprocessor normally leaves `<stem>.mp3`; very occasionally the
    /// extension-less intermediate is what remains.
    fn verify_output(&self, output_path: &Path) -> Result<()> {
        let candidate = if output_path.exists() {
            output_path.to_path_buf()
        } else {
            let bare = output_path.with_extension("");
            if bare.exists() {
                fs_err::rename(&bare, output_path)?;
                output_path.to_path_buf()
            } else {
                return Err(TubescribeError::DownloadFailed(
                    "downloaded audio file not found".to_string(),
                )
                .into());
            }
        };

        let metadata = fs_err::metadata(&candidate)?;
        if metadata.len() == 0 {
            return Err(
                TubescribeError::DownloadFailed("downloaded audio file is empty".to_string())
                    .into(),
            );
        }

        Ok(())
    }
}
