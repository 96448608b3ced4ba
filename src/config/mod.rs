use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// YouTube access settings (yt-dlp, retries, caption preferences)
    pub youtube: YoutubeConfig,

    /// Whisper backend settings
    pub whisper: WhisperConfig,

    /// Translation service settings
    pub translation: TranslationConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeConfig {
    /// Path to the yt-dlp binary
    pub yt_dlp_path: String,

    /// Download attempts before giving up on HTTP 403 responses
    pub max_retries: u32,

    /// Initial retry delay in seconds (doubles per attempt)
    pub initial_retry_delay_secs: u64,

    /// Caption languages to look for, in order of preference
    pub caption_languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Whisper CLI binary
    pub binary: String,

    /// Model name (tiny, base, small, medium, large)
    pub model: String,

    /// Language hint (auto-detect if not set)
    pub language: Option<String>,

    /// Maximum time to wait for a transcription run, in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Translation endpoint
    pub endpoint: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Pause between chunk requests in milliseconds
    pub chunk_pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Temporary directory for downloads
    pub temp_dir: Option<PathBuf>,

    /// Keep audio files after transcription
    pub keep_audio: bool,

    /// Default output format
    pub default_output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YoutubeConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                max_retries: 3,
                initial_retry_delay_secs: 1,
                caption_languages: vec!["en".to_string()],
            },
            whisper: WhisperConfig {
                binary: "whisper".to_string(),
                model: "base".to_string(),
                language: None,
                timeout_secs: 1800,
            },
            translation: TranslationConfig {
                endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
                request_timeout_secs: 30,
                chunk_pause_ms: 500,
            },
            app: AppConfig {
                temp_dir: None,
                keep_audio: false,
                default_output_format: "text".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tubescribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.youtube.max_retries == 0 {
            anyhow::bail!("youtube.max_retries must be at least 1");
        }

        if self.youtube.caption_languages.is_empty() {
            anyhow::bail!("youtube.caption_languages must list at least one language");
        }

        if self.whisper.model.trim().is_empty() {
            anyhow::bail!("whisper.model must be set");
        }

        Url::parse(&self.translation.endpoint)
            .context("translation.endpoint is not a valid URL")?;

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  yt-dlp: {}", self.youtube.yt_dlp_path);
        println!("  Caption Languages: {}", self.youtube.caption_languages.join(", "));
        println!("  Whisper Binary: {}", self.whisper.binary);
        println!("  Whisper Model: {}", self.whisper.model);
        if let Some(lang) = &self.whisper.language {
            println!("  Whisper Language: {}", lang);
        }
        println!("  Translation Endpoint: {}", self.translation.endpoint);
        println!("  Keep Audio: {}", self.app.keep_audio);
        println!("  Default Format: {}", self.app.default_output_format);
    }

    /// Print the location of the config file
    pub fn display_path() -> Result<()> {
        println!("Configuration file:");
        println!("  {}", Self::config_path()?.display());
        println!("Edit it to change yt-dlp, Whisper, or translation settings.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_retries_rejected() {
        let mut config = Config::default();
        config.youtube.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_caption_languages_rejected() {
        let mut config = Config::default();
        config.youtube.caption_languages.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_whisper_model_rejected() {
        let mut config = Config::default();
        config.whisper.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_endpoint_rejected() {
        let mut config = Config::default();
        config.translation.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_roundtrips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.youtube.yt_dlp_path, config.youtube.yt_dlp_path);
        assert_eq!(parsed.whisper.model, config.whisper.model);
        assert_eq!(parsed.translation.endpoint, config.translation.endpoint);
    }
}
