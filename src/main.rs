use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubescribe::cli::{Cli, Commands, OutputFormat};
use tubescribe::config::Config;
use tubescribe::transcribe::{PipelineOptions, TranscriptionPipeline};
use tubescribe::translate::{self, TranslationClient};
use tubescribe::youtube::{VideoId, YoutubeClient};
use tubescribe::{output, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "tubescribe=debug"
    } else {
        "tubescribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().await?;

    // Check for required external dependencies (non-fatal)
    if !cli.quiet {
        let missing =
            utils::check_dependencies(&config.youtube.yt_dlp_path, &config.whisper.binary).await;
        if !missing.is_empty() {
            eprintln!("⚠️  Dependency check warnings:");
            for dep in missing {
                eprintln!("   • {}", dep);
            }
            eprintln!("   (Continuing anyway - tools may be available)");
        }
    }

    match cli.command {
        Commands::Transcribe {
            url,
            output: output_path,
            format,
            translate_to,
            language,
            no_captions,
            model,
            save_audio,
            timestamps,
        } => {
            let format = resolve_format(format, &config)?;
            let options = PipelineOptions {
                no_captions,
                model,
                language,
                translate_to,
                save_audio,
            };
            let pipeline = TranscriptionPipeline::new(config, options)?;

            tracing::info!("Starting transcription for URL: {}", url);

            let result = pipeline.transcribe(&url).await?;

            match output_path {
                Some(path) => {
                    output::save_to_file(&result, &path, &format, timestamps).await?;
                    println!("Transcription saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&result, &format, timestamps)?;
                }
            }

            if let Some(audio_path) = &result.audio_path {
                println!("Audio saved to: {}", audio_path.display());
            }
        }
        Commands::Translate {
            input,
            to,
            output: output_path,
            detect_only,
        } => {
            let text = read_input(&input)?;
            let client = TranslationClient::new(&config.translation)?;

            if detect_only {
                let detected = client.detect_language(&text).await?;
                match translate::display_name(&detected) {
                    Some(name) => println!("{} ({})", detected, name),
                    None => println!("{}", detected),
                }
            } else {
                let to = to.ok_or_else(|| {
                    anyhow::anyhow!("--to <LANG> is required unless --detect-only is set")
                })?;
                let translated = client.translate(&text, &to).await?;

                match output_path {
                    Some(path) => {
                        fs_err::write(&path, &translated)?;
                        println!("Translation saved to: {}", path.display());
                    }
                    None => println!("{}", translated),
                }
            }
        }
        Commands::Info { url } => {
            let video_id = VideoId::parse(&url)?;
            let client = YoutubeClient::new(config.youtube.yt_dlp_path.clone());
            let video = client.probe(&video_id).await?;

            println!("{} {}", style("Title:").bold(), video.title);
            if let Some(uploader) = &video.uploader {
                println!("{} {}", style("Uploader:").bold(), uploader);
            }
            if let Some(duration) = video.duration {
                println!(
                    "{} {}",
                    style("Duration:").bold(),
                    utils::format_duration(duration)
                );
            }
            if let Some(thumbnail) = &video.thumbnail {
                println!("{} {}", style("Thumbnail:").bold(), thumbnail);
            }

            let mut manual: Vec<&String> = video.subtitles.keys().collect();
            manual.sort();
            let auto_count = video.automatic_captions.len();

            if manual.is_empty() && auto_count == 0 {
                println!(
                    "{} none (Whisper will be used)",
                    style("Captions:").bold()
                );
            } else {
                if !manual.is_empty() {
                    let langs = manual
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    println!("{} {}", style("Captions:").bold(), langs);
                }
                if auto_count > 0 {
                    println!(
                        "{} {} language(s)",
                        style("Auto captions:").bold(),
                        auto_count
                    );
                }
            }
        }
        Commands::Languages => {
            println!("Supported translation languages:");
            for (code, name) in translate::SUPPORTED_LANGUAGES {
                println!("  {:<6} {}", code, name);
            }
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                Config::display_path()?;
            }
        }
    }

    Ok(())
}

fn resolve_format(format: Option<OutputFormat>, config: &Config) -> Result<OutputFormat> {
    match format {
        Some(format) => Ok(format),
        None => OutputFormat::from_str(&config.app.default_output_format, true).map_err(|_| {
            anyhow::anyhow!(
                "Unknown default output format in config: {}",
                config.app.default_output_format
            )
        }),
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        use std::io::Read;

        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        let path = std::path::Path::new(input);
        utils::check_file_accessible(path)?;
        Ok(fs_err::read_to_string(path)?)
    }
}
