use anyhow::Result;
use std::path::Path;

use crate::cli::OutputFormat;
use crate::transcribe::TranscriptionResult;

pub mod formatters;

pub use formatters::*;

/// Save transcription result to file
pub async fn save_to_file(
    result: &TranscriptionResult,
    path: &Path,
    format: &OutputFormat,
    include_timestamps: bool,
) -> Result<()> {
    let content = render(result, format, include_timestamps)?;
    fs_err::write(path, content)?;
    Ok(())
}

/// Print transcription result to console
pub fn print_to_console(
    result: &TranscriptionResult,
    format: &OutputFormat,
    include_timestamps: bool,
) -> Result<()> {
    println!("{}", render(result, format, include_timestamps)?);
    Ok(())
}

fn render(
    result: &TranscriptionResult,
    format: &OutputFormat,
    include_timestamps: bool,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format_as_text(result, include_timestamps),
        OutputFormat::Json => format_as_json(result)?,
        OutputFormat::Srt => format_as_srt(result),
        OutputFormat::Vtt => format_as_vtt(result),
    })
}
