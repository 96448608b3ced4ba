use anyhow::Result;
use futures_util::future::join_all;
use std::path::Path;

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, spaces, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' || c == '.' => c,
                // Replace everything else with underscore
                _ => '_',
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Check if a file exists and is readable
pub fn check_file_accessible(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }

    // Try to read metadata to check permissions
    std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Cannot access file {}: {}", path.display(), e))?;

    Ok(())
}

/// Generate a unique filename with timestamp
pub fn generate_unique_filename(base_name: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let random_suffix = uuid::Uuid::new_v4().to_string()[..8].to_string();

    format!(
        "{}_{}_{}_{}.{}",
        "tubescribe",
        sanitize_filename(base_name),
        timestamp,
        random_suffix,
        extension
    )
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp: &str, whisper: &str) -> Vec<String> {
    let checks = [
        (yt_dlp, "required for YouTube metadata and audio download"),
        ("ffmpeg", "required by yt-dlp for audio extraction"),
        (whisper, "required when a video has no captions"),
    ];

    let results = join_all(checks.iter().map(|(cmd, _)| check_command_available(cmd))).await;

    checks
        .iter()
        .zip(results)
        .filter(|(_, available)| !available)
        .map(|((cmd, reason), _)| format!("{} - {}", cmd, reason))
        .collect()
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    // --help rather than --version: the Python whisper CLI has no version flag
    Command::new(command)
        .arg("--help")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
