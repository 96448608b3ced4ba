use anyhow::Result;

use crate::transcribe::{TranscriptSegment, TranscriptionResult};

/// Plain text output. Translations take precedence over the original text;
/// timestamps only apply to the untranslated segments.
pub fn format_as_text(result: &TranscriptionResult, include_timestamps: bool) -> String {
    if let Some(translation) = &result.translation {
        return translation.text.clone();
    }

    if include_timestamps && !result.segments.is_empty() {
        let mut out = String::new();
        for segment in &result.segments {
            out.push_str(&format!(
                "[{}] {}\n",
                format_timestamp_brief(segment.start_time),
                segment.text
            ));
        }
        return out;
    }

    result.transcript.clone()
}

/// Pretty JSON of the full result, original and translation included
pub fn format_as_json(result: &TranscriptionResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// SRT subtitle format
pub fn format_as_srt(result: &TranscriptionResult) -> String {
    let mut out = String::new();
    for (index, segment) in effective_segments(result).iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp_srt(segment.start_time),
            format_timestamp_srt(segment.end_time),
            segment.text
        ));
    }
    out
}

/// WebVTT format
pub fn format_as_vtt(result: &TranscriptionResult) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in effective_segments(result) {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_timestamp_vtt(segment.start_time),
            format_timestamp_vtt(segment.end_time),
            segment.text
        ));
    }
    out
}

/// Subtitle formats need at least one cue; a segment-less transcript becomes
/// a single cue spanning the whole video.
fn effective_segments(result: &TranscriptionResult) -> Vec<TranscriptSegment> {
    if !result.segments.is_empty() {
        return result.segments.clone();
    }

    vec![TranscriptSegment {
        start_time: 0.0,
        end_time: result.video.duration.unwrap_or(0.0),
        text: result.transcript.clone(),
    }]
}

fn split_timestamp(seconds: f64) -> (u64, u64, u64, u64) {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let secs = (millis % 60_000) / 1000;
    (hours, minutes, secs, millis % 1000)
}

fn format_timestamp_srt(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

fn format_timestamp_vtt(seconds: f64) -> String {
    let (h, m, s, ms) = split_timestamp(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

fn format_timestamp_brief(seconds: f64) -> String {
    let (h, m, s, _) = split_timestamp(seconds);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
