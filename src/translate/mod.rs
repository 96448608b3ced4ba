use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::TranslationConfig;
use crate::TubescribeError;

/// The translation endpoint rejects payloads of 5000 characters or more.
pub const MAX_CHUNK_LENGTH: usize = 4999;

/// Supported target languages: code and display name
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh-cn", "Chinese (Simplified)"),
    ("hi", "Hindi"),
    ("ar", "Arabic"),
    ("bn", "Bengali"),
    ("ur", "Urdu"),
    ("te", "Telugu"),
    ("ta", "Tamil"),
    ("mr", "Marathi"),
    ("gu", "Gujarati"),
];

pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

pub fn display_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Map our language codes to what the wire format expects
fn wire_code(code: &str) -> &str {
    match code {
        "zh-cn" => "zh-CN",
        other => other,
    }
}

/// Client for the public Google Translate endpoint (the same service the
/// original deep-translator wrapper speaks to).
pub struct TranslationClient {
    client: Client,
    endpoint: String,
    chunk_pause: Duration,
}

impl TranslationClient {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build translation HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            chunk_pause: Duration::from_millis(config.chunk_pause_ms),
        })
    }

    /// Translate text into the target language. Long inputs are split into
    /// chunks under the endpoint's size limit and rejoined with spaces.
    pub async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TubescribeError::TranslationFailed(
                "text must be a non-empty string".to_string(),
            )
            .into());
        }

        if !is_supported(target) {
            return Err(TubescribeError::TranslationFailed(format!(
                "language code '{}' not supported (see the `languages` command)",
                target
            ))
            .into());
        }

        // English input stays as-is
        if target == "en" {
            return Ok(text.to_string());
        }

        let chunks = chunk_text(text, MAX_CHUNK_LENGTH);
        let pacing = chunks.len() > 1;
        tracing::debug!("Translating {} chunk(s) to {}", chunks.len(), target);

        let mut translated_chunks = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            // Pace chunk requests to stay under the endpoint's rate limits
            if pacing && i > 0 {
                sleep(self.chunk_pause).await;
            }

            let translated = self.translate_chunk(chunk, target).await?;
            if translated.trim().is_empty() {
                return Err(TubescribeError::TranslationFailed(
                    "translation produced no result".to_string(),
                )
                .into());
            }
            translated_chunks.push(translated);
        }

        Ok(translated_chunks.join(" "))
    }

    /// Detect the language of the given text.
    pub async fn detect_language(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TubescribeError::TranslationFailed(
                "text must be a non-empty string".to_string(),
            )
            .into());
        }

        // Detection reuses the translate call; the response carries the
        // detected source language alongside the translation.
        let sample = chunk_text(text, MAX_CHUNK_LENGTH)
            .into_iter()
            .next()
            .unwrap_or_default();
        let payload = self.request(&sample, "en").await?;

        parse_detected_language(&payload)
    }

    async fn translate_chunk(&self, chunk: &str, target: &str) -> Result<String> {
        let payload = self.request(chunk, wire_code(target)).await?;
        parse_translation(&payload)
    }

    async fn request(&self, text: &str, target: &str) -> Result<Value> {
        let url = format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.endpoint,
            target,
            urlencoding::encode(text)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Translation request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Translation request failed: HTTP {}", response.status());
        }

        response
            .json::<Value>()
            .await
            .context("Failed to parse translation response")
    }
}

/// The gtx response is a nested array: element 0 holds the translated
/// sentence fragments, element 2 the detected source language.
fn parse_translation(payload: &Value) -> Result<String> {
    let fragments = payload
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("Unexpected translation response shape"))?;

    let mut result = String::new();
    for fragment in fragments {
        if let Some(text) = fragment.get(0).and_then(|v| v.as_str()) {
            result.push_str(text);
        }
    }

    if result.trim().is_empty() {
        anyhow::bail!("Translation response contained no text");
    }

    Ok(result.trim().to_string())
}

fn parse_detected_language(payload: &Value) -> Result<String> {
    payload
        .get(2)
        .and_then(|v| v.as_str())
        .map(|lang| lang.to_lowercase())
        .ok_or_else(|| anyhow::anyhow!("Translation response carried no detected language"))
}

/// Split text into chunks of at most `max_len` bytes, breaking on char
/// boundaries and preferring whitespace splits.
fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.len() > max_len {
        let mut split = max_len;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }

        if let Some(ws) = rest[..split].rfind(char::is_whitespace) {
            if ws > 0 {
                split = ws;
            }
        }

        let (head, tail) = rest.split_at(split);
        let head = head.trim_end();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client() -> TranslationClient {
        TranslationClient::new(&Config::default().translation).unwrap()
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("hello world", MAX_CHUNK_LENGTH);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn long_text_splits_on_whitespace() {
        let word = "word ";
        let text = word.repeat(1200); // 6000 chars
        let chunks = chunk_text(&text, MAX_CHUNK_LENGTH);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= MAX_CHUNK_LENGTH);
            // Whitespace-preferring splits never cut a word in half
            assert!(chunk.split_whitespace().all(|w| w == "word"));
        }
    }

    #[test]
    fn unbroken_text_splits_at_char_boundaries() {
        let text = "x".repeat(MAX_CHUNK_LENGTH + 100);
        let chunks = chunk_text(&text, MAX_CHUNK_LENGTH);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), MAX_CHUNK_LENGTH);
    }

    #[test]
    fn multibyte_text_never_splits_inside_a_char() {
        let text = "ü".repeat(MAX_CHUNK_LENGTH); // 2 bytes each
        let chunks = chunk_text(&text, MAX_CHUNK_LENGTH);
        assert!(chunks.len() >= 2);
        let rejoined: String = chunks.concat();
        assert_eq!(rejoined, text);
    }

    #[test]
    fn supported_language_lookups() {
        assert!(is_supported("es"));
        assert!(is_supported("zh-cn"));
        assert!(!is_supported("xx"));
        assert_eq!(display_name("de"), Some("German"));
        assert_eq!(display_name("xx"), None);
    }

    #[test]
    fn wire_code_maps_chinese() {
        assert_eq!(wire_code("zh-cn"), "zh-CN");
        assert_eq!(wire_code("fr"), "fr");
    }

    #[test]
    fn parses_gtx_translation_response() {
        let payload: Value = serde_json::from_str(
            r#"[[["Hola ","Hello ",null,null,10],["mundo","world",null,null,10]],null,"en"]"#,
        )
        .unwrap();
        assert_eq!(parse_translation(&payload).unwrap(), "Hola mundo");
        assert_eq!(parse_detected_language(&payload).unwrap(), "en");
    }

    #[test]
    fn malformed_response_is_an_error() {
        let payload: Value = serde_json::from_str(r#"{"error": "nope"}"#).unwrap();
        assert!(parse_translation(&payload).is_err());
        assert!(parse_detected_language(&payload).is_err());
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        assert!(client().translate("   ", "es").await.is_err());
        assert!(client().detect_language(" \n ").await.is_err());
    }

    #[tokio::test]
    async fn unsupported_target_is_rejected() {
        assert!(client().translate("hello", "xx").await.is_err());
    }

    #[tokio::test]
    async fn english_target_returns_input_unchanged() {
        let result = client().translate("  hello world  ", "en").await.unwrap();
        assert_eq!(result, "hello world");
    }
}
