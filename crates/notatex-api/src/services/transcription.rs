//! External document transcription collaborator.
//!
//! The [Transcriber] trait is the capability handed to the document
//! assembly handler; [GeminiTranscriber] implements it against the Google
//! Gemini generateContent API. The collaborator is an opaque black box:
//! no retries, no backoff, no partial results.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use notatex_core::AppError;
use serde::Deserialize;
use serde_json::json;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT_SECS: u64 = 120;
const TEMPERATURE: f64 = 0.2;

const PROMPT: &str = r"
You are a LaTeX transcription engine.

Task:
- I will provide multiple images (ordered pages) of notes.
- Produce ONE complete LaTeX document that compiles as-is.

Requirements:
- Output ONLY the LaTeX source (no markdown fences, no commentary).
- Use \documentclass{article} and include a minimal preamble:
  amsmath, amssymb, amsthm, geometry, hyperref.
- Preserve headings/sections as best you can.
- Use display math environments (equation/align) when appropriate.
- If something is unreadable, insert: \textbf{[illegible]}.
- DO NOT EVER PUT IMAGES IN THE LATEX.
";

/// One page of input for the transcriber. Vec order defines page order.
#[derive(Debug, Clone)]
pub struct PageSource {
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

/// Converts ordered page images into a single LaTeX document.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn generate(&self, pages: Vec<PageSource>) -> Result<String, AppError>;
}

/// Infer the image mime type from a storage key's extension.
pub fn guess_mime(path: &str) -> Result<&'static str, AppError> {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("webp") => Ok("image/webp"),
        other => Err(AppError::InvalidInput(format!(
            "Unsupported image type: {}",
            other.unwrap_or("none")
        ))),
    }
}

/// Gemini generateContent client.
pub struct GeminiTranscriber {
    http_client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiTranscriber {
    pub fn new(api_key: Option<String>, model: String) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client for the Gemini API")?;

        Ok(Self {
            http_client,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }
}

fn build_request_body(pages: &[PageSource]) -> serde_json::Value {
    use base64::Engine;

    let mut parts = vec![json!({ "text": PROMPT })];
    for page in pages {
        parts.push(json!({
            "inline_data": {
                "mime_type": page.mime_type,
                "data": base64::engine::general_purpose::STANDARD.encode(&page.data),
            }
        }));
    }

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": { "temperature": TEMPERATURE },
    })
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn generate(&self, pages: Vec<PageSource>) -> Result<String, AppError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Transcription("GEMINI_API_KEY is not configured".to_string())
        })?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request_body = build_request_body(&pages);

        tracing::info!(
            model = %self.model,
            page_count = pages.len(),
            "Requesting LaTeX transcription"
        );

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                AppError::Transcription(format!("Failed to send request to the Gemini API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Transcription(format!(
                "Gemini API request failed: {} - {}",
                status, error_text
            )));
        }

        let generated: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::Transcription(format!("Failed to parse Gemini API response: {}", e))
        })?;

        Ok(generated.text())
    }
}

// Gemini API response types
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate; empty when absent.
    fn text(&self) -> String {
        self.candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("1/note.jpg").unwrap(), "image/jpeg");
        assert_eq!(guess_mime("1/note.JPEG").unwrap(), "image/jpeg");
        assert_eq!(guess_mime("1/note.png").unwrap(), "image/png");
        assert_eq!(guess_mime("1/note.webp").unwrap(), "image/webp");
        assert!(guess_mime("1/note.gif").is_err());
        assert!(guess_mime("1/noextension").is_err());
    }

    #[test]
    fn test_build_request_body_orders_pages_after_prompt() {
        let pages = vec![
            PageSource {
                mime_type: "image/png",
                data: b"first".to_vec(),
            },
            PageSource {
                mime_type: "image/jpeg",
                data: b"second".to_vec(),
            },
        ];

        let body = build_request_body(&pages);
        let parts = body["contents"][0]["parts"].as_array().expect("parts");

        assert_eq!(parts.len(), 3);
        assert!(parts[0]["text"]
            .as_str()
            .expect("prompt")
            .contains("LaTeX transcription engine"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[2]["inline_data"]["mime_type"], "image/jpeg");

        use base64::Engine;
        assert_eq!(
            parts[1]["inline_data"]["data"].as_str().expect("data"),
            base64::engine::general_purpose::STANDARD.encode(b"first")
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.2);
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "\\documentclass{article}" },
                        { "text": "\\begin{document}" }
                    ]
                }
            }]
        });

        let response: GenerateContentResponse = serde_json::from_value(raw).expect("parse");
        assert_eq!(
            response.text(),
            "\\documentclass{article}\\begin{document}"
        );
    }

    #[test]
    fn test_response_text_defaults_to_empty() {
        let response: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).expect("parse");
        assert_eq!(response.text(), "");
    }

    #[tokio::test]
    async fn test_generate_without_api_key_fails() {
        let transcriber =
            GeminiTranscriber::new(None, "gemini-2.0-flash".to_string()).expect("client");

        let result = transcriber.generate(Vec::new()).await;
        assert!(matches!(result, Err(AppError::Transcription(_))));
    }
}
