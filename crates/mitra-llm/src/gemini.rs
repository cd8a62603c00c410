//! Google Gemini API client with streaming support.

use async_trait::async_trait;
use futures::StreamExt;
use mitra_core::EvalError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{TextGenerator, TextStream};

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamEvent {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiErrorBody>,
}

/// Client for the Gemini `streamGenerateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, api_base: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let model = model.into();
        info!("GeminiClient: model={}, api_key_len={}", model, api_key.len());
        Self {
            client: Client::new(),
            api_key,
            model,
            api_base: api_base.into(),
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream, EvalError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EvalError::Llm(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EvalError::Llm(format!("Gemini API error {}: {}", status, body)));
        }

        // SSE events are newline-terminated, so an unterminated tail at end-of-stream is dropped.
        let mapped = response
            .bytes_stream()
            .scan(Vec::new(), |buffer, result| {
                let pieces = match result {
                    Err(e) => vec![Err(EvalError::Llm(e.to_string()))],
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);
                        drain_events(buffer)
                    }
                };
                futures::future::ready(Some(pieces))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(mapped))
    }
}

/// Parses every complete line in `buffer`, leaving a partial line behind.
///
/// Works on bytes so a UTF-8 sequence split across network reads is only
/// decoded once its line is complete.
fn drain_events(buffer: &mut Vec<u8>) -> Vec<Result<String, EvalError>> {
    let mut pieces = Vec::new();

    while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                pieces.push(Err(EvalError::Decoding(e.to_string())));
                continue;
            }
        };

        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };
        let payload = payload.trim();
        if payload.is_empty() || payload == "[DONE]" {
            continue;
        }

        let event: StreamEvent = match serde_json::from_str(payload) {
            Ok(e) => e,
            Err(e) => {
                error!("Failed to parse Gemini event: {} - {}", e, payload);
                continue;
            }
        };

        if let Some(err) = event.error {
            pieces.push(Err(EvalError::Llm(err.message)));
            continue;
        }

        if let Some(usage) = event.usage_metadata {
            debug!(
                input_tokens = usage.prompt_token_count.unwrap_or(0),
                output_tokens = usage.candidates_token_count.unwrap_or(0),
                "Gemini usage"
            );
        }

        let texts = event
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .filter(|t| !t.is_empty());
        pieces.extend(texts.map(Ok));
    }

    pieces
}
