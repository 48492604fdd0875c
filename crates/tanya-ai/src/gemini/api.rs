//! GenerateClient trait implementation for GeminiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::streaming::{read_sse_events, SseEvent};
use crate::{GenerateClient, Prompt, ProviderError, Turn};

use super::client::GeminiClient;

/// Pull the text parts out of one streamed response frame.
fn extract_text(data: &serde_json::Value) -> String {
    let mut chunk = String::new();
    if let Some(candidates) = data["candidates"].as_array() {
        for candidate in candidates {
            if let Some(parts) = candidate["content"]["parts"].as_array() {
                for part in parts {
                    if let Some(text) = part["text"].as_str() {
                        chunk.push_str(text);
                    }
                }
            }
        }
    }
    chunk
}

/// Decode one SSE data payload. Every frame on this endpoint is a JSON
/// document; anything else is a parse failure, not a skippable frame.
fn parse_frame(data: &str) -> Result<String, ProviderError> {
    let value: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| ProviderError::Parse(format!("bad stream frame: {e}")))?;
    Ok(extract_text(&value))
}

fn network_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(error.to_string())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited);
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api(format!("HTTP {status}: {text}")));
    }
    Ok(response)
}

impl GeminiClient {
    /// One-shot generation via the non-streaming `generateContent` endpoint.
    pub async fn generate_once(
        &self,
        history: &[Turn],
        prompt: &Prompt,
    ) -> Result<String, ProviderError> {
        let body = self.build_request_body(history, prompt);
        let url = self.api_url(false);

        debug!(model = %self.config.model, turns = history.len(), "Gemini request");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        self.parse_response(json)
    }
}

#[async_trait]
impl GenerateClient for GeminiClient {
    async fn generate(
        &self,
        history: &[Turn],
        prompt: &Prompt,
        on_chunk: Box<dyn Fn(String) + Send + Sync>,
    ) -> Result<String, ProviderError> {
        let body = self.build_request_body(history, prompt);
        let url = format!("{}?alt=sse", self.api_url(true));

        debug!(
            model = %self.config.model,
            turns = history.len(),
            attachments = prompt.attachments.len(),
            "Gemini streaming request"
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response).await?;

        let mut resolved = String::new();
        let mut frame_error: Option<ProviderError> = None;
        read_sse_events(response, |event: SseEvent| match parse_frame(&event.data) {
            Ok(chunk) => {
                if !chunk.is_empty() {
                    resolved.push_str(&chunk);
                    on_chunk(chunk);
                }
            }
            Err(error) => {
                if frame_error.is_none() {
                    frame_error = Some(error);
                }
            }
        })
        .await?;

        if let Some(error) = frame_error {
            return Err(error);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_concatenates_parts() {
        let data = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "Hello" }, { "text": ", world" }]
                }
            }]
        });
        assert_eq!(extract_text(&data), "Hello, world");
    }

    #[test]
    fn extract_text_handles_missing_candidates() {
        let data = serde_json::json!({ "usageMetadata": { "promptTokenCount": 3 } });
        assert_eq!(extract_text(&data), "");
    }

    #[test]
    fn extract_text_skips_non_text_parts() {
        let data = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "inlineData": { "mimeType": "image/png" } }, { "text": "ok" }]
                }
            }]
        });
        assert_eq!(extract_text(&data), "ok");
    }

    #[test]
    fn parse_frame_reads_json_payloads() {
        let chunk = parse_frame("{\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}]}")
            .unwrap();
        assert_eq!(chunk, "Hi");
    }

    #[test]
    fn parse_frame_rejects_garbage() {
        let error = parse_frame("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(error, ProviderError::Parse(_)));
    }
}
