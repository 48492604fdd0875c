//! Gemini API client struct and request building.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use tanya_common::Role;

use crate::{Prompt, ProviderError, Turn};

use super::config::{GeminiConfig, HistoryStyle};

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    pub(crate) fn api_url(&self, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        format!("{}/{}:{}", GEMINI_API_BASE, self.config.model, method)
    }

    /// Build the JSON request body for the Gemini API.
    ///
    /// Prior turns are shaped per `HistoryStyle`; error-role turns never
    /// reach the provider. The new prompt becomes the last `user` entry,
    /// with one base64 `inlineData` part per attachment.
    pub(crate) fn build_request_body(
        &self,
        history: &[Turn],
        prompt: &Prompt,
    ) -> serde_json::Value {
        let mut contents = Vec::new();

        match self.config.history_style {
            HistoryStyle::RoleTagged => {
                for turn in history {
                    let role = match turn.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                        Role::Error => continue,
                    };
                    contents.push(serde_json::json!({
                        "role": role,
                        "parts": [{ "text": turn.content }]
                    }));
                }
            }
            HistoryStyle::Flattened => {
                let flat: Vec<&str> = history
                    .iter()
                    .filter(|turn| turn.role != Role::Error)
                    .map(|turn| turn.content.as_str())
                    .collect();
                if !flat.is_empty() {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{ "text": flat.join("\n\n") }]
                    }));
                }
            }
        }

        let mut parts = vec![serde_json::json!({ "text": prompt.text })];
        for attachment in &prompt.attachments {
            parts.push(serde_json::json!({
                "inlineData": {
                    "mimeType": attachment.mime_type,
                    "data": BASE64.encode(&attachment.data),
                }
            }));
        }
        contents.push(serde_json::json!({ "role": "user", "parts": parts }));

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        });

        if let Some(ref instruction) = self.config.system_instruction {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": instruction }]
            });
        }

        body
    }

    /// Parse a non-streaming `generateContent` response into its text.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<String, ProviderError> {
        let candidates = json["candidates"]
            .as_array()
            .ok_or_else(|| ProviderError::Parse("no candidates in response".to_string()))?;

        let first = candidates
            .first()
            .ok_or_else(|| ProviderError::Parse("empty candidates".to_string()))?;

        let parts = first["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut content = String::new();
        for part in &parts {
            if let Some(text) = part["text"].as_str() {
                content.push_str(text);
            }
        }

        Ok(content)
    }
}
