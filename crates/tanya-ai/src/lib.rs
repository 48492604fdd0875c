//! Conversation engine for tanya.
//!
//! Provides the Gemini streaming client and the conversation `Session` with:
//! - Streaming (SSE) support with per-chunk delivery
//! - Pending-input draft management, including image attachments
//! - Stale-request fencing so a reset drops late callbacks
//! - Transition events over a broadcast bus

pub mod gemini;
pub mod session;
pub mod streaming;

use async_trait::async_trait;

use tanya_common::{Attachment, Role};

pub use gemini::{GeminiClient, GeminiConfig, HistoryStyle};
pub use session::{HistoryMode, Outbound, RequestId, SendOutcome, Session};

/// A role-tagged history entry sent to the provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// The committed user input for one generation request.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Prompt {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }
}

#[async_trait]
pub trait GenerateClient: Send + Sync {
    /// Stream a reply for `prompt`, given the prior `history`.
    ///
    /// Chunks are delivered through `on_chunk` in arrival order. The returned
    /// string is the provider's final resolved text, which may differ from
    /// the concatenation of the streamed chunks.
    async fn generate(
        &self,
        history: &[Turn],
        prompt: &Prompt,
        on_chunk: Box<dyn Fn(String) + Send + Sync>,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The API rejected the request; carries the provider's own message.
    #[error("{0}")]
    Api(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("rate limited")]
    RateLimited,
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("request timed out")]
    Timeout,
}

impl From<ProviderError> for tanya_common::TanyaError {
    fn from(error: ProviderError) -> Self {
        tanya_common::TanyaError::Provider(error.to_string())
    }
}
