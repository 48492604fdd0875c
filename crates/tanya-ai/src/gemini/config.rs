//! Gemini API client configuration.

use crate::ProviderError;

/// How prior turns are shaped into the request payload.
///
/// The API accepts either role-tagged `contents` entries or a single
/// flattened text block; which reads better depends on the model and
/// prompt style, so it is a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryStyle {
    /// Each prior turn becomes its own `user`/`model` entry.
    #[default]
    RoleTagged,
    /// Prior turns are concatenated into one plain-text user entry.
    Flattened,
}

/// Gemini API client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub system_instruction: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub history_style: HistoryStyle,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("system_instruction", &self.system_instruction)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("history_style", &self.history_style)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-1.5-flash".to_string(),
            system_instruction: None,
            max_tokens: 4096,
            temperature: 0.7,
            history_style: HistoryStyle::default(),
        }
    }

    /// Build from the `GEMINI_API_KEY` environment variable, the only
    /// environment contract this crate has.
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::Config("GEMINI_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_history_style(mut self, style: HistoryStyle) -> Self {
        self.history_style = style;
        self
    }
}
