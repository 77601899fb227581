//! Provider trait definitions for LLM API clients

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// API credential for a single request, redacted from debug output
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Request for a completion from an LLM provider
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub api_key: ApiKey,
    pub model: String,
    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,
    /// Falls back to the client's setting when unset
    pub max_tokens: Option<u32>,
    /// Falls back to the client's setting when unset
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(api_key: ApiKey, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            api_key,
            model: model.into(),
            messages,
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Response from an LLM provider.
///
/// Every adapter returns this shape; fields a provider doesn't report are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    /// Model name as resolved by the provider
    pub model: String,
    pub usage: Option<Usage>,
    pub cost_usd: Option<f64>,
    pub finish_reason: Option<String>,
    pub latency_ms: u64,
}

impl CompletionResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            usage: None,
            cost_usd: None,
            finish_reason: None,
            latency_ms: 0,
        }
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider family name (e.g., "openai", "anthropic", "google", "xai")
    fn name(&self) -> &str;

    /// Send a completion request
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse>;

    /// Ask a single question under a system prompt
    async fn ask(
        &self,
        api_key: ApiKey,
        model: &str,
        system_prompt: &str,
        prompt: &str,
    ) -> ProviderResult<CompletionResponse> {
        let request = CompletionRequest::new(api_key, model, vec![Message::user(prompt)])
            .with_system(system_prompt);
        self.complete(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("sk-secret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.expose(), "sk-secret");

        let request = CompletionRequest::new(key, "gpt-4o", vec![Message::user("hi")]);
        assert!(!format!("{:?}", request).contains("sk-secret"));
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new(ApiKey::new("k"), "m", vec![Message::user("q")])
            .with_system("be brief")
            .with_max_tokens(64)
            .with_temperature(0.0);

        assert_eq!(request.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.messages, vec![Message::user("q")]);
    }
}
