//! Anthropic (Claude) messages API client

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{self, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_MS};
use super::traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderResult, Usage,
};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicClient {
    base_url: String,
    http_client: Client,
    temperature: Option<f32>,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new() -> Self {
        Self {
            base_url: ANTHROPIC_BASE_URL.to_string(),
            http_client: http::build_client(DEFAULT_TIMEOUT_MS),
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.http_client = http::build_client(timeout_ms);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> AnthropicRequest {
        // The messages API takes the system prompt as a top-level field
        let system = request.system_prompt.clone().or_else(|| {
            request
                .messages
                .iter()
                .find(|m| m.role == "system")
                .map(|m| m.content.clone())
        });

        let messages = request
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(AnthropicMessage::from)
            .collect();

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            messages,
            system,
            temperature: request.temperature.or(self.temperature),
        }
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

impl From<&Message> for AnthropicMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct AnthropicError {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<AnthropicError>(body)
        .ok()
        .map(|e| e.error.message)
}

fn parse_response(body: &str, latency_ms: u64) -> ProviderResult<CompletionResponse> {
    let api_response: AnthropicResponse = http::parse_body(body)?;

    let content = api_response
        .content
        .into_iter()
        .filter(|block| block.content_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    Ok(CompletionResponse {
        content,
        model: api_response.model,
        usage: api_response.usage.map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
        cost_usd: None,
        finish_reason: api_response.stop_reason,
        latency_ms,
    })
}

#[async_trait]
impl LLMProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();
        let body = self.build_body(request);

        tracing::debug!("POST {}/messages model={}", self.base_url, body.model);

        let response = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", request.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(http::error_for_status(response, error_message).await);
        }

        let text = response.text().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        parse_response(&text, latency_ms)
    }
}
