//! OpenAI chat completions client, also used for OpenAI-compatible APIs (xAI)

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{self, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_MS};
use super::traits::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError, ProviderResult,
    Usage,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";

/// Client for the `/chat/completions` endpoint
pub struct OpenAIClient {
    name: String,
    base_url: String,
    http_client: Client,
    temperature: Option<f32>,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a client for api.openai.com
    pub fn new() -> Self {
        Self {
            name: "openai".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            http_client: http::build_client(DEFAULT_TIMEOUT_MS),
            temperature: None,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Create a client for xAI's OpenAI-compatible endpoint
    pub fn xai() -> Self {
        Self::new().with_name("xai").with_base_url(XAI_BASE_URL)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
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

    fn build_body(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages: Vec<OpenAIMessage> = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(system.clone()),
            });
        }
        messages.extend(request.messages.iter().map(OpenAIMessage::from));

        OpenAIRequest {
            model: request.model.clone(),
            messages,
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            temperature: request.temperature.or(self.temperature),
        }
    }
}

impl Default for OpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    /// Null when the model refuses or only calls tools
    content: Option<String>,
}

impl From<&Message> for OpenAIMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.clone(),
            content: Some(msg.content.clone()),
        }
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    /// xAI reports spend alongside token counts
    #[serde(default)]
    cost_in_usd_ticks: Option<u64>,
}

#[derive(Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OpenAIError>(body)
        .ok()
        .map(|e| e.error.message)
}

/// xAI bills in ticks of 1e-10 USD
const USD_PER_TICK: f64 = 1e-10;

fn parse_response(body: &str, latency_ms: u64) -> ProviderResult<CompletionResponse> {
    let api_response: OpenAIResponse = http::parse_body(body)?;

    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    let usage = api_response.usage.as_ref().map(|u| Usage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });
    let cost_usd = api_response
        .usage
        .and_then(|u| u.cost_in_usd_ticks)
        .map(|ticks| ticks as f64 * USD_PER_TICK);

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        model: api_response.model,
        usage,
        cost_usd,
        finish_reason: choice.finish_reason,
        latency_ms,
    })
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();
        let body = self.build_body(request);

        tracing::debug!("POST {}/chat/completions model={}", self.base_url, body.model);

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(request.api_key.expose())
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
