//! Google Gemini `generateContent` client

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{self, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_MS};
use super::traits::{
    CompletionRequest, CompletionResponse, LLMProvider, ProviderError, ProviderResult, Usage,
};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client
pub struct GoogleClient {
    base_url: String,
    http_client: Client,
    temperature: Option<f32>,
    max_tokens: u32,
}

impl GoogleClient {
    pub fn new() -> Self {
        Self {
            base_url: GOOGLE_BASE_URL.to_string(),
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

    fn build_body(&self, request: &CompletionRequest) -> GeminiRequest {
        let system = request.system_prompt.clone().or_else(|| {
            request
                .messages
                .iter()
                .find(|m| m.role == "system")
                .map(|m| m.content.clone())
        });

        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != "system")
            .map(|m| GeminiContent {
                // Gemini calls the assistant side "model"
                role: Some(if m.role == "assistant" { "model" } else { "user" }.to_string()),
                parts: vec![Part { text: Some(m.content.clone()) }],
            })
            .collect();

        GeminiRequest {
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![Part { text: Some(text) }],
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature.or(self.temperature),
                max_output_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            },
        }
    }
}

impl Default for GoogleClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiError>(body)
        .ok()
        .map(|e| e.error.message)
}

fn parse_response(body: &str, requested_model: &str, latency_ms: u64) -> ProviderResult<CompletionResponse> {
    let api_response: GeminiResponse = http::parse_body(body)?;

    let candidate = api_response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("No candidates in response".to_string()))?;

    let content = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content,
        model: api_response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        usage: api_response.usage_metadata.map(|u| Usage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        }),
        cost_usd: None,
        finish_reason: candidate.finish_reason,
        latency_ms,
    })
}

#[async_trait]
impl LLMProvider for GoogleClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let start = Instant::now();
        let body = self.build_body(request);

        tracing::debug!("POST {}/models/{}:generateContent", self.base_url, request.model);

        let response = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header("x-goog-api-key", request.api_key.expose())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(http::error_for_status(response, error_message).await);
        }

        let text = response.text().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        parse_response(&text, &request.model, latency_ms)
    }
}
