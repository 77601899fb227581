//! LLM Provider implementations

pub mod anthropic;
pub mod google;
pub(crate) mod http;
pub mod openai;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use openai::OpenAIClient;
pub use traits::{
    ApiKey, CompletionRequest, CompletionResponse, LLMProvider, Message, ProviderError,
    ProviderResult, Usage,
};

use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderKind, RunConfig};

/// Build the API client for a configured provider
pub fn create_provider(
    provider: &ProviderConfig,
    run: &RunConfig,
) -> Arc<dyn LLMProvider + Send + Sync> {
    match provider.kind {
        ProviderKind::OpenAI | ProviderKind::Xai => {
            let mut client = if provider.kind == ProviderKind::Xai {
                OpenAIClient::xai()
            } else {
                OpenAIClient::new()
            };
            if let Some(url) = &provider.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(
                client
                    .with_timeout_ms(run.timeout_ms)
                    .with_max_tokens(run.max_tokens)
                    .with_temperature(provider.temperature),
            )
        }
        ProviderKind::Anthropic => {
            let mut client = AnthropicClient::new();
            if let Some(url) = &provider.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(
                client
                    .with_timeout_ms(run.timeout_ms)
                    .with_max_tokens(run.max_tokens)
                    .with_temperature(provider.temperature),
            )
        }
        ProviderKind::Google => {
            let mut client = GoogleClient::new();
            if let Some(url) = &provider.base_url {
                client = client.with_base_url(url);
            }
            Arc::new(
                client
                    .with_timeout_ms(run.timeout_ms)
                    .with_max_tokens(run.max_tokens)
                    .with_temperature(provider.temperature),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_create_provider_per_kind() {
        let config = Config::default();
        let names: Vec<String> = config
            .providers
            .iter()
            .map(|p| create_provider(p, &config.run).name().to_string())
            .collect();
        assert_eq!(names, ["openai", "anthropic", "google", "xai"]);
    }
}
