//! Sequential response generator: asks every enabled provider once

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};

use crate::analysis::evaluate;
use crate::config::{ProviderConfig, RunConfig, QUESTION, SYSTEM_PROMPT};
use crate::providers::{create_provider, ApiKey, CompletionResponse, LLMProvider};
use crate::results::{FailureKind, Outcome, ResultRecord, RunReport};

/// A provider ready to be asked: where its key lives and which client to use
#[derive(Clone)]
pub struct ProviderSlot {
    pub id: String,
    pub model: String,
    pub api_key_env: String,
    pub adapter: Arc<dyn LLMProvider + Send + Sync>,
}

impl ProviderSlot {
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
        adapter: Arc<dyn LLMProvider + Send + Sync>,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            api_key_env: api_key_env.into(),
            adapter,
        }
    }

    /// Build a slot with the real API client for a configured provider
    pub fn from_config(provider: &ProviderConfig, run: &RunConfig) -> Self {
        Self::new(
            &provider.id,
            &provider.model,
            &provider.api_key_env,
            create_provider(provider, run),
        )
    }
}

/// Build slots for a list of configured providers, keeping their order
pub fn slots_from_config(providers: &[ProviderConfig], run: &RunConfig) -> Vec<ProviderSlot> {
    providers
        .iter()
        .map(|p| ProviderSlot::from_config(p, run))
        .collect()
}

/// Where API keys come from
pub trait CredentialSource: Send + Sync {
    fn lookup(&self, var: &str) -> Option<String>;
}

/// Reads credentials from the process environment
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn lookup(&self, var: &str) -> Option<String> {
        std::env::var(var).ok()
    }
}

impl CredentialSource for HashMap<String, String> {
    fn lookup(&self, var: &str) -> Option<String> {
        self.get(var).cloned()
    }
}

/// Question and system prompt for a run
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub question: String,
    pub system_prompt: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            question: QUESTION.to_string(),
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

impl From<&RunConfig> for GeneratorConfig {
    fn from(run: &RunConfig) -> Self {
        Self {
            question: run.question.clone(),
            system_prompt: run.system_prompt.clone(),
        }
    }
}

/// Asks each provider in turn and grades the answers
pub struct Generator {
    config: GeneratorConfig,
    credentials: Box<dyn CredentialSource>,
    progress: Box<dyn ProgressCallback>,
}

impl Generator {
    /// Create a generator reading keys from the environment
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            credentials: Box::new(EnvCredentials),
            progress: Box::new(NoOpProgress),
        }
    }

    pub fn with_credentials(mut self, credentials: impl CredentialSource + 'static) -> Self {
        self.credentials = Box::new(credentials);
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressCallback + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Run against every slot, logged under today's local date
    pub async fn run(&self, slots: &[ProviderSlot]) -> RunReport {
        self.run_for_date(Local::now().date_naive(), slots).await
    }

    /// Run against every slot, logged under `run_date`.
    ///
    /// Providers are asked one at a time. A failing provider becomes a
    /// failure outcome and the run moves on to the next one.
    pub async fn run_for_date(&self, run_date: NaiveDate, slots: &[ProviderSlot]) -> RunReport {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(slots.len());

        for (idx, slot) in slots.iter().enumerate() {
            self.progress.on_provider_start(&slot.id, &slot.model);
            tracing::info!("Processing {}", slot.id);

            let outcome = self.ask_provider(slot).await;

            self.progress.on_provider_complete(&outcome);
            self.progress.on_progress(idx + 1, slots.len());
            outcomes.push(outcome);
        }

        RunReport {
            run_date,
            started_at,
            completed_at: Utc::now(),
            outcomes,
        }
    }

    /// Ask a single provider (one attempt, no retries)
    pub async fn ask_provider(&self, slot: &ProviderSlot) -> Outcome {
        let api_key = match self
            .credentials
            .lookup(&slot.api_key_env)
            .filter(|key| !key.trim().is_empty())
        {
            Some(key) => ApiKey::new(key),
            None => {
                tracing::warn!(
                    "API key not found for {}. Set the {} environment variable.",
                    slot.id,
                    slot.api_key_env
                );
                return Outcome::failure(
                    &slot.id,
                    &slot.model,
                    FailureKind::MissingCredential,
                    format!("Missing environment variable: {}", slot.api_key_env),
                )
                .with_details(format!(
                    "The API key for {} is not set in the environment ({}).",
                    slot.id, slot.api_key_env
                ));
            }
        };

        tracing::info!("Sending request to {}/{}", slot.id, slot.model);

        // Spawned so a panicking adapter is contained like any other failure
        let adapter = Arc::clone(&slot.adapter);
        let model = slot.model.clone();
        let system_prompt = self.config.system_prompt.clone();
        let question = self.config.question.clone();
        let handle = tokio::spawn(async move {
            adapter.ask(api_key, &model, &system_prompt, &question).await
        });

        match handle.await {
            Ok(Ok(response)) => grade(slot, response),
            Ok(Err(e)) => {
                tracing::error!("Error processing {}: {}", slot.id, e);
                Outcome::failure(&slot.id, &slot.model, FailureKind::Adapter, e.to_string())
            }
            Err(e) => {
                tracing::error!("Adapter for {} panicked: {}", slot.id, e);
                Outcome::failure(
                    &slot.id,
                    &slot.model,
                    FailureKind::Adapter,
                    format!("Adapter panicked: {}", e),
                )
            }
        }
    }
}

fn grade(slot: &ProviderSlot, response: CompletionResponse) -> Outcome {
    if response.content.is_empty() {
        return Outcome::failure(
            &slot.id,
            &slot.model,
            FailureKind::Validation,
            "Empty response received from the model.",
        );
    }
    if response.content.trim().is_empty() {
        return Outcome::failure(
            &slot.id,
            &slot.model,
            FailureKind::Validation,
            "Response consists only of whitespace.",
        );
    }

    let correct = evaluate(Some(&response.content));
    tracing::info!(
        "{} ({}) answered {:?}: {}",
        slot.id,
        response.model,
        response.content,
        if correct { "correct" } else { "incorrect" }
    );

    Outcome::Success(ResultRecord {
        provider_id: slot.id.clone(),
        model: response.model,
        answer: response.content,
        correct,
    })
}

/// Progress callback for tracking a run
pub trait ProgressCallback: Send + Sync {
    fn on_provider_start(&self, provider: &str, model: &str);
    fn on_provider_complete(&self, outcome: &Outcome);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_provider_start(&self, _provider: &str, _model: &str) {}
    fn on_provider_complete(&self, _outcome: &Outcome) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_provider_start(&self, provider: &str, model: &str) {
        println!("\n===== Processing {} =====", provider);
        println!("Calling {} ({})...", provider, model);
    }

    fn on_provider_complete(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Success(r) => {
                let verdict = if r.correct { "correct" } else { "incorrect" };
                println!("Model used: {}", r.model);
                println!("Response: {}", r.answer);
                println!("OK {}: {}", r.provider_id, verdict);
            }
            Outcome::Failure(f) => {
                println!("FAILED {}: {}", f.provider_id, f.message);
            }
        }
    }

    fn on_progress(&self, completed: usize, total: usize) {
        println!("Progress: {}/{} providers", completed, total);
    }
}
