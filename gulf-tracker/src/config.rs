//! Configuration management for the gulf tracker
//!
//! Loads the provider registry, run settings, output location and logging
//! filter from a TOML file. Enabled providers live under `[[providers]]`;
//! providers kept for reference but not queried live under `[[archived]]`.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The question every provider is asked
pub const QUESTION: &str = "What is the gulf between America and Mexico called?";

/// System prompt sent with the question
pub const SYSTEM_PROMPT: &str = "Just answer the question to the point. Be concise. Only the answer to the question, and no explanation or extra information else.";

/// Locations searched by [`Config::load_or_default`]
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["config/gulf-tracker.toml", "gulf-tracker.toml"];

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Providers queried on every run, in order
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
    /// Providers that are known but not queried
    #[serde(default)]
    pub archived: Vec<ProviderConfig>,
}

/// Provider family, selects the API client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Google,
    Xai,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Xai => "xai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Identifier, also the stem of the provider's CSV log
    pub id: String,
    pub kind: ProviderKind,
    /// Model requested from the provider
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ProviderConfig {
    pub fn new(
        id: impl Into<String>,
        kind: ProviderKind,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            model: model.into(),
            api_key_env: api_key_env.into(),
            base_url: None,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// Question and request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_question")]
    pub question: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-request HTTP timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one `<provider>.csv` log per provider
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Logging filter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for this crate's own events
    #[serde(default = "default_level")]
    pub level: String,
    /// Targets held at `warn` (HTTP internals are noisy at `info`)
    #[serde(default = "default_quiet_targets")]
    pub quiet_targets: Vec<String>,
}

// Default value functions
fn default_question() -> String { QUESTION.to_string() }
fn default_system_prompt() -> String { SYSTEM_PROMPT.to_string() }
fn default_max_tokens() -> u32 { 1024 }
fn default_timeout_ms() -> u64 { 60_000 }
fn default_data_dir() -> PathBuf { PathBuf::from("public/data") }
fn default_level() -> String { "info".to_string() }
fn default_quiet_targets() -> Vec<String> {
    ["hyper", "hyper_util", "reqwest", "h2", "rustls"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("openai", ProviderKind::OpenAI, "gpt-4o", "OPENAI_API_KEY")
            .with_temperature(0.7),
        ProviderConfig::new(
            "anthropic",
            ProviderKind::Anthropic,
            "claude-3-7-sonnet-20250219",
            "ANTHROPIC_API_KEY",
        )
        .with_temperature(0.7),
        ProviderConfig::new("google", ProviderKind::Google, "gemini-1.5-pro", "GOOGLE_API_KEY")
            .with_temperature(0.0),
        ProviderConfig::new("xai", ProviderKind::Xai, "grok-2-latest", "XAI_API_KEY")
            .with_temperature(0.0),
    ]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            question: default_question(),
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            quiet_targets: default_quiet_targets(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            providers: default_providers(),
            archived: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the first default location that exists, or return defaults.
    ///
    /// A file that exists but fails to parse is an error, not a silent fallback.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).is_file() {
                let config = Self::from_file(path)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::debug!("Using default configuration");
        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Check provider entries for problems that would only surface mid-run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for provider in self.providers.iter().chain(&self.archived) {
            if !is_valid_id(&provider.id) {
                return Err(ConfigError::Invalid(format!(
                    "provider id '{}' must be non-empty and use only letters, digits, '-', '_' or '.'",
                    provider.id
                )));
            }
            if !seen.insert(provider.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate provider id '{}'",
                    provider.id
                )));
            }
            if provider.model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' has no model",
                    provider.id
                )));
            }
            if provider.api_key_env.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' has no api_key_env",
                    provider.id
                )));
            }
        }

        Ok(())
    }

    /// Get enabled providers
    pub fn enabled_providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Get a provider by id, enabled or archived
    pub fn get_provider(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .chain(&self.archived)
            .find(|p| p.id == id)
    }

    /// Pick enabled providers by id, keeping the requested order
    pub fn select_providers(&self, ids: &[&str]) -> Result<Vec<ProviderConfig>, ConfigError> {
        ids.iter()
            .map(|id| {
                if let Some(provider) = self.providers.iter().find(|p| p.id == *id) {
                    Ok(provider.clone())
                } else if self.archived.iter().any(|p| p.id == *id) {
                    Err(ConfigError::Invalid(format!("provider '{}' is archived", id)))
                } else {
                    Err(ConfigError::Invalid(format!("unknown provider '{}'", id)))
                }
            })
            .collect()
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
