//! Gulf Tracker
//!
//! Asks a set of LLM providers what the gulf between the USA and Mexico is
//! called, grades each answer, and appends the verdicts to one CSV log per
//! provider.
//!
//! # Features
//!
//! - OpenAI, Anthropic (Claude), Google (Gemini) and xAI (Grok) clients
//! - Substring grading that accepts "Gulf of Mexico" and rejects "Gulf of America"
//! - Append-only `<provider>.csv` logs with history read-back
//! - TOML configuration of enabled and archived providers
//!
//! # Example
//!
//! ```no_run
//! use gulf_tracker::{
//!     config::Config,
//!     reporting::CsvLog,
//!     runner::{slots_from_config, Generator, GeneratorConfig},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default()?;
//!     let slots = slots_from_config(config.enabled_providers(), &config.run);
//!
//!     let generator = Generator::new(GeneratorConfig::from(&config.run));
//!     let report = generator.run(&slots).await;
//!
//!     let stats = CsvLog::new(&config.output.data_dir).update(&report)?;
//!     println!("Updated {} logs", stats.updated_count);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod logging;
pub mod providers;
pub mod reporting;
pub mod results;
pub mod runner;

pub use config::Config;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{evaluate, is_correct, ProviderHistory};
    pub use crate::config::{Config, ProviderConfig, ProviderKind};
    pub use crate::providers::{
        create_provider, CompletionRequest, CompletionResponse, LLMProvider, Message,
        ProviderError, ProviderResult,
    };
    pub use crate::reporting::{failure_report, print_console_report, CsvLog, RunSummary};
    pub use crate::results::{FailureKind, FailureRecord, Outcome, ResultRecord, RunReport};
    pub use crate::runner::{Generator, GeneratorConfig, ProviderSlot};
}
