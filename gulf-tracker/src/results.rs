//! Per-provider outcomes of a run

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A graded answer from one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub provider_id: String,
    /// Model name as resolved by the provider
    pub model: String,
    pub answer: String,
    pub correct: bool,
}

/// Why a provider produced no graded answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider's credential variable is unset or blank
    MissingCredential,
    /// The API call failed or returned something unusable
    Adapter,
    /// The answer was empty or whitespace
    Validation,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => "missing_credential",
            FailureKind::Adapter => "adapter",
            FailureKind::Validation => "validation",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider attempt that failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub provider_id: String,
    /// Model that was requested
    pub model: String,
    pub kind: FailureKind,
    pub message: String,
    /// Extra explanation for the failure report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Outcome of asking one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success(ResultRecord),
    Failure(FailureRecord),
}

impl Outcome {
    pub fn failure(
        provider_id: impl Into<String>,
        model: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Outcome::Failure(FailureRecord {
            provider_id: provider_id.into(),
            model: model.into(),
            kind,
            message: message.into(),
            details: None,
        })
    }

    /// Attach details to a failure; successes are returned unchanged
    pub fn with_details(self, details: impl Into<String>) -> Self {
        match self {
            Outcome::Failure(mut f) => {
                f.details = Some(details.into());
                Outcome::Failure(f)
            }
            success => success,
        }
    }

    pub fn provider_id(&self) -> &str {
        match self {
            Outcome::Success(r) => &r.provider_id,
            Outcome::Failure(f) => &f.provider_id,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Outcome::Success(r) => &r.model,
            Outcome::Failure(f) => &f.model,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn as_success(&self) -> Option<&ResultRecord> {
        match self {
            Outcome::Success(r) => Some(r),
            Outcome::Failure(_) => None,
        }
    }

    pub fn as_failure(&self) -> Option<&FailureRecord> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }
}

/// All outcomes of one pass over the enabled providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Local calendar date the run is logged under
    pub run_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// One entry per provider, in provider order
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    pub fn successes(&self) -> impl Iterator<Item = &ResultRecord> {
        self.outcomes.iter().filter_map(Outcome::as_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.outcomes.iter().filter_map(Outcome::as_failure)
    }

    pub fn correct_count(&self) -> usize {
        self.successes().filter(|r| r.correct).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Run date as `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        self.run_date.format("%Y-%m-%d").to_string()
    }

    pub fn elapsed_secs(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
