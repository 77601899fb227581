//! End-to-end run with fake providers: generate, persist, read back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use gulf_tracker::analysis::history::load_all;
use gulf_tracker::providers::{
    CompletionRequest, CompletionResponse, LLMProvider, ProviderError, ProviderResult,
};
use gulf_tracker::reporting::{failure_report, CsvLog, RunSummary};
use gulf_tracker::results::FailureKind;
use gulf_tracker::runner::{Generator, GeneratorConfig, ProviderSlot};

/// Answers with a fixed text and reports a resolved model name
struct Scripted {
    answer: &'static str,
    resolved: &'static str,
}

#[async_trait]
impl LLMProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        assert_eq!(request.api_key.expose(), "secret");
        assert!(request.system_prompt.is_some());
        Ok(CompletionResponse::new(self.answer, self.resolved))
    }
}

struct Broken;

#[async_trait]
impl LLMProvider for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn complete(&self, _request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        Err(ProviderError::Api {
            status: 500,
            message: "internal error".to_string(),
        })
    }
}

fn slots() -> Vec<ProviderSlot> {
    vec![
        ProviderSlot::new(
            "openai",
            "gpt-4o",
            "OPENAI_API_KEY",
            Arc::new(Scripted {
                answer: "unused",
                resolved: "gpt-4o",
            }),
        ),
        ProviderSlot::new(
            "anthropic",
            "claude-3-7-sonnet-20250219",
            "ANTHROPIC_API_KEY",
            Arc::new(Scripted {
                answer: "The Gulf of Mexico.",
                resolved: "claude-3-7-sonnet-20250219",
            }),
        ),
        ProviderSlot::new(
            "xai",
            "grok-2-latest",
            "XAI_API_KEY",
            Arc::new(Scripted {
                answer: "Gulf of America",
                resolved: "grok-2-1212",
            }),
        ),
        ProviderSlot::new("google", "gemini-1.5-pro", "GOOGLE_API_KEY", Arc::new(Broken)),
    ]
}

fn credentials() -> HashMap<String, String> {
    ["ANTHROPIC_API_KEY", "XAI_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .map(|var| (var.to_string(), "secret".to_string()))
        .collect()
}

#[tokio::test]
async fn test_full_run_persists_successes_only() {
    let generator = Generator::new(GeneratorConfig::default()).with_credentials(credentials());
    let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();

    let report = generator.run_for_date(date, &slots()).await;

    // One outcome per provider, in slot order
    let ids: Vec<&str> = report.outcomes.iter().map(|o| o.provider_id()).collect();
    assert_eq!(ids, ["openai", "anthropic", "xai", "google"]);

    let missing = report.outcomes[0].as_failure().unwrap();
    assert_eq!(missing.kind, FailureKind::MissingCredential);
    assert_eq!(missing.message, "Missing environment variable: OPENAI_API_KEY");

    assert!(report.outcomes[1].as_success().unwrap().correct);

    let xai = report.outcomes[2].as_success().unwrap();
    assert!(!xai.correct);
    assert_eq!(xai.model, "grok-2-1212");

    let google = report.outcomes[3].as_failure().unwrap();
    assert_eq!(google.kind, FailureKind::Adapter);
    assert!(google.message.contains("internal error"));

    // Persist
    let dir = tempfile::tempdir().unwrap();
    let log = CsvLog::new(dir.path().join("data"));
    let stats = log.update(&report).unwrap();
    assert_eq!(stats.updated_count, 2);
    assert!(!stats.has_errors());
    assert!(!log.path_for("openai").exists());
    assert!(!log.path_for("google").exists());

    let xai_log = std::fs::read_to_string(log.path_for("xai")).unwrap();
    assert_eq!(
        xai_log,
        "date,answer,model,correct\r\n2025-02-10,Gulf of America,grok-2-1212,false\r\n"
    );

    // A second day appends without repeating the header
    let next = NaiveDate::from_ymd_opt(2025, 2, 11).unwrap();
    let report2 = generator.run_for_date(next, &slots()).await;
    log.update(&report2).unwrap();

    let ids: Vec<String> = ["openai", "anthropic", "xai", "google"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let histories = load_all(&log, &ids).unwrap();
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[0].provider_id, "anthropic");
    assert_eq!(histories[0].total_days(), 2);
    assert_eq!(histories[0].current_streak(), 2);
    assert_eq!(histories[1].correct_days(), 0);

    // Reporting
    let summary = RunSummary::from_report(&report, Some(&stats));
    assert_eq!(summary.tldr(), "Updated 2 LLM responses on 2025-02-10 (anthropic, xai)");

    let failures = failure_report(&report).unwrap();
    assert!(failures.contains("[PROVIDER]: openai"));
    assert!(failures.contains("[PROVIDER]: google"));
}
