//! Results reporting

pub mod csv_log;

pub use csv_log::{CsvLog, LogError, LogRow, UpdateError, UpdateStats};

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};

use chrono::NaiveDate;

use crate::analysis::history::{earliest_date, group_by_week, CalendarDay, ProviderHistory};
use crate::results::{FailureRecord, RunReport};

/// JSON summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub date: String,
    pub updated_count: usize,
    pub execution_time_secs: f64,
    pub models: Vec<ModelSummary>,
    pub failures: Vec<FailureRecord>,
    /// Graded answers whose log row could not be written
    #[serde(default)]
    pub log_errors: Vec<UpdateError>,
}

/// One graded provider in a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub llm: String,
    pub model: String,
    pub correct: bool,
}

impl RunSummary {
    /// Summarize a run; `stats` is `None` when the logs were not touched
    pub fn from_report(report: &RunReport, stats: Option<&UpdateStats>) -> Self {
        Self {
            date: report.date_string(),
            updated_count: stats.map_or(0, |s| s.updated_count),
            execution_time_secs: (report.elapsed_secs() * 100.0).round() / 100.0,
            models: report
                .successes()
                .map(|r| ModelSummary {
                    llm: r.provider_id.clone(),
                    model: r.model.clone(),
                    correct: r.correct,
                })
                .collect(),
            failures: report.failures().cloned().collect(),
            log_errors: stats.map(|s| s.errors.clone()).unwrap_or_default(),
        }
    }

    /// One-line description, suitable for a commit message
    pub fn tldr(&self) -> String {
        let llms: Vec<&str> = self
            .models
            .iter()
            .map(|m| m.llm.as_str())
            .filter(|llm| !self.log_errors.iter().any(|e| e.provider_id == *llm))
            .collect();
        format!(
            "Updated {} LLM responses on {} ({})",
            self.updated_count,
            self.date,
            llms.join(", ")
        )
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

/// Print the per-provider verdicts of a run
pub fn print_console_report(summary: &RunSummary) {
    println!("\n===== CSV Update Summary ({}) =====", summary.date);
    println!("Updated {} CSV files", summary.updated_count);
    println!("Execution time: {} seconds", summary.execution_time_secs);

    println!("\nModel details:");
    for model in &summary.models {
        let status = if model.correct { "✓" } else { "✗" };
        println!("  {} ({}): {}", model.llm, model.model, status);
    }

    if !summary.failures.is_empty() {
        println!("\nFailures:");
        for failure in &summary.failures {
            println!(
                "  {} ({}): [{}] {}",
                failure.provider_id, failure.model, failure.kind, failure.message
            );
        }
    }

    if !summary.log_errors.is_empty() {
        println!("\nLogs not updated:");
        for error in &summary.log_errors {
            println!("  {} ({}): {}", error.provider_id, error.path.display(), error.message);
        }
    }
}

/// Build a report of every failed provider, or `None` if all succeeded
pub fn failure_report(report: &RunReport) -> Option<String> {
    let failures: Vec<&FailureRecord> = report.failures().collect();
    if failures.is_empty() {
        return None;
    }

    let rule = "=".repeat(50);
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "INTEGRATION TEST FAILURES REPORT");
    let _ = writeln!(out, "{}", rule);

    for failure in failures {
        let _ = writeln!(out);
        let _ = writeln!(out, "[PROVIDER]: {}", failure.provider_id);
        let _ = writeln!(out, "[MODEL]: {}", failure.model);
        let _ = writeln!(out, "[KIND]: {}", failure.kind);
        let _ = writeln!(out, "[ERROR]: {}", failure.message);
        if let Some(details) = &failure.details {
            let _ = writeln!(out, "[DETAILS]: {}", details);
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }

    Some(out)
}

/// Weeks shown per provider calendar, most recent last
pub const CALENDAR_WEEKS: usize = 26;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Render calendar days as a grid: one column per week, one line per weekday.
///
/// `✓` correct, `✗` incorrect, `·` no data. Only the last `max_weeks` weeks
/// are drawn.
pub fn render_calendar(days: &[CalendarDay<'_>], max_weeks: usize) -> String {
    let weeks = group_by_week(days);
    let shown = &weeks[weeks.len().saturating_sub(max_weeks)..];

    let mut out = String::new();
    for (weekday, label) in WEEKDAYS.iter().enumerate() {
        let _ = write!(out, "{} ", label);
        for week in shown {
            let cell = match week.get(weekday) {
                Some((_, Some(row))) if row.correct => '✓',
                Some((_, Some(_))) => '✗',
                Some((_, None)) => '·',
                None => ' ',
            };
            out.push(cell);
        }
        let trimmed = out.trim_end_matches(' ').len();
        out.truncate(trimmed);
        out.push('\n');
    }
    out
}

/// Print a table of logged history per provider, then each provider's calendar up to `today`
pub fn print_history_report(histories: &[ProviderHistory], today: NaiveDate) {
    println!("\n=== Answer History ===\n");

    if histories.is_empty() {
        println!("No logs found.");
        return;
    }

    let start = earliest_date(histories);
    if let Some(start) = start {
        println!("Tracking since: {}\n", start.format("%Y-%m-%d"));
    }

    println!(
        "{:<12} {:>6} {:>8} {:>9} {:>7}  {}",
        "Provider", "Days", "Correct", "Accuracy", "Streak", "Latest"
    );
    println!("{:-<80}", "");

    for history in histories {
        let latest = history
            .last()
            .map(|r| format!("{} {} ({})", r.date, if r.correct { "✓" } else { "✗" }, r.model))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>6} {:>8} {:>8.1}% {:>7}  {}",
            history.provider_id,
            history.total_days(),
            history.correct_days(),
            history.accuracy() * 100.0,
            history.current_streak(),
            latest
        );
    }

    println!("{:-<80}", "");

    let Some(start) = start else {
        return;
    };
    for history in histories {
        println!("\n{}", history.provider_id);
        print!("{}", render_calendar(&history.calendar(start, today), CALENDAR_WEEKS));
    }
    println!("\n✓ correct  ✗ incorrect  · no data");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{FailureKind, Outcome, ResultRecord};
    use chrono::{NaiveDate, Utc};

    fn report(outcomes: Vec<Outcome>) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            started_at: now,
            completed_at: now + chrono::Duration::milliseconds(2346),
            outcomes,
        }
    }

    fn success(id: &str, correct: bool) -> Outcome {
        Outcome::Success(ResultRecord {
            provider_id: id.to_string(),
            model: format!("{}-model", id),
            answer: "Gulf of Mexico".to_string(),
            correct,
        })
    }

    #[test]
    fn test_summary_and_tldr() {
        let report = report(vec![
            success("openai", true),
            Outcome::failure("google", "gemini-1.5-pro", FailureKind::Adapter, "500"),
            success("xai", false),
        ]);

        let stats = UpdateStats {
            date: "2025-04-02".to_string(),
            updated_count: 2,
            entries: Vec::new(),
            errors: Vec::new(),
        };
        let summary = RunSummary::from_report(&report, Some(&stats));
        assert_eq!(summary.models.len(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert!((summary.execution_time_secs - 2.35).abs() < 1e-9);
        assert_eq!(summary.tldr(), "Updated 2 LLM responses on 2025-04-02 (openai, xai)");
    }

    #[test]
    fn test_summary_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = RunSummary::from_report(&report(vec![success("openai", true)]), None);

        summary.write_to_file(&path).unwrap();
        let loaded: RunSummary =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn test_summary_reports_unwritten_logs() {
        let report = report(vec![success("openai", true), success("xai", false)]);
        let stats = UpdateStats {
            date: "2025-04-02".to_string(),
            updated_count: 1,
            entries: Vec::new(),
            errors: vec![UpdateError {
                provider_id: "xai".to_string(),
                path: "data/xai.csv".into(),
                message: "IO error".to_string(),
            }],
        };

        let summary = RunSummary::from_report(&report, Some(&stats));
        assert_eq!(summary.log_errors.len(), 1);
        assert_eq!(summary.tldr(), "Updated 1 LLM responses on 2025-04-02 (openai)");

        let dry = RunSummary::from_report(&report, None);
        assert_eq!(dry.updated_count, 0);
        assert!(dry.log_errors.is_empty());
    }

    #[test]
    fn test_render_calendar_grid() {
        let row = |date: &str, correct: bool| LogRow {
            date: date.to_string(),
            answer: String::new(),
            model: "m".to_string(),
            correct,
        };
        let rows = vec![row("2025-01-20", true), row("2025-01-22", false), row("2025-01-27", true)];
        let days = crate::analysis::calendar_days(
            NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            &rows,
            NaiveDate::from_ymd_opt(2025, 1, 28).unwrap(),
        );

        let grid = render_calendar(&days, CALENDAR_WEEKS);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "Mon ✓✓");
        assert_eq!(lines[1], "Tue ··");
        assert_eq!(lines[2], "Wed ✗");
        assert_eq!(lines[6], "Sun ·");

        // Only the newest week when capped
        let capped = render_calendar(&days, 1);
        assert_eq!(capped.lines().next(), Some("Mon ✓"));
        assert_eq!(capped.lines().nth(2), Some("Wed"));
    }

    #[test]
    fn test_failure_report() {
        assert_eq!(failure_report(&report(vec![success("openai", true)])), None);

        let text = failure_report(&report(vec![
            success("openai", true),
            Outcome::failure(
                "xai",
                "grok-2-latest",
                FailureKind::MissingCredential,
                "Missing environment variable: XAI_API_KEY",
            )
            .with_details("The API key for xai is not set in the environment (XAI_API_KEY)."),
            Outcome::failure("google", "gemini-1.5-pro", FailureKind::Adapter, "API error: 500"),
        ]))
        .unwrap();

        assert!(text.contains("[PROVIDER]: xai"));
        assert!(text.contains("[MODEL]: grok-2-latest"));
        assert!(text.contains("[KIND]: missing_credential"));
        assert!(text.contains(
            "[DETAILS]: The API key for xai is not set in the environment (XAI_API_KEY).\n"
        ));
        assert!(!text.contains("openai"));
        // Only failures that carry details get the line
        assert_eq!(text.matches("[DETAILS]").count(), 1);
    }
}
