//! Per-provider history read back from the CSV logs

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::reporting::csv_log::{CsvLog, LogError, LogRow};

/// Logged daily results for one provider, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderHistory {
    pub provider_id: String,
    pub daily_results: Vec<LogRow>,
}

impl ProviderHistory {
    pub fn new(provider_id: impl Into<String>, daily_results: Vec<LogRow>) -> Self {
        Self {
            provider_id: provider_id.into(),
            daily_results,
        }
    }

    /// Load a provider's history; `None` when it has no log yet
    pub fn load(log: &CsvLog, provider_id: &str) -> Result<Option<Self>, LogError> {
        match log.read(provider_id)? {
            Some(rows) => Ok(Some(Self::new(provider_id, rows))),
            None => {
                tracing::warn!("File {}.csv does not exist.", provider_id);
                Ok(None)
            }
        }
    }

    pub fn total_days(&self) -> usize {
        self.daily_results.len()
    }

    pub fn correct_days(&self) -> usize {
        self.daily_results.iter().filter(|r| r.correct).count()
    }

    /// Share of correct days, 0.0 with no data
    pub fn accuracy(&self) -> f64 {
        if self.daily_results.is_empty() {
            0.0
        } else {
            self.correct_days() as f64 / self.total_days() as f64
        }
    }

    /// Consecutive correct days, counting back from the newest row
    pub fn current_streak(&self) -> usize {
        self.daily_results
            .iter()
            .rev()
            .take_while(|r| r.correct)
            .count()
    }

    pub fn last(&self) -> Option<&LogRow> {
        self.daily_results.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.daily_results.iter().filter_map(|r| parse_date(&r.date)).min()
    }

    /// Calendar of this provider's rows from the Monday on or before `start` to `today`
    pub fn calendar(&self, start: NaiveDate, today: NaiveDate) -> Vec<CalendarDay<'_>> {
        calendar_days(start, &self.daily_results, today)
    }
}

/// One calendar cell: the date and its logged row, if any
pub type CalendarDay<'a> = (NaiveDate, Option<&'a LogRow>);

/// The Monday on or before `date`
pub fn adjust_to_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Every day from the Monday on or before `start` through `today`.
///
/// Days without a row map to `None`. When two rows share a date the later
/// one wins. Nothing is produced after `today`.
pub fn calendar_days<'a>(
    start: NaiveDate,
    rows: &'a [LogRow],
    today: NaiveDate,
) -> Vec<CalendarDay<'a>> {
    let by_date: HashMap<&str, &LogRow> = rows.iter().map(|r| (r.date.trim(), r)).collect();

    let mut days = Vec::new();
    let mut day = adjust_to_monday(start);
    while day <= today {
        let key = day.format("%Y-%m-%d").to_string();
        days.push((day, by_date.get(key.as_str()).copied()));
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Split consecutive days into weeks of seven; the last week may be shorter
pub fn group_by_week<T>(days: &[T]) -> Vec<&[T]> {
    days.chunks(7).collect()
}

/// Load every provider in `ids` that has a log, keeping the given order
pub fn load_all(log: &CsvLog, ids: &[String]) -> Result<Vec<ProviderHistory>, LogError> {
    let mut histories = Vec::new();
    for id in ids {
        if let Some(history) = ProviderHistory::load(log, id)? {
            histories.push(history);
        }
    }
    Ok(histories)
}

/// Earliest logged date across all histories
pub fn earliest_date(histories: &[ProviderHistory]) -> Option<NaiveDate> {
    histories.iter().filter_map(ProviderHistory::first_date).min()
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, correct: bool) -> LogRow {
        LogRow {
            date: date.to_string(),
            answer: if correct { "Gulf of Mexico" } else { "Gulf of America" }.to_string(),
            model: "m".to_string(),
            correct,
        }
    }

    #[test]
    fn test_streak_and_accuracy() {
        let history = ProviderHistory::new(
            "openai",
            vec![
                row("2025-01-01", true),
                row("2025-01-02", false),
                row("2025-01-03", true),
                row("2025-01-04", true),
            ],
        );

        assert_eq!(history.total_days(), 4);
        assert_eq!(history.correct_days(), 3);
        assert!((history.accuracy() - 0.75).abs() < 1e-9);
        assert_eq!(history.current_streak(), 2);
        assert_eq!(history.last().unwrap().date, "2025-01-04");
    }

    #[test]
    fn test_streak_broken_by_latest_day() {
        let history = ProviderHistory::new("xai", vec![row("2025-01-01", true), row("2025-01-02", false)]);
        assert_eq!(history.current_streak(), 0);
    }

    #[test]
    fn test_empty_history() {
        let history = ProviderHistory::new("google", Vec::new());
        assert_eq!(history.accuracy(), 0.0);
        assert_eq!(history.current_streak(), 0);
        assert_eq!(history.first_date(), None);
        assert_eq!(earliest_date(&[history]), None);
    }

    #[test]
    fn test_earliest_date_across_providers() {
        let histories = vec![
            ProviderHistory::new("a", vec![row("2025-02-10", true), row("not a date", true)]),
            ProviderHistory::new("b", vec![row("2025-01-15", false)]),
        ];
        assert_eq!(earliest_date(&histories), NaiveDate::from_ymd_opt(2025, 1, 15));
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_adjust_to_monday() {
        // 2025-01-20 is a Monday
        assert_eq!(adjust_to_monday(ymd(2025, 1, 20)), ymd(2025, 1, 20));
        assert_eq!(adjust_to_monday(ymd(2025, 1, 22)), ymd(2025, 1, 20));
        assert_eq!(adjust_to_monday(ymd(2025, 1, 26)), ymd(2025, 1, 20));
        assert_eq!(adjust_to_monday(ymd(2025, 1, 1)), ymd(2024, 12, 30));
    }

    #[test]
    fn test_calendar_days_fill_gaps() {
        let rows = vec![row("2025-01-22", true), row("2025-01-24", false)];
        let days = calendar_days(ymd(2025, 1, 22), &rows, ymd(2025, 1, 28));

        // Monday 20th through Tuesday 28th
        assert_eq!(days.len(), 9);
        assert_eq!(days[0], (ymd(2025, 1, 20), None));
        assert!(days[2].1.unwrap().correct);
        assert_eq!(days[3].1, None);
        assert!(!days[4].1.unwrap().correct);
        assert_eq!(days.last().unwrap().0, ymd(2025, 1, 28));

        let weeks = group_by_week(&days);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].len(), 7);
        assert_eq!(weeks[1].len(), 2);
        assert_eq!(weeks[1][0].0, ymd(2025, 1, 27));
    }

    #[test]
    fn test_calendar_ignores_rows_after_today() {
        let history = ProviderHistory::new("xai", vec![row("2025-01-21", true), row("2025-02-01", true)]);
        let days = history.calendar(ymd(2025, 1, 21), ymd(2025, 1, 21));

        assert_eq!(days.len(), 2);
        assert!(days[1].1.is_some());
        assert!(calendar_days(ymd(2025, 3, 5), &history.daily_results, ymd(2025, 3, 2)).is_empty());
    }

    #[test]
    fn test_load_skips_missing_logs() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvLog::new(dir.path());
        std::fs::write(
            log.path_for("anthropic"),
            "date,answer,model,correct\n2025-01-01,Gulf of Mexico,claude,true\n",
        )
        .unwrap();

        let ids = vec!["openai".to_string(), "anthropic".to_string()];
        let histories = load_all(&log, &ids).unwrap();

        assert_eq!(histories.len(), 1);
        assert_eq!(histories[0].provider_id, "anthropic");
        assert_eq!(histories[0].current_streak(), 1);
    }
}
