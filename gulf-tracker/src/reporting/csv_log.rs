//! Append-only CSV logs, one file per provider
//!
//! Each log is `<data_dir>/<provider_id>.csv` with the columns
//! `date,answer,model,correct`. The header is written when the file is
//! created; later runs only append. Quoting follows RFC 4180: fields holding
//! a comma, quote or line break are wrapped in quotes with inner quotes
//! doubled, and rows end in `\r\n`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::results::{ResultRecord, RunReport};

/// Column names, in file order
pub const HEADER: [&str; 4] = ["date", "answer", "model", "correct"];

/// Errors reading or writing a log
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed log {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

/// One row of a provider log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub date: String,
    pub answer: String,
    pub model: String,
    pub correct: bool,
}

/// What an update wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStats {
    pub date: String,
    pub updated_count: usize,
    pub entries: Vec<UpdateEntry>,
    /// Providers whose row could not be appended
    #[serde(default)]
    pub errors: Vec<UpdateError>,
}

impl UpdateStats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub provider_id: String,
    pub model: String,
    pub correct: bool,
    pub path: PathBuf,
}

/// A provider log that could not be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateError {
    pub provider_id: String,
    pub path: PathBuf,
    pub message: String,
}

/// Directory of per-provider logs
#[derive(Debug, Clone)]
pub struct CsvLog {
    data_dir: PathBuf,
}

impl CsvLog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, provider_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", provider_id))
    }

    /// Append one graded answer under `date`, creating the log if needed
    pub fn append(&self, date: &str, record: &ResultRecord) -> Result<PathBuf, LogError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| LogError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let path = self.path_for(&record.provider_id);
        let io_err = |source| LogError::Io {
            path: path.clone(),
            source,
        };

        let needs_header = match fs::metadata(&path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(io_err(e)),
        };

        let mut chunk = String::new();
        if needs_header {
            chunk.push_str(&format_row(&HEADER));
        }
        let correct = if record.correct { "true" } else { "false" };
        chunk.push_str(&format_row(&[date, &record.answer, &record.model, correct]));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        file.write_all(chunk.as_bytes()).map_err(io_err)?;

        tracing::debug!("Appended {} row to {}", record.provider_id, path.display());
        Ok(path)
    }

    /// Append every successful outcome of a run.
    ///
    /// Only an unusable data directory is an error. A provider whose log
    /// can't be written is recorded in [`UpdateStats::errors`] and the
    /// remaining providers are still appended.
    pub fn update(&self, report: &RunReport) -> Result<UpdateStats, LogError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| LogError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let date = report.date_string();
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for record in report.successes() {
            match self.append(&date, record) {
                Ok(path) => entries.push(UpdateEntry {
                    provider_id: record.provider_id.clone(),
                    model: record.model.clone(),
                    correct: record.correct,
                    path,
                }),
                Err(e) => {
                    tracing::error!("Failed to update log for {}: {}", record.provider_id, e);
                    errors.push(UpdateError {
                        provider_id: record.provider_id.clone(),
                        path: self.path_for(&record.provider_id),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("Updated {} CSV files in {}", entries.len(), self.data_dir.display());

        Ok(UpdateStats {
            date,
            updated_count: entries.len(),
            entries,
            errors,
        })
    }

    /// Read a provider's log; `None` when it doesn't exist
    pub fn read(&self, provider_id: &str) -> Result<Option<Vec<LogRow>>, LogError> {
        let path = self.path_for(provider_id);
        match fs::read_to_string(&path) {
            Ok(content) => parse_log(&content, provider_id)
                .map(Some)
                .map_err(|message| LogError::Parse { path, message }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LogError::Io { path, source }),
        }
    }

    /// Provider ids that have a log in the data directory, sorted
    pub fn providers(&self) -> Result<Vec<String>, LogError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LogError::Io {
                    path: self.data_dir.clone(),
                    source,
                })
            }
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "csv"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\r', '\n'])
}

/// Format one CSV row including its terminator
pub fn format_row(fields: &[&str]) -> String {
    let mut row = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            row.push(',');
        }
        if needs_quotes(field) {
            row.push('"');
            row.push_str(&field.replace('"', "\"\""));
            row.push('"');
        } else {
            row.push_str(field);
        }
    }
    row.push_str("\r\n");
    row
}

/// Split CSV text into records, honouring quoted fields
fn parse_records(content: &str) -> Result<Vec<Vec<String>>, String> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

/// Parse a whole log. Columns are matched by header name; blank lines are skipped.
fn parse_log(content: &str, provider_id: &str) -> Result<Vec<LogRow>, String> {
    let mut records = parse_records(content)?
        .into_iter()
        .filter(|r| r.iter().any(|f| !f.is_empty()));

    let header = match records.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| format!("missing column '{}'", name))
    };
    let date_idx = column("date")?;
    let answer_idx = column("answer")?;
    let model_idx = column("model")?;
    let correct_idx = column("correct")?;

    let rows = records
        .map(|record| {
            let get = |idx: usize| record.get(idx).cloned().unwrap_or_default();
            let model = get(model_idx);
            LogRow {
                date: get(date_idx).trim().to_string(),
                answer: get(answer_idx),
                model: if model.is_empty() {
                    provider_id.to_string()
                } else {
                    model
                },
                correct: get(correct_idx).trim().eq_ignore_ascii_case("true"),
            }
        })
        .collect();

    Ok(rows)
}
