use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Weather,
    Yield,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Weather => "weather",
            Dataset::Yield => "yield",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weather" => Some(Dataset::Weather),
            "yield" => Some(Dataset::Yield),
            _ => None,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit line for one processed source file. Every file gets exactly one,
/// including files that could not be read at all (`error` is set and
/// `rows_loaded` is zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionLogEntry {
    pub sequence: usize,
    pub dataset: Dataset,
    pub source_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub rows_loaded: usize,
    pub rows_rejected: usize,
    pub error: Option<String>,
}

impl IngestionLogEntry {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    pub fn summary(&self) -> String {
        match &self.error {
            Some(error) => format!(
                "#{} {} {}: FAILED ({})",
                self.sequence, self.dataset, self.source_id, error
            ),
            None => format!(
                "#{} {} {}: {} rows loaded, {} rejected in {} ms",
                self.sequence,
                self.dataset,
                self.source_id,
                self.rows_loaded,
                self.rows_rejected,
                self.elapsed_ms()
            ),
        }
    }
}
