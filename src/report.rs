//! Structured results returned by the ingestion entry points.
//!
//! Entry points never propagate failures past their boundary: they fold the
//! outcome and whatever statistics were gathered so far into a `RunReport`
//! that a scheduler can inspect without error handling.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::FetchError;
use crate::sink::WriteError;

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("write failed: {0}")]
    Write(#[from] WriteError),
    #[error("record shaping failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Counters per entity family; zero for stages that never ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionStats {
    pub teams: usize,
    pub players: usize,
    pub gameweeks: usize,
    pub player_stats: usize,
    pub fixtures: usize,
    pub leagues: usize,
    pub managers: usize,
    pub picks: usize,
    pub performance: usize,
    pub skipped_items: usize,
    pub skipped_managers: usize,
    pub failed_batches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub message: String,
    pub stats: IngestionStats,
    pub timestamp: DateTime<Utc>,
}

impl RunReport {
    pub fn from_outcome(outcome: Result<(), IngestionError>, stats: IngestionStats, success_message: &str) -> Self {
        let (status, message) = match outcome {
            Ok(()) => (RunStatus::Success, success_message.to_string()),
            Err(e) => (RunStatus::Error, e.to_string()),
        };
        RunReport {
            status,
            message,
            stats,
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_report_serializes_lowercase_status() {
        let stats = IngestionStats {
            teams: 20,
            ..Default::default()
        };
        let report = RunReport::from_outcome(Ok(()), stats, "FPL data ingestion completed");
        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "FPL data ingestion completed");
        assert_eq!(json["stats"]["teams"], 20);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn error_report_keeps_partial_stats() {
        let stats = IngestionStats {
            teams: 20,
            players: 600,
            ..Default::default()
        };
        let err = IngestionError::Fetch(FetchError::Http {
            endpoint: "leagues-classic/1/standings/".to_string(),
            status: 503,
            body: String::new(),
        });
        let report = RunReport::from_outcome(Err(err), stats.clone(), "unused");
        assert!(!report.is_success());
        assert_eq!(report.stats, stats);
        assert!(report.message.contains("http 503"));
    }
}
