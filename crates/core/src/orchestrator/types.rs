//! Types for the batch orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::publisher::PublisherError;

/// Errors that abort a whole run. Per-item problems never surface here;
/// they are captured in the item's outcome instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Fatal backend error (bad credentials, missing configuration).
    #[error("publisher error: {0}")]
    Publisher(#[from] PublisherError),

    /// Connection preflight failed before any item was processed.
    #[error("connection preflight failed: {0}")]
    Preflight(String),
}

/// Per-item processing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    /// Already mapped with an identical spec; no work performed.
    Skipped,
    Optimizing,
    Publishing,
    Describing,
    Recorded,
    Failed,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Pending => "pending",
            ItemState::Skipped => "skipped",
            ItemState::Optimizing => "optimizing",
            ItemState::Publishing => "publishing",
            ItemState::Describing => "describing",
            ItemState::Recorded => "recorded",
            ItemState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Skipped | ItemState::Recorded | ItemState::Failed
        )
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one batch item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub source_id: String,
    pub state: ItemState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw source size (0 when the backend fetched server-side).
    pub bytes_in: u64,
    /// Optimized size (0 when the backend fetched server-side).
    pub bytes_out: u64,
}

impl ItemOutcome {
    pub fn skipped(source_id: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            state: ItemState::Skipped,
            public_url: Some(public_url.into()),
            error: None,
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    pub fn recorded(
        source_id: impl Into<String>,
        public_url: impl Into<String>,
        bytes_in: u64,
        bytes_out: u64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            state: ItemState::Recorded,
            public_url: Some(public_url.into()),
            error: None,
            bytes_in,
            bytes_out,
        }
    }

    pub fn failed(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            state: ItemState::Failed,
            public_url: None,
            error: Some(reason.into()),
            bytes_in: 0,
            bytes_out: 0,
        }
    }
}

/// One failed item with its reason, for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    pub source_id: String,
    pub reason: String,
}

/// Summary of one batch run. Fresh each run, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Items that reached `recorded` this run.
    pub processed: usize,
    /// Items skipped because they were already mapped with the same spec.
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
    /// Total raw bytes of locally processed sources.
    pub bytes_in: u64,
    /// Total optimized bytes of locally processed sources.
    pub bytes_out: u64,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn from_outcomes(
        run_id: String,
        started_at: DateTime<Utc>,
        items: Vec<ItemOutcome>,
    ) -> Self {
        let processed = items
            .iter()
            .filter(|i| i.state == ItemState::Recorded)
            .count();
        let skipped = items
            .iter()
            .filter(|i| i.state == ItemState::Skipped)
            .count();
        let failures: Vec<ItemFailure> = items
            .iter()
            .filter(|i| i.state == ItemState::Failed)
            .map(|i| ItemFailure {
                source_id: i.source_id.clone(),
                reason: i
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown failure".to_string()),
            })
            .collect();
        let bytes_in = items.iter().map(|i| i.bytes_in).sum();
        let bytes_out = items.iter().map(|i| i.bytes_out).sum();

        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            processed,
            skipped,
            failed: failures.len(),
            failures,
            bytes_in,
            bytes_out,
            items,
        }
    }

    /// Bytes saved by optimization for locally processed items.
    pub fn bytes_saved(&self) -> i64 {
        self.bytes_in as i64 - self.bytes_out as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let items = vec![
            ItemOutcome::recorded("a", "https://cdn/a", 1000, 400),
            ItemOutcome::skipped("b", "https://cdn/b"),
            ItemOutcome::failed("c", "decode error"),
            ItemOutcome::recorded("d", "https://cdn/d", 2000, 900),
        ];
        let report = BatchReport::from_outcomes("run-1".to_string(), Utc::now(), items);

        assert_eq!(report.processed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].source_id, "c");
        assert_eq!(report.failures[0].reason, "decode error");
        assert_eq!(report.bytes_in, 3000);
        assert_eq!(report.bytes_out, 1300);
        assert_eq!(report.bytes_saved(), 1700);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ItemState::Recorded.is_terminal());
        assert!(ItemState::Skipped.is_terminal());
        assert!(ItemState::Failed.is_terminal());
        assert!(!ItemState::Publishing.is_terminal());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ItemOutcome::failed("https://ex.com/x.bin", "undecodable");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"failed\""));
        let parsed: ItemOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.state, ItemState::Failed);
    }
}
