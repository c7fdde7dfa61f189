//! Run history.
//!
//! [`RunHistory`] keeps an in-memory list of finished runs, newest first.
//! It starts out seeded with the sample runs shown on a fresh install.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::runner::{RunOutcome, RunState};

/// A record of a single finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Sequential id such as `EX-043`.
    pub id: String,

    /// Which workflow was executed.
    pub workflow: String,

    /// When the run started.
    pub timestamp: DateTime<Utc>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,

    /// Overall status.
    pub status: RunStatus,

    pub steps_completed: usize,
    pub total_steps: usize,

    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

const ID_PREFIX: &str = "EX-";

/// In-memory list of past runs, newest first.
#[derive(Debug, Clone, Default)]
pub struct RunHistory {
    records: Vec<RunRecord>,
}

impl RunHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History seeded with the sample runs.
    pub fn seeded() -> Self {
        let samples = [
            ("EX-042", "November 2024", (2024, 11, 28), 263_000, RunStatus::Completed, 10),
            ("EX-041", "October 2024", (2024, 10, 30), 312_000, RunStatus::Completed, 10),
            ("EX-040", "October 2024", (2024, 10, 29), 165_000, RunStatus::Failed, 4),
            ("EX-039", "September 2024", (2024, 9, 28), 248_000, RunStatus::Completed, 10),
            ("EX-038", "August 2024", (2024, 8, 29), 295_000, RunStatus::Completed, 10),
            ("EX-037", "July 2024", (2024, 7, 30), 272_000, RunStatus::Completed, 10),
        ];

        let records = samples
            .into_iter()
            .filter_map(|(id, period, (y, m, d), duration_ms, status, steps_completed)| {
                let timestamp = NaiveDate::from_ymd_opt(y, m, d)?
                    .and_hms_opt(9, 0, 0)?
                    .and_utc();
                Some(RunRecord {
                    id: id.to_string(),
                    workflow: format!("Monthly FP&A Report - {}", period),
                    timestamp,
                    duration_ms,
                    status,
                    steps_completed,
                    total_steps: 10,
                    error: None,
                })
            })
            .collect();

        Self { records }
    }

    /// Record a finished run.
    ///
    /// Returns `None`, recording nothing, when the state is not completed
    /// or failed.
    pub fn record(
        &mut self,
        workflow: &str,
        state: &RunState,
        total_steps: usize,
    ) -> Option<&RunRecord> {
        let outcome = state.outcome();
        if !outcome.is_finished() {
            return None;
        }
        let status = if outcome == RunOutcome::Completed {
            RunStatus::Completed
        } else {
            RunStatus::Failed
        };

        let record = RunRecord {
            id: self.next_id(),
            workflow: workflow.to_string(),
            timestamp: state.started_at.unwrap_or_else(Utc::now),
            duration_ms: state.total_elapsed_ms,
            status,
            steps_completed: state.completed_count(),
            total_steps,
            error: state.error.clone(),
        };
        self.records.insert(0, record);
        self.records.first()
    }

    /// Up to `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> &[RunRecord] {
        &self.records[..limit.min(self.records.len())]
    }

    /// All records, newest first.
    pub fn all(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn next_id(&self) -> String {
        let last = self
            .records
            .iter()
            .filter_map(|r| r.id.strip_prefix(ID_PREFIX)?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{:03}", ID_PREFIX, last + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(completed: bool) -> RunState {
        let mut state = RunState::initial();
        state.started_at = Some(Utc::now());
        state.total_elapsed_ms = 1234;
        if completed {
            state.is_completed = true;
        } else {
            state.error = Some("Step 'step-4' failed: totals differ".to_string());
        }
        state
    }

    #[test]
    fn seeded_history_is_newest_first() {
        let history = RunHistory::seeded();
        assert_eq!(history.len(), 6);
        assert_eq!(history.all()[0].id, "EX-042");
        assert_eq!(history.all()[5].id, "EX-037");
        assert_eq!(history.all()[2].status, RunStatus::Failed);
        assert_eq!(history.all()[2].steps_completed, 4);
    }

    #[test]
    fn record_assigns_next_sequential_id() {
        let mut history = RunHistory::seeded();
        let record = history.record("Monthly report", &finished(true), 11).unwrap();

        assert_eq!(record.id, "EX-043");
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.duration_ms, 1234);
        assert_eq!(record.total_steps, 11);
        assert_eq!(history.all()[0].id, "EX-043");
    }

    #[test]
    fn record_failed_run_keeps_error() {
        let mut history = RunHistory::new();
        let record = history.record("Monthly report", &finished(false), 11).unwrap();

        assert_eq!(record.id, "EX-001");
        assert_eq!(record.status, RunStatus::Failed);
        assert!(record.error.as_deref().unwrap().contains("step-4"));
    }

    #[test]
    fn unfinished_runs_are_not_recorded() {
        let mut history = RunHistory::new();
        assert!(history
            .record("Monthly report", &RunState::initial(), 11)
            .is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn recent_limits_results() {
        let history = RunHistory::seeded();
        assert_eq!(history.recent(2).len(), 2);
        assert_eq!(history.recent(100).len(), 6);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn run_record_serializes() {
        let history = RunHistory::seeded();
        let json = serde_json::to_string(&history.all()[0]).unwrap();
        assert!(json.contains("\"status\":\"completed\""));
        assert!(!json.contains("error"));
    }
}
