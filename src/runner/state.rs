//! Run state and per-step execution records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::gating::UploadSet;

/// Status of a step in the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step is waiting to run.
    #[default]
    Pending,

    /// Step is currently executing.
    Running,

    /// Step completed successfully.
    Completed,

    /// Step failed and halted the run.
    Failed,

    /// Step finished its work and waits for human sign-off.
    NeedsReview,
}

impl StepStatus {
    /// Check if this is a terminal state (no more changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }

    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Pending => '○',
            StepStatus::Running => '◉',
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::NeedsReview => '?',
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::NeedsReview => "needs_review",
        };
        write!(f, "{}", s)
    }
}

/// Execution record for one step of one run.
///
/// `started_at` is set once, on the transition into `Running`.
/// `completed_at` is set iff the status is `Completed` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepExecutionRecord {
    pub step_id: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Log lines produced by the step's executor.
    pub logs: Vec<String>,
    /// Failure reason, for `Failed` records.
    pub error: Option<String>,
}

impl StepExecutionRecord {
    fn running(step_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            step_id: step_id.to_string(),
            status: StepStatus::Running,
            started_at: Some(now),
            completed_at: None,
            logs: Vec::new(),
            error: None,
        }
    }

    /// Time between start and completion, when both are known.
    pub fn duration_ms(&self) -> Option<u64> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        Some((completed - started).num_milliseconds().max(0) as u64)
    }
}

/// Derived phase of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// No run has started since the last reset.
    Idle,
    /// Steps are advancing.
    Running,
    /// Paused on a step in `NeedsReview`.
    AwaitingReview,
    /// Every step completed.
    Completed,
    /// A step failed and the run halted.
    Failed,
}

impl RunOutcome {
    /// Whether the run has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        matches!(self, RunOutcome::Completed | RunOutcome::Failed)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunOutcome::Idle => "idle",
            RunOutcome::Running => "running",
            RunOutcome::AwaitingReview => "awaiting_review",
            RunOutcome::Completed => "completed",
            RunOutcome::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Full state of the workflow run.
///
/// Only the runner mutates this; callers receive clones via
/// [`WorkflowRunner::snapshot`](super::WorkflowRunner::snapshot).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunState {
    pub is_running: bool,
    /// Waiting for `resume_from`; `is_running` stays true while paused.
    pub is_paused: bool,
    pub is_completed: bool,
    /// Catalog index of the step most recently moved to `Running`, or -1.
    pub current_step_index: i64,
    pub executions: HashMap<String, StepExecutionRecord>,
    pub uploaded_files: UploadSet,
    pub started_at: Option<DateTime<Utc>>,
    /// Final run duration, set when the run completes or fails.
    pub total_elapsed_ms: u64,
    /// Failure that ended the run, if any.
    pub error: Option<String>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            is_running: false,
            is_paused: false,
            is_completed: false,
            current_step_index: -1,
            executions: HashMap::new(),
            uploaded_files: UploadSet::new(),
            started_at: None,
            total_elapsed_ms: 0,
            error: None,
        }
    }
}

impl RunState {
    /// The canonical initial state.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Status of a step; `Pending` when no record exists yet.
    pub fn status_of(&self, step_id: &str) -> StepStatus {
        self.executions
            .get(step_id)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    /// Derived run phase.
    pub fn outcome(&self) -> RunOutcome {
        if self.is_completed {
            RunOutcome::Completed
        } else if self.is_paused {
            RunOutcome::AwaitingReview
        } else if self.is_running {
            RunOutcome::Running
        } else if self.error.is_some() {
            RunOutcome::Failed
        } else {
            RunOutcome::Idle
        }
    }

    /// Number of steps with a `Completed` record.
    pub fn completed_count(&self) -> usize {
        self.executions
            .values()
            .filter(|r| r.status == StepStatus::Completed)
            .count()
    }

    /// Ids of steps currently in the given status.
    pub fn steps_with_status(&self, status: StepStatus) -> Vec<&str> {
        self.executions
            .values()
            .filter(|r| r.status == status)
            .map(|r| r.step_id.as_str())
            .collect()
    }

    /// Begin a new run, keeping the upload set.
    pub(crate) fn begin_run(&mut self, now: DateTime<Utc>) {
        self.executions.clear();
        self.is_running = true;
        self.is_paused = false;
        self.is_completed = false;
        self.current_step_index = 0;
        self.started_at = Some(now);
        self.total_elapsed_ms = 0;
        self.error = None;
    }

    /// Move a step to `Running` and advance the current index.
    ///
    /// The index never decreases within a run.
    pub(crate) fn mark_running(&mut self, step_id: &str, index: usize, now: DateTime<Utc>) {
        self.current_step_index = self.current_step_index.max(index as i64);
        self.executions
            .insert(step_id.to_string(), StepExecutionRecord::running(step_id, now));
    }

    pub(crate) fn mark_completed(&mut self, step_id: &str, logs: Vec<String>, now: DateTime<Utc>) {
        if let Some(record) = self.executions.get_mut(step_id) {
            record.status = StepStatus::Completed;
            record.completed_at = Some(now);
            record.logs.extend(logs);
        }
    }

    pub(crate) fn mark_needs_review(&mut self, step_id: &str, logs: Vec<String>) {
        if let Some(record) = self.executions.get_mut(step_id) {
            record.status = StepStatus::NeedsReview;
            record.logs.extend(logs);
        }
    }

    pub(crate) fn mark_failed(&mut self, step_id: &str, error: &str, now: DateTime<Utc>) {
        if let Some(record) = self.executions.get_mut(step_id) {
            record.status = StepStatus::Failed;
            record.completed_at = Some(now);
            record.error = Some(error.to_string());
        }
    }

    /// Approve a step waiting for review.
    ///
    /// Returns false if the step is not in `NeedsReview`.
    pub(crate) fn approve(&mut self, step_id: &str, now: DateTime<Utc>) -> bool {
        match self.executions.get_mut(step_id) {
            Some(record) if record.status == StepStatus::NeedsReview => {
                record.status = StepStatus::Completed;
                record.completed_at = Some(now);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn finish_completed(&mut self, elapsed_ms: u64) {
        self.is_running = false;
        self.is_paused = false;
        self.is_completed = true;
        self.total_elapsed_ms = elapsed_ms;
    }

    pub(crate) fn finish_failed(&mut self, error: String, elapsed_ms: u64) {
        self.is_running = false;
        self.is_paused = false;
        self.is_completed = false;
        self.total_elapsed_ms = elapsed_ms;
        self.error = Some(error);
    }
}
