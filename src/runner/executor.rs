//! Step executors.
//!
//! A [`StepExecutor`] performs the unit of work behind one step. The
//! runner awaits it between the `Running` and `Completed` transitions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::catalog::StepDefinition;
use crate::error::StepExecutionError;

/// What a step produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Log lines to attach to the step's execution record.
    pub logs: Vec<String>,
}

impl StepOutput {
    pub fn with_logs(logs: Vec<String>) -> Self {
        Self { logs }
    }
}

/// Performs the work of a single step.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute the step. An error halts the run and marks the step failed.
    async fn execute(&self, step: &StepDefinition) -> Result<StepOutput, StepExecutionError>;
}

/// Executor that stands in for real work by sleeping.
///
/// Each step sleeps for its simulated duration multiplied by the time
/// scale and returns the step's canned log lines. Steps registered with
/// [`fail_step`](Self::fail_step) sleep the same amount and then fail.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    time_scale: f64,
    failures: HashMap<String, String>,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedExecutor {
    /// Create an executor running at real-time speed.
    pub fn new() -> Self {
        Self {
            time_scale: 1.0,
            failures: HashMap::new(),
        }
    }

    /// Scale every simulated duration (0.5 runs twice as fast).
    ///
    /// Negative and non-finite scales are treated as zero.
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = if time_scale.is_finite() {
            time_scale.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// Make a step fail with the given message.
    pub fn fail_step(mut self, step_id: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(step_id.into(), message.into());
        self
    }

    /// How long this executor spends on a step. Saturates at
    /// `Duration::MAX`.
    pub fn delay_for(&self, step: &StepDefinition) -> Duration {
        let secs = step.simulated_duration().as_secs_f64() * self.time_scale;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[async_trait]
impl StepExecutor for SimulatedExecutor {
    async fn execute(&self, step: &StepDefinition) -> Result<StepOutput, StepExecutionError> {
        let delay = self.delay_for(step);
        debug!("Simulating step '{}' for {:?}", step.id, delay);
        tokio::time::sleep(delay).await;

        if let Some(message) = self.failures.get(&step.id) {
            return Err(StepExecutionError::new(&step.id, message.clone()));
        }

        Ok(StepOutput::with_logs(step.logs.clone()))
    }
}
