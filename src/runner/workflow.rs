//! Workflow execution orchestration.
//!
//! [`WorkflowRunner`] owns the single [`RunState`] of a workflow and is
//! its only writer. `start` moves the first step to `Running` before it
//! returns, then hands advancement to a spawned Tokio task that awaits the
//! [`StepExecutor`] for each step and records the result.
//!
//! Every run carries a generation number. `reset` bumps it and aborts the
//! advancement task, so results from an abandoned run are discarded.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::StepCatalog;
use crate::error::{BatonError, Result, StepExecutionError};
use crate::gating::{check_inputs, GatingPolicy, InputCheck, UploadedFileRef};

use super::dependency::DependencyGraph;
use super::events::{EventBus, RunEvent};
use super::executor::{StepExecutor, StepOutput};
use super::state::{RunOutcome, RunState, StepStatus};

/// How steps are ordered within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheduling {
    /// One step at a time, in catalog order.
    #[default]
    Sequential,
    /// Waves of steps whose dependencies are complete, run concurrently.
    Graph,
}

/// Options for running a workflow.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Step ordering.
    pub scheduling: Scheduling,
    /// Upload check applied by `start`.
    pub gating: GatingPolicy,
}

/// Orchestrates the execution of a workflow.
pub struct WorkflowRunner {
    shared: Arc<Shared>,
    executor: Arc<dyn StepExecutor>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    catalog: Arc<StepCatalog>,
    graph: DependencyGraph,
    options: RunOptions,
    inner: Mutex<Inner>,
    events: EventBus<RunEvent>,
    changes: watch::Sender<u64>,
}

struct Inner {
    state: RunState,
    generation: u64,
    clock: Option<Instant>,
}

/// Catalog indices of the steps started together.
type Wave = Vec<usize>;

impl WorkflowRunner {
    /// Create a runner over a catalog.
    ///
    /// Fails if the catalog's dependency edges do not form a valid graph.
    pub fn new(
        catalog: StepCatalog,
        executor: impl StepExecutor + 'static,
        options: RunOptions,
    ) -> Result<Self> {
        Self::with_shared_executor(Arc::new(catalog), Arc::new(executor), options)
    }

    /// Create a runner from already shared parts.
    pub fn with_shared_executor(
        catalog: Arc<StepCatalog>,
        executor: Arc<dyn StepExecutor>,
        options: RunOptions,
    ) -> Result<Self> {
        let graph = catalog.dependency_graph()?;
        if let Some(cycle) = graph.find_cycle() {
            return Err(BatonError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let (changes, _) = watch::channel(0);
        let shared = Shared {
            catalog,
            graph,
            options,
            inner: Mutex::new(Inner {
                state: RunState::initial(),
                generation: 0,
                clock: None,
            }),
            events: EventBus::default(),
            changes,
        };

        Ok(Self {
            shared: Arc::new(shared),
            executor,
            task: Mutex::new(None),
        })
    }

    /// The catalog this runner traverses.
    pub fn catalog(&self) -> &StepCatalog {
        &self.shared.catalog
    }

    /// The options this runner was built with.
    pub fn options(&self) -> RunOptions {
        self.shared.options
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.shared.events.subscribe()
    }

    /// Whether the current uploads allow a run to start.
    ///
    /// Always true under [`GatingPolicy::Permissive`].
    pub fn can_start(&self) -> bool {
        match self.shared.options.gating {
            GatingPolicy::Permissive => true,
            GatingPolicy::Strict => self.input_check().is_satisfied(),
        }
    }

    /// Match the current uploads against the catalog's Input steps.
    pub fn input_check(&self) -> InputCheck {
        let inner = self.shared.lock();
        check_inputs(&self.shared.catalog, &inner.state.uploaded_files)
    }

    /// Start a run.
    ///
    /// Fails with [`BatonError::InvalidState`] while a run is in progress
    /// (including one paused for review) and with
    /// [`BatonError::MissingInput`] when strict gating is not satisfied.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| BatonError::invalid_state("Starting a run requires a Tokio runtime"))?;

        let mut events = Vec::new();
        let (generation, wave) = {
            let mut inner = self.shared.lock();
            if inner.state.is_running {
                return Err(BatonError::invalid_state("A run is already in progress"));
            }

            if self.shared.options.gating == GatingPolicy::Strict {
                let check = check_inputs(&self.shared.catalog, &inner.state.uploaded_files);
                if !check.is_satisfied() {
                    return Err(BatonError::MissingInput {
                        missing: check.missing_required(),
                    });
                }
            }

            inner.generation += 1;
            inner.clock = Some(Instant::now());
            inner.state.begin_run(Utc::now());
            info!(
                "Starting run of {} steps ({:?} scheduling)",
                self.shared.catalog.len(),
                self.shared.options.scheduling
            );
            events.push(RunEvent::RunStarted {
                total: self.shared.catalog.len(),
            });

            let wave = self.shared.begin_wave(&mut inner, &mut events);
            (inner.generation, wave)
        };
        self.shared.publish(events);

        if let Some(wave) = wave {
            self.spawn_drive(&runtime, generation, wave);
        }
        Ok(())
    }

    /// Start a run and wait until it settles.
    ///
    /// Returns the outcome (`Completed` or `AwaitingReview`), or the
    /// failure of the step that halted the run.
    pub async fn run(&self) -> Result<RunOutcome> {
        self.start()?;
        self.settle().await
    }

    /// Approve the step at `index`, which must be waiting for review, and
    /// continue the run from the following step.
    ///
    /// Completed records are kept. Fails with [`BatonError::InvalidState`]
    /// unless the run is paused on that step.
    pub fn resume_from(&self, index: usize) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| BatonError::invalid_state("Resuming a run requires a Tokio runtime"))?;

        let mut events = Vec::new();
        let (generation, wave) = {
            let mut inner = self.shared.lock();
            if !inner.state.is_paused {
                return Err(BatonError::invalid_state("No step is waiting for review"));
            }

            let step_id = match self.shared.catalog.list().get(index) {
                Some(step) => step.id.clone(),
                None => {
                    return Err(BatonError::invalid_state(format!(
                        "No step at index {}",
                        index
                    )))
                }
            };

            if !inner.state.approve(&step_id, Utc::now()) {
                return Err(BatonError::invalid_state(format!(
                    "Step '{}' is not waiting for review",
                    step_id
                )));
            }
            debug!("Step '{}' approved", step_id);
            events.push(RunEvent::StepApproved { step_id, index });

            if !inner.state.steps_with_status(StepStatus::NeedsReview).is_empty() {
                // Another step of the same wave still needs sign-off.
                (inner.generation, None)
            } else {
                inner.state.is_paused = false;
                let wave = self.shared.begin_wave(&mut inner, &mut events);
                (inner.generation, wave)
            }
        };
        self.shared.publish(events);

        if let Some(wave) = wave {
            self.spawn_drive(&runtime, generation, wave);
        }
        Ok(())
    }

    /// Approve the step at `index` and wait until the run settles again.
    pub async fn resume_and_settle(&self, index: usize) -> Result<RunOutcome> {
        self.resume_from(index)?;
        self.settle().await
    }

    /// Return to the initial state, abandoning any run in progress.
    ///
    /// Clears execution records, uploaded files and all run flags.
    pub fn reset(&self) {
        {
            let mut inner = self.shared.lock();
            inner.generation += 1;
            inner.clock = None;
            inner.state = RunState::initial();
        }
        if let Some(task) = self.take_task() {
            task.abort();
        }
        debug!("Run reset");
        self.shared.publish(vec![RunEvent::RunReset]);
    }

    /// Add an uploaded file, replacing any file with the same name.
    pub fn add_file(&self, file: UploadedFileRef) -> Result<()> {
        let count = {
            let mut inner = self.shared.lock();
            if inner.state.is_running {
                return Err(BatonError::invalid_state(
                    "Files cannot change while a run is in progress",
                ));
            }
            debug!("Adding file '{}' ({} bytes)", file.name, file.size_bytes);
            inner.state.uploaded_files.add(file);
            inner.state.uploaded_files.len()
        };
        self.shared.publish(vec![RunEvent::FilesChanged { count }]);
        Ok(())
    }

    /// Remove an uploaded file by name.
    pub fn remove_file(&self, name: &str) -> Result<Option<UploadedFileRef>> {
        let (removed, count) = {
            let mut inner = self.shared.lock();
            if inner.state.is_running {
                return Err(BatonError::invalid_state(
                    "Files cannot change while a run is in progress",
                ));
            }
            let removed = inner.state.uploaded_files.remove(name);
            (removed, inner.state.uploaded_files.len())
        };
        if removed.is_some() {
            self.shared.publish(vec![RunEvent::FilesChanged { count }]);
        }
        Ok(removed)
    }

    /// Status of a step; `Pending` when the step has no record yet.
    pub fn status_of(&self, step_id: &str) -> StepStatus {
        self.shared.lock().state.status_of(step_id)
    }

    /// Index of the step most recently started, or -1.
    pub fn current_step_index(&self) -> i64 {
        self.shared.lock().state.current_step_index
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().state.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().state.is_paused
    }

    pub fn is_completed(&self) -> bool {
        self.shared.lock().state.is_completed
    }

    /// Milliseconds since the run started while it is running; the final
    /// duration once it has ended; 0 when idle.
    pub fn elapsed_ms(&self) -> u64 {
        let inner = self.shared.lock();
        match (inner.state.is_running, inner.clock) {
            (true, Some(clock)) => clock.elapsed().as_millis() as u64,
            _ => inner.state.total_elapsed_ms,
        }
    }

    /// Derived run phase.
    pub fn outcome(&self) -> RunOutcome {
        self.shared.lock().state.outcome()
    }

    /// Completed steps and total steps.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self.shared.lock().state.completed_count();
        (completed, self.shared.catalog.len())
    }

    /// A copy of the full run state.
    pub fn snapshot(&self) -> RunState {
        self.shared.lock().state.clone()
    }

    /// Wait until the run is no longer advancing.
    ///
    /// Resolves immediately when idle, completed, failed or paused.
    pub async fn wait_until_settled(&self) -> RunOutcome {
        let mut changes = self.shared.changes.subscribe();
        loop {
            let outcome = self.outcome();
            if outcome != RunOutcome::Running {
                return outcome;
            }
            if changes.changed().await.is_err() {
                return self.outcome();
            }
        }
    }

    async fn settle(&self) -> Result<RunOutcome> {
        let outcome = self.wait_until_settled().await;
        if outcome == RunOutcome::Failed {
            return Err(self.failure());
        }
        Ok(outcome)
    }

    /// The failure that ended the run, as an error.
    fn failure(&self) -> BatonError {
        let inner = self.shared.lock();
        let failed = inner
            .state
            .executions
            .values()
            .find(|r| r.status == StepStatus::Failed);
        match failed {
            Some(record) => BatonError::StepExecution {
                step: record.step_id.clone(),
                message: record.error.clone().unwrap_or_default(),
            },
            None => BatonError::invalid_state(
                inner
                    .state
                    .error
                    .clone()
                    .unwrap_or_else(|| "Run failed".to_string()),
            ),
        }
    }

    fn spawn_drive(&self, runtime: &tokio::runtime::Handle, generation: u64, wave: Wave) {
        let shared = Arc::clone(&self.shared);
        let executor = Arc::clone(&self.executor);
        let handle = runtime.spawn(drive(shared, executor, generation, wave));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);

        // `reset` bumps the generation before taking the handle, so a reset
        // that ran before the store above shows up here.
        if self.shared.lock().generation != generation {
            if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
                task.abort();
            }
        }
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for WorkflowRunner {
    fn drop(&mut self) {
        if let Some(task) = self.take_task() {
            task.abort();
        }
    }
}

/// Advancement loop: execute a wave, record it, start the next.
async fn drive(shared: Arc<Shared>, executor: Arc<dyn StepExecutor>, generation: u64, wave: Wave) {
    let mut guard = AbandonGuard {
        shared: Arc::clone(&shared),
        generation,
        armed: true,
    };

    let mut wave = wave;
    loop {
        if shared.lock().generation != generation {
            break;
        }
        let results = shared.execute_wave(executor.as_ref(), &wave).await;
        match shared.finish_wave(generation, results) {
            Some(next) => wave = next,
            None => break,
        }
    }

    guard.armed = false;
}

/// Fails the run if the advancement task dies without finishing it.
struct AbandonGuard {
    shared: Arc<Shared>,
    generation: u64,
    armed: bool,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if self.armed {
            self.shared.abandon(self.generation);
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, events: Vec<RunEvent>) {
        if events.is_empty() {
            return;
        }
        for event in events {
            self.events.publish(event);
        }
        self.changes.send_modify(|version| *version += 1);
    }

    fn elapsed_ms(inner: &Inner) -> u64 {
        inner
            .clock
            .map(|clock| clock.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Steps that may start now.
    fn ready_steps(&self, state: &RunState) -> Wave {
        let steps = self.catalog.list();
        match self.options.scheduling {
            Scheduling::Sequential => steps
                .iter()
                .position(|s| !state.executions.contains_key(&s.id))
                .into_iter()
                .collect(),
            Scheduling::Graph => {
                let completed: HashSet<String> = state
                    .steps_with_status(StepStatus::Completed)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let started: HashSet<String> = state.executions.keys().cloned().collect();
                self.graph
                    .ready_steps(&completed, &started)
                    .iter()
                    .filter_map(|id| self.catalog.position(id))
                    .collect()
            }
        }
    }

    /// Mark the next wave `Running`, or finish the run when nothing is left.
    fn begin_wave(&self, inner: &mut Inner, events: &mut Vec<RunEvent>) -> Option<Wave> {
        let wave = self.ready_steps(&inner.state);

        if wave.is_empty() {
            let elapsed_ms = Self::elapsed_ms(inner);
            inner.state.finish_completed(elapsed_ms);
            info!("Run completed in {}ms", elapsed_ms);
            events.push(RunEvent::RunCompleted { elapsed_ms });
            return None;
        }

        let now = Utc::now();
        for &index in &wave {
            let step_id = &self.catalog.list()[index].id;
            inner.state.mark_running(step_id, index, now);
            debug!("Step '{}' running (index {})", step_id, index);
            events.push(RunEvent::StepStarted {
                step_id: step_id.clone(),
                index,
            });
        }
        Some(wave)
    }

    async fn execute_wave(
        &self,
        executor: &dyn StepExecutor,
        wave: &[usize],
    ) -> Vec<(usize, std::result::Result<StepOutput, StepExecutionError>)> {
        let steps = self.catalog.list();
        let runs = wave
            .iter()
            .map(|&index| async move { (index, executor.execute(&steps[index]).await) });
        join_all(runs).await
    }

    /// Record a finished wave and begin the next one.
    ///
    /// Returns `None` when advancement stops: the run completed, failed,
    /// paused for review, or belongs to an abandoned generation.
    fn finish_wave(
        &self,
        generation: u64,
        results: Vec<(usize, std::result::Result<StepOutput, StepExecutionError>)>,
    ) -> Option<Wave> {
        let mut events = Vec::new();
        let next = {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!("Discarding results of abandoned run");
                return None;
            }

            let now = Utc::now();
            let mut failure: Option<StepExecutionError> = None;
            let mut review = false;

            for (index, result) in results {
                let step = &self.catalog.list()[index];
                match result {
                    Ok(output) if step.requires_review => {
                        inner.state.mark_needs_review(&step.id, output.logs);
                        debug!("Step '{}' waiting for review", step.id);
                        events.push(RunEvent::StepAwaitingReview {
                            step_id: step.id.clone(),
                            index,
                        });
                        review = true;
                    }
                    Ok(output) => {
                        inner.state.mark_completed(&step.id, output.logs, now);
                        debug!("Step '{}' completed", step.id);
                        events.push(RunEvent::StepCompleted {
                            step_id: step.id.clone(),
                            index,
                        });
                    }
                    Err(err) => {
                        warn!("Step '{}' failed: {}", step.id, err.message);
                        inner.state.mark_failed(&step.id, &err.message, now);
                        events.push(RunEvent::StepFailed {
                            step_id: step.id.clone(),
                            index,
                            error: err.message.clone(),
                        });
                        failure.get_or_insert(err);
                    }
                }
            }

            if let Some(err) = failure {
                // Review steps of a failed wave settle as completed.
                if review {
                    for (index, step) in self.catalog.list().iter().enumerate() {
                        if inner.state.approve(&step.id, now) {
                            debug!("Step '{}' completed without review", step.id);
                            events.push(RunEvent::StepCompleted {
                                step_id: step.id.clone(),
                                index,
                            });
                        }
                    }
                }
                let blocked: Vec<String> = self
                    .catalog
                    .list()
                    .iter()
                    .filter(|s| !inner.state.executions.contains_key(&s.id))
                    .map(|s| s.id.clone())
                    .collect();
                let elapsed_ms = Self::elapsed_ms(&inner);
                let step_id = err.step.clone();
                inner
                    .state
                    .finish_failed(BatonError::from(err).to_string(), elapsed_ms);
                info!(
                    "Run failed at step '{}' after {}ms ({} steps not run)",
                    step_id,
                    elapsed_ms,
                    blocked.len()
                );
                events.push(RunEvent::RunFailed {
                    step_id,
                    elapsed_ms,
                    blocked,
                });
                None
            } else if review {
                inner.state.is_paused = true;
                None
            } else {
                self.begin_wave(&mut inner, &mut events)
            }
        };
        self.publish(events);
        next
    }

    /// Fail a run whose advancement task ended unexpectedly.
    fn abandon(&self, generation: u64) {
        let mut events = Vec::new();
        {
            let mut inner = self.lock();
            if inner.generation != generation || !inner.state.is_running || inner.state.is_paused
            {
                return;
            }

            let now = Utc::now();
            let running: Vec<String> = inner
                .state
                .steps_with_status(StepStatus::Running)
                .into_iter()
                .map(str::to_string)
                .collect();
            let message = "step execution was interrupted";
            for step_id in &running {
                inner.state.mark_failed(step_id, message, now);
            }

            let step_id = running.first().cloned().unwrap_or_default();
            let elapsed_ms = Self::elapsed_ms(&inner);
            warn!("Advancement stopped unexpectedly at '{}'", step_id);
            inner.state.finish_failed(
                format!("Step '{}' failed: {}", step_id, message),
                elapsed_ms,
            );
            events.push(RunEvent::RunFailed {
                step_id,
                elapsed_ms,
                blocked: Vec::new(),
            });
        }
        self.publish(events);
    }
}
