//! Run command implementation.
//!
//! The `baton run` command executes the workflow, rendering each step as
//! the runner reports it.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::cli::args::RunArgs;
use crate::config::BatonConfig;
use crate::error::{BatonError, Result};
use crate::gating::{GatingPolicy, UploadedFileRef};
use crate::history::{RunHistory, RunRecord};
use crate::runner::{
    RunEvent, RunOptions, RunOutcome, RunState, Scheduling, SimulatedExecutor, WorkflowRunner,
};
use crate::ui::{format_duration, OutputMode, RunSummary, SpinnerHandle, UserInterface};

use super::dispatcher::{
    load_command_config, Command, CommandResult, EXIT_FAILURE, EXIT_PRECONDITION,
};

/// Message recorded on steps made to fail with `--fail`.
const FORCED_FAILURE: &str = "failure requested with --fail";

/// The run command implementation.
pub struct RunCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: RunArgs,
}

/// How the event loop ended.
enum Ending {
    Finished { blocked: Vec<String> },
    Declined { step_id: String },
}

/// `--json` output.
#[derive(Serialize)]
struct RunReport<'a> {
    workflow: &'a str,
    outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<&'a RunRecord>,
    state: &'a RunState,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(project_root: &Path, args: RunArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config_override: None,
            args,
        }
    }

    /// Load configuration from this file instead of `.baton/`.
    pub fn with_config_override(mut self, path: Option<&Path>) -> Self {
        self.config_override = path.map(Path::to_path_buf);
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    /// Build run options from config and flags.
    fn build_options(&self, config: &BatonConfig) -> RunOptions {
        let mut options = config.run_options();
        if self.args.graph {
            options.scheduling = Scheduling::Graph;
        }
        if self.args.strict {
            options.gating = GatingPolicy::Strict;
        }
        options
    }

    fn build_executor(&self, config: &BatonConfig) -> SimulatedExecutor {
        let time_scale = self.args.time_scale.unwrap_or(config.settings.time_scale);
        self.args.fail.iter().fold(
            SimulatedExecutor::new().with_time_scale(time_scale),
            |executor, step_id| executor.fail_step(step_id.as_str(), FORCED_FAILURE),
        )
    }

    /// Follow the run's events until it finishes or a review is declined.
    async fn follow(
        &self,
        runner: &WorkflowRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<Option<Ending>> {
        let mut events = runner.subscribe();
        match runner.start() {
            Ok(()) => {}
            Err(e @ BatonError::MissingInput { .. }) => {
                ui.error(&e.to_string());
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        let total = runner.catalog().len();
        let names: HashMap<&str, &str> = runner
            .catalog()
            .list()
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect();
        let name_of = |id: &str| names.get(id).copied().unwrap_or("?").to_string();

        let mut spinners: HashMap<String, Box<dyn SpinnerHandle>> = HashMap::new();
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Renderer skipped {} run events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    return Ok(Some(Ending::Finished {
                        blocked: Vec::new(),
                    }))
                }
            };

            match event {
                RunEvent::StepStarted { step_id, index } => {
                    ui.show_progress(index + 1, total);
                    let spinner = ui.start_spinner(&format!("{}...", name_of(&step_id)));
                    spinners.insert(step_id, spinner);
                }
                RunEvent::StepCompleted { step_id, .. } => {
                    let state = runner.snapshot();
                    let record = state.executions.get(&step_id);
                    let took = record
                        .and_then(|r| r.duration_ms())
                        .map(|ms| format_duration(Duration::from_millis(ms)))
                        .unwrap_or_default();
                    if let Some(mut spinner) = spinners.remove(&step_id) {
                        spinner.finish_success(&format!("{} ({})", name_of(&step_id), took));
                    }
                    if ui.output_mode().shows_logs() {
                        for line in record.map(|r| r.logs.as_slice()).unwrap_or_default() {
                            ui.message(&format!("    {}", line));
                        }
                    }
                }
                RunEvent::StepFailed { step_id, error, .. } => {
                    if let Some(mut spinner) = spinners.remove(&step_id) {
                        spinner.finish_error(&format!("{} failed: {}", name_of(&step_id), error));
                    }
                }
                RunEvent::StepAwaitingReview { step_id, index } => {
                    let name = name_of(&step_id);
                    if let Some(mut spinner) = spinners.remove(&step_id) {
                        spinner.finish_review(&format!("{} needs review", name));
                    }
                    let approved = self.args.auto_approve
                        || ui.confirm(&format!("Approve '{}'?", name), false)?;
                    if !approved {
                        return Ok(Some(Ending::Declined { step_id }));
                    }
                    runner.resume_from(index)?;
                }
                RunEvent::StepApproved { step_id, .. } => {
                    ui.success(&format!("{} approved", name_of(&step_id)));
                }
                RunEvent::RunCompleted { .. } => {
                    return Ok(Some(Ending::Finished {
                        blocked: Vec::new(),
                    }))
                }
                RunEvent::RunFailed { blocked, .. } => {
                    return Ok(Some(Ending::Finished { blocked }));
                }
                RunEvent::RunStarted { .. }
                | RunEvent::RunReset
                | RunEvent::FilesChanged { .. } => {}
            }
        }
    }
}

/// Turn file paths into upload references.
///
/// Reports the first unreadable path through `ui` and returns `None`.
pub(crate) fn read_uploads(
    paths: &[PathBuf],
    ui: &mut dyn UserInterface,
) -> Option<Vec<UploadedFileRef>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        match (name, fs::metadata(path)) {
            (Some(name), Ok(meta)) if meta.is_file() => {
                uploads.push(UploadedFileRef::new(name, meta.len()));
            }
            _ => {
                ui.error(&format!("Input file not found: {}", path.display()));
                return None;
            }
        }
    }
    Some(uploads)
}

impl Command for RunCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) =
            load_command_config(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(EXIT_PRECONDITION));
        };
        if self.args.json {
            ui.set_output_mode(OutputMode::Silent);
        }

        let Some(uploads) = read_uploads(&self.args.files, ui) else {
            return Ok(CommandResult::failure(EXIT_PRECONDITION));
        };

        let workflow = config.workflow_name();
        let runner = WorkflowRunner::new(
            config.catalog()?,
            self.build_executor(&config),
            self.build_options(&config),
        )?;
        for upload in uploads {
            runner.add_file(upload)?;
        }

        ui.show_header(workflow);
        if ui.output_mode() == OutputMode::Verbose {
            let options = runner.options();
            ui.message(&format!(
                "{} steps, {:?} scheduling, {:?} gating",
                runner.catalog().len(),
                options.scheduling,
                options.gating
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let Some(ending) = runtime.block_on(self.follow(&runner, ui))? else {
            return Ok(CommandResult::failure(EXIT_PRECONDITION));
        };

        let state = runner.snapshot();
        let total_steps = runner.catalog().len();
        let mut history = RunHistory::seeded();
        let record = history.record(workflow, &state, total_steps);

        let blocked = match &ending {
            Ending::Finished { blocked } => blocked.clone(),
            Ending::Declined { .. } => Vec::new(),
        };
        ui.show_summary(&RunSummary {
            workflow: workflow.to_string(),
            outcome: state.outcome(),
            steps_completed: state.completed_count(),
            total_steps,
            elapsed_ms: runner.elapsed_ms(),
            blocked,
        });

        if self.args.json {
            let report = RunReport {
                workflow,
                outcome: state.outcome(),
                record,
                state: &state,
            };
            let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }

        match (ending, state.outcome()) {
            (Ending::Declined { step_id }, _) => {
                ui.warning(&format!("Run stopped: '{}' was not approved", step_id));
                Ok(CommandResult::failure(EXIT_FAILURE))
            }
            (_, RunOutcome::Completed) => {
                if let Some(record) = record {
                    ui.success(&format!("Run {} complete", record.id));
                }
                Ok(CommandResult::success())
            }
            _ => {
                if let Some(error) = &state.error {
                    ui.error(error);
                }
                Ok(CommandResult::failure(EXIT_FAILURE))
            }
        }
    }
}
