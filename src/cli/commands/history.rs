//! History command implementation.
//!
//! The `baton history` command shows past runs, newest first.

use crate::cli::args::HistoryArgs;
use crate::error::Result;
use crate::history::{RunHistory, RunRecord, RunStatus};
use crate::ui::{format_timer, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// The history command implementation.
pub struct HistoryCommand {
    args: HistoryArgs,
}

impl HistoryCommand {
    /// Create a new history command.
    pub fn new(args: HistoryArgs) -> Self {
        Self { args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &HistoryArgs {
        &self.args
    }

    /// Format a single run entry line.
    fn format_run_line(run: &RunRecord) -> String {
        let status = match run.status {
            RunStatus::Completed => "[ok]",
            RunStatus::Failed => "[FAIL]",
        };

        format!(
            "{} {} {} - {} ({}/{} steps, {})",
            status,
            run.id,
            run.timestamp.format("%Y-%m-%d %H:%M"),
            run.workflow,
            run.steps_completed,
            run.total_steps,
            format_timer(run.duration_ms)
        )
    }
}

impl Command for HistoryCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let history = RunHistory::seeded();
        let runs = history.recent(self.args.limit);

        if self.args.json {
            let json = serde_json::to_string_pretty(runs).map_err(anyhow::Error::from)?;
            println!("{}", json);
            return Ok(CommandResult::success());
        }

        if runs.is_empty() {
            ui.message("No runs recorded yet.");
            return Ok(CommandResult::success());
        }

        ui.show_header("Run history");
        for run in runs {
            ui.message(&Self::format_run_line(run));
            if let Some(error) = &run.error {
                ui.message(&format!("    {}", error));
            }
        }

        let total = history.len();
        if total > runs.len() {
            ui.message(&format!("({} of {} runs shown)", runs.len(), total));
        }

        Ok(CommandResult::success())
    }
}
