//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands, RunArgs};
use crate::config::{load_config_or_default, BatonConfig};
use crate::error::{BatonError, Result};
use crate::ui::{OutputMode, UserInterface};

use super::check::CheckCommand;
use super::history::HistoryCommand;
use super::list::ListCommand;
use super::run::RunCommand;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command, reporting through `ui`.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Exit code for a run that failed or was declined.
pub const EXIT_FAILURE: i32 = 1;

/// Exit code for problems found before anything ran: bad config,
/// missing input files.
pub const EXIT_PRECONDITION: i32 = 2;

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            config_override: None,
        }
    }

    /// Load configuration from this file instead of `.baton/`.
    pub fn with_config_override(mut self, path: Option<PathBuf>) -> Self {
        self.config_override = path;
        self
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Dispatch and execute a command.
    ///
    /// Routes the CLI subcommand to the appropriate command implementation
    /// and executes it. Without a subcommand, runs the workflow.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let root = self.project_root.as_path();
        let config = self.config_override.as_deref();
        let command: Box<dyn Command> = match &cli.command {
            Some(Commands::Run(args)) => {
                Box::new(RunCommand::new(root, args.clone()).with_config_override(config))
            }
            Some(Commands::List(args)) => {
                Box::new(ListCommand::new(root, args.clone()).with_config_override(config))
            }
            Some(Commands::Check(args)) => {
                Box::new(CheckCommand::new(root, args.clone()).with_config_override(config))
            }
            Some(Commands::History(args)) => Box::new(HistoryCommand::new(args.clone())),
            None => Box::new(RunCommand::new(root, RunArgs::default()).with_config_override(config)),
        };
        command.execute(ui)
    }
}

/// Load the project's configuration for a command.
///
/// Applies the configured `default_output` unless a flag already changed
/// the mode. Configuration problems are reported through `ui` and yield
/// `None`.
pub(crate) fn load_command_config(
    project_root: &Path,
    config_override: Option<&Path>,
    ui: &mut dyn UserInterface,
) -> Result<Option<BatonConfig>> {
    match load_config_or_default(project_root, config_override) {
        Ok(config) => {
            if ui.output_mode() == OutputMode::Normal {
                ui.set_output_mode(config.settings.default_output);
            }
            Ok(Some(config))
        }
        Err(
            e @ (BatonError::ConfigNotFound { .. }
            | BatonError::ConfigParseError { .. }
            | BatonError::ConfigValidationError { .. }
            | BatonError::CircularDependency { .. }),
        ) => {
            ui.error(&e.to_string());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
