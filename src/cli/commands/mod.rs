//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! [`CommandDispatcher`] routes each subcommand to its implementation.
//! Commands that read the workflow share `load_command_config`.

pub mod check;
pub mod dispatcher;
pub mod history;
pub mod list;
pub mod run;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
