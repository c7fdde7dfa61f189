//! Terminal user interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//! - Spinners, review prompts and time/size formatting
//!
//! # Example
//!
//! ```
//! use baton::ui::{create_ui, OutputMode};
//!
//! // Non-interactive mode never blocks on input
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("Monthly report");
//! ui.success("Run complete");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod progress;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::MockUI;
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use progress::{format_duration, format_file_size, format_timer};
pub use prompts::confirm;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, BatonTheme};

use crate::error::Result;
use crate::runner::RunOutcome;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Change the output mode.
    fn set_output_mode(&mut self, mode: OutputMode);

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Start a spinner for a running step.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show progress (e.g., "[3/11]").
    fn show_progress(&mut self, current: usize, total: usize);

    /// Show the end-of-run summary.
    fn show_summary(&mut self, summary: &RunSummary);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the step as completed.
    fn finish_success(&mut self, msg: &str);

    /// Mark the step as failed.
    fn finish_error(&mut self, msg: &str);

    /// Mark the step as waiting for review.
    fn finish_review(&mut self, msg: &str);
}

/// What the end-of-run summary shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub workflow: String,
    pub outcome: RunOutcome,
    pub steps_completed: usize,
    pub total_steps: usize,
    pub elapsed_ms: u64,
    /// Steps that never ran because of a failure.
    pub blocked: Vec<String>,
}
