//! Non-interactive UI for CI/headless environments.

use crate::error::Result;

use super::progress::format_timer;
use super::theme::BatonTheme;
use super::{OutputMode, RunSummary, SpinnerHandle, UserInterface};

/// UI implementation for non-interactive mode.
///
/// Writes plain lines to stdout, never animates and never blocks on
/// input: confirmation prompts take their default answer.
pub struct NonInteractiveUI {
    mode: OutputMode,
    theme: BatonTheme,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            theme: BatonTheme::plain(),
        }
    }

    fn print(&self, line: impl std::fmt::Display) {
        if self.mode.shows_status() {
            println!("{}", line);
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn message(&mut self, msg: &str) {
        self.print(msg);
    }

    fn success(&mut self, msg: &str) {
        self.print(self.theme.format_success(msg));
    }

    fn warning(&mut self, msg: &str) {
        self.print(self.theme.format_warning(msg));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        self.print(format_args!(
            "{} [{}]",
            question,
            if default { "yes" } else { "no" }
        ));
        Ok(default)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.print(format_args!("◉ {}", message));
        Box::new(LineSpinner {
            show: self.mode.shows_status(),
            theme: self.theme.clone(),
        })
    }

    fn show_header(&mut self, title: &str) {
        self.print(self.theme.format_header(title));
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        self.print(format_args!("[{}/{}]", current, total));
    }

    fn show_summary(&mut self, summary: &RunSummary) {
        if !self.mode.shows_status() {
            return;
        }
        println!(
            "{}: {} ({}/{} steps, {})",
            summary.workflow,
            summary.outcome,
            summary.steps_completed,
            summary.total_steps,
            format_timer(summary.elapsed_ms)
        );
        if !summary.blocked.is_empty() {
            println!("Not run: {}", summary.blocked.join(", "));
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner stand-in that prints one line when the step finishes.
struct LineSpinner {
    show: bool,
    theme: BatonTheme,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        if self.show {
            println!("{}", self.theme.format_error(msg));
        }
    }

    fn finish_review(&mut self, msg: &str) {
        if self.show {
            println!("{}", self.theme.format_review(msg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_takes_default() {
        let mut ui = NonInteractiveUI::new(OutputMode::Silent);
        assert!(ui.confirm("Approve?", true).unwrap());
        assert!(!ui.confirm("Approve?", false).unwrap());
    }

    #[test]
    fn is_never_interactive() {
        let ui = NonInteractiveUI::new(OutputMode::Normal);
        assert!(!ui.is_interactive());
        assert_eq!(ui.output_mode(), OutputMode::Normal);
    }
}
