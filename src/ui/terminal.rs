//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;
use crate::runner::RunOutcome;

use super::progress::format_timer;
use super::{
    confirm, should_use_colors, BatonTheme, NonInteractiveUI, OutputMode, ProgressSpinner,
    RunSummary, SpinnerHandle, UserInterface,
};

const BAR_WIDTH: usize = 16;

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: BatonTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        let theme = if should_use_colors() {
            BatonTheme::new()
        } else {
            BatonTheme::plain()
        };

        Self {
            term: Term::stdout(),
            theme,
            mode,
        }
    }

    /// Write a line unless the mode hides status output.
    fn status_line(&mut self, line: impl std::fmt::Display) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", line).ok();
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn set_output_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    fn message(&mut self, msg: &str) {
        self.status_line(msg);
    }

    fn success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.status_line(line);
    }

    fn warning(&mut self, msg: &str) {
        let line = self.theme.format_warning(msg);
        self.status_line(line);
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        confirm(question, default, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        let line = format!("\n{}\n", self.theme.format_header(title));
        self.status_line(line);
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        let line = self
            .theme
            .dim
            .apply_to(format!("[{}/{}]", current, total))
            .to_string();
        self.status_line(line);
    }

    fn show_summary(&mut self, summary: &RunSummary) {
        if !self.mode.shows_status() {
            return;
        }

        let filled = (summary.steps_completed * BAR_WIDTH)
            .checked_div(summary.total_steps)
            .unwrap_or(BAR_WIDTH)
            .min(BAR_WIDTH);
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));
        let style = match summary.outcome {
            RunOutcome::Completed => &self.theme.success,
            RunOutcome::Failed => &self.theme.error,
            RunOutcome::AwaitingReview => &self.theme.review,
            _ => &self.theme.info,
        };

        writeln!(
            self.term,
            "\n  {} {}/{} steps {} {}",
            style.apply_to(format!("[{}]", bar)),
            summary.steps_completed,
            summary.total_steps,
            self.theme.dim.apply_to("·"),
            self.theme.duration.apply_to(format_timer(summary.elapsed_ms)),
        )
        .ok();

        if !summary.blocked.is_empty() {
            writeln!(
                self.term,
                "  {} {}",
                self.theme.key.apply_to("Not run:"),
                self.theme.dim.apply_to(summary.blocked.join(", "))
            )
            .ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the UI for the current terminal.
///
/// Falls back to [`NonInteractiveUI`] when stdout is not a terminal.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_output_mode_switches_mode() {
        let mut ui = TerminalUI::new(OutputMode::Normal);
        ui.set_output_mode(OutputMode::Silent);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }

    #[test]
    fn terminal_ui_output_mode() {
        let ui = TerminalUI::new(OutputMode::Quiet);
        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn create_ui_non_interactive() {
        let ui = create_ui(false, OutputMode::Normal);
        assert!(!ui.is_interactive());
    }

    #[test]
    fn create_ui_respects_mode() {
        let ui = create_ui(false, OutputMode::Silent);
        assert_eq!(ui.output_mode(), OutputMode::Silent);
    }
}
