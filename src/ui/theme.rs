//! Colors and icons for run output.

use console::Style;

use crate::runner::StepStatus;

const ICON_DONE: &str = "✓";
const ICON_FAILED: &str = "✗";
const ICON_WARN: &str = "⚠";
const ICON_REVIEW: &str = "?";
const ICON_HEADER: &str = "▶";

/// Styles used across the run display.
///
/// `plain()` keeps the same layout with every style a no-op, for piped
/// output and `--no-color`.
#[derive(Debug, Clone)]
pub struct BatonTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Running steps and step kinds.
    pub info: Style,
    pub dim: Style,
    pub highlight: Style,
    /// Labels such as the workflow name in `list`.
    pub key: Style,
    pub duration: Style,
    /// Steps paused for sign-off.
    pub review: Style,
}

impl Default for BatonTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl BatonTheme {
    pub fn new() -> Self {
        Self::build(true)
    }

    pub fn plain() -> Self {
        Self::build(false)
    }

    fn build(colored: bool) -> Self {
        let style = |f: fn(Style) -> Style| if colored { f(Style::new()) } else { Style::new() };
        Self {
            success: style(|s| s.green()),
            warning: style(|s| s.color256(208)),
            error: style(|s| s.red().bold()),
            info: style(|s| s.cyan()),
            dim: style(|s| s.dim()),
            highlight: style(|s| s.bold()),
            key: style(|s| s.bold()),
            duration: style(|s| s.dim()),
            review: style(|s| s.yellow()),
        }
    }

    fn iconed(style: &Style, icon: &str, msg: &str) -> String {
        style.apply_to(format!("{} {}", icon, msg)).to_string()
    }

    pub fn format_success(&self, msg: &str) -> String {
        Self::iconed(&self.success, ICON_DONE, msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        Self::iconed(&self.warning, ICON_WARN, msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        Self::iconed(&self.error, ICON_FAILED, msg)
    }

    pub fn format_review(&self, msg: &str) -> String {
        Self::iconed(&self.review, ICON_REVIEW, msg)
    }

    /// The banner printed before a run or listing.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.info.apply_to(ICON_HEADER),
            self.highlight.apply_to(title)
        )
    }

    /// The status character in the color of its status.
    pub fn status_icon(&self, status: StepStatus) -> String {
        let style = match status {
            StepStatus::Pending => &self.dim,
            StepStatus::Running => &self.info,
            StepStatus::Completed => &self.success,
            StepStatus::Failed => &self.error,
            StepStatus::NeedsReview => &self.review,
        };
        style.apply_to(status.display_char()).to_string()
    }
}

/// Whether stdout gets colored output. Honors `NO_COLOR`.
pub fn should_use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term()
}
