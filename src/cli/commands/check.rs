//! Check command implementation.
//!
//! The `baton check` command matches files against the workflow's Input
//! steps without running anything.

use std::path::{Path, PathBuf};

use crate::cli::args::CheckArgs;
use crate::error::Result;
use crate::gating::{check_inputs, UploadSet};
use crate::ui::theme::BatonTheme;
use crate::ui::{format_file_size, UserInterface};

use super::dispatcher::{load_command_config, Command, CommandResult, EXIT_PRECONDITION};
use super::run::read_uploads;

/// The check command implementation.
pub struct CheckCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: CheckArgs,
}

impl CheckCommand {
    /// Create a new check command.
    pub fn new(project_root: &Path, args: CheckArgs) -> Self {
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
    pub fn args(&self) -> &CheckArgs {
        &self.args
    }
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) =
            load_command_config(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(EXIT_PRECONDITION));
        };
        let Some(files) = read_uploads(&self.args.files, ui) else {
            return Ok(CommandResult::failure(EXIT_PRECONDITION));
        };

        let mut uploads = UploadSet::new();
        for file in files {
            uploads.add(file);
        }

        let catalog = config.catalog()?;
        let check = check_inputs(&catalog, &uploads);
        let theme = BatonTheme::new();

        for matched in &check.matched {
            let size = uploads
                .get(&matched.file_name)
                .map(|f| format_file_size(f.size_bytes))
                .unwrap_or_default();
            ui.success(&format!(
                "{} ← {} {}",
                matched.step_id,
                matched.file_name,
                theme.dim.apply_to(format!("({})", size))
            ));
        }
        for missing in &check.missing {
            let line = format!(
                "{} needs {} ({})",
                missing.step_id, missing.expected_file, missing.format
            );
            if missing.required {
                ui.warning(&line);
            } else {
                ui.message(&format!("  {} {}", line, theme.dim.apply_to("(optional)")));
            }
        }

        let unused: Vec<&str> = uploads
            .iter()
            .filter(|f| !check.matched.iter().any(|m| m.file_name == f.name))
            .map(|f| f.name.as_str())
            .collect();
        if !unused.is_empty() {
            ui.message(&format!("Unused: {}", unused.join(", ")));
        }

        if check.is_satisfied() {
            ui.success("All required inputs are covered");
            Ok(CommandResult::success())
        } else {
            ui.error(&format!(
                "{} required input(s) missing",
                check.missing_required().len()
            ));
            Ok(CommandResult::failure(EXIT_PRECONDITION))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: usize) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, vec![0u8; bytes]).unwrap();
        path
    }

    #[test]
    fn check_without_files_reports_every_input() {
        let temp = TempDir::new().unwrap();
        let cmd = CheckCommand::new(temp.path(), CheckArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, EXIT_PRECONDITION);
        assert_eq!(ui.warnings().len(), 4);
        assert!(ui.errors()[0].starts_with("4 required"));
    }

    #[test]
    fn check_matches_exact_names_and_formats() {
        let temp = TempDir::new().unwrap();
        let args = CheckArgs {
            files: vec![
                write_file(&temp, "Marketing_Slides.pptx", 2048),
                write_file(&temp, "cashflow-nov.xlsx", 10),
                write_file(&temp, "Reporting_Template.pptx", 10),
                write_file(&temp, "Reporting_Template.xlsx", 10),
                write_file(&temp, "notes.txt", 10),
            ],
        };
        let cmd = CheckCommand::new(temp.path(), args);
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui
            .successes()
            .iter()
            .any(|m| m.contains("step-1 ← Marketing_Slides.pptx") && m.contains("2.0 KB")));
        assert!(ui
            .successes()
            .iter()
            .any(|m| m.contains("step-2 ← cashflow-nov.xlsx")));
        assert_eq!(ui.messages(), ["Unused: notes.txt"]);
    }

    #[test]
    fn check_missing_file_exits_two() {
        let temp = TempDir::new().unwrap();
        let args = CheckArgs {
            files: vec![temp.path().join("gone.pptx")],
        };
        let cmd = CheckCommand::new(temp.path(), args);
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, EXIT_PRECONDITION);
        assert!(ui.errors()[0].contains("gone.pptx"));
    }
}
