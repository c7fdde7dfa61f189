//! List command implementation.
//!
//! The `baton list` command lists the workflow's steps in run order.

use std::path::{Path, PathBuf};

use crate::cli::args::ListArgs;
use crate::error::Result;
use crate::runner::Scheduling;
use crate::ui::theme::BatonTheme;
use crate::ui::{format_duration, UserInterface};

use super::dispatcher::{load_command_config, Command, CommandResult, EXIT_PRECONDITION};

/// The list command implementation.
pub struct ListCommand {
    project_root: PathBuf,
    config_override: Option<PathBuf>,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(project_root: &Path, args: ListArgs) -> Self {
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
    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some(config) =
            load_command_config(&self.project_root, self.config_override.as_deref(), ui)?
        else {
            return Ok(CommandResult::failure(EXIT_PRECONDITION));
        };
        let catalog = config.catalog()?;

        if self.args.json {
            let json = serde_json::to_string_pretty(catalog.list()).map_err(anyhow::Error::from)?;
            println!("{}", json);
            return Ok(CommandResult::success());
        }

        let theme = BatonTheme::new();

        ui.message(&format!(
            "  {} {}",
            theme.key.apply_to(config.workflow_name()),
            theme.dim.apply_to(format!("({} steps)", catalog.len()))
        ));
        for step in catalog.list() {
            ui.message(&format!(
                "    {} {} {} {}",
                theme.info.apply_to(step.kind.display_char()),
                theme.highlight.apply_to(&step.name),
                theme.dim.apply_to(&step.id),
                theme
                    .duration
                    .apply_to(format_duration(step.simulated_duration()))
            ));

            if !step.subtitle.is_empty() {
                ui.message(&format!("      {}", theme.dim.apply_to(&step.subtitle)));
            }
            if let Some(input) = &step.input {
                ui.message(&format!(
                    "      {} {}",
                    theme.dim.apply_to("expects:"),
                    input.file_name
                ));
            }
            if step.requires_review {
                ui.message(&format!("      {}", theme.review.apply_to("needs sign-off")));
            }
            if !step.depends_on.is_empty() {
                ui.message(&format!(
                    "      {} {}",
                    theme.dim.apply_to("└── depends on:"),
                    theme.dim.apply_to(step.depends_on.join(", "))
                ));
            }
        }

        if config.settings.scheduling == Scheduling::Graph {
            ui.message("");
            ui.message(&format!("  {}", theme.key.apply_to("Waves:")));
            for (n, wave) in catalog.dependency_graph()?.waves()?.iter().enumerate() {
                ui.message(&format!(
                    "    {} {}",
                    theme.dim.apply_to(format!("{}.", n + 1)),
                    wave.join(", ")
                ));
            }
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{MockUI, OutputMode};
    use std::fs;
    use tempfile::TempDir;

    fn setup_project(config: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".baton");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), config).unwrap();
        temp
    }

    #[test]
    fn list_command_creation() {
        let temp = TempDir::new().unwrap();
        let cmd = ListCommand::new(temp.path(), ListArgs::default());

        assert_eq!(cmd.project_root(), temp.path());
        assert!(!cmd.args().json);
    }

    #[test]
    fn list_without_config_shows_builtin_catalog() {
        let temp = TempDir::new().unwrap();
        let cmd = ListCommand::new(temp.path(), ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.messages()[0].contains("Monthly FP&A Report"));
        assert!(ui.messages().iter().any(|m| m.contains("Cashflow Excel")));
        assert!(ui
            .messages()
            .iter()
            .any(|m| m.contains("depends on:") && m.contains("step-4, step-5, step-6b")));
    }

    #[test]
    fn list_with_config() {
        let config = r#"
steps:
  - id: hello
    kind: coherence_check
    name: Hello
    duration_ms: 1500
  - id: world
    kind: output
    depends_on: [hello]
    requires_review: true
"#;
        let temp = setup_project(config);
        let cmd = ListCommand::new(temp.path(), ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.messages()[0].contains("(2 steps)"));
        assert!(ui.messages().iter().any(|m| m.contains("Hello") && m.contains("1.5s")));
        assert!(ui.messages().iter().any(|m| m.contains("needs sign-off")));
        assert!(ui
            .messages()
            .iter()
            .any(|m| m.contains("depends on:") && m.contains("hello")));
    }

    #[test]
    fn list_applies_config_default_output() {
        let temp = setup_project("settings:\n  default_output: quiet\n");
        let cmd = ListCommand::new(temp.path(), ListArgs::default());
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert_eq!(ui.output_mode(), OutputMode::Quiet);
    }

    #[test]
    fn list_rejects_unknown_dependency() {
        let config = r#"
steps:
  - id: a
    kind: output
    depends_on: [ghost]
"#;
        let temp = setup_project(config);
        let cmd = ListCommand::new(temp.path(), ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, EXIT_PRECONDITION);
        assert!(ui.errors()[0].contains("ghost"));
    }

    #[test]
    fn list_shows_waves_for_graph_scheduling() {
        let temp = setup_project("settings:\n  scheduling: graph\n");
        let cmd = ListCommand::new(temp.path(), ListArgs::default());
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert!(ui
            .messages()
            .iter()
            .any(|m| m.ends_with("step-1, step-2, step-3, step-6")));
        assert!(ui.messages().iter().any(|m| m.ends_with("step-4, step-5, step-6b")));
        assert!(ui.messages().last().unwrap().ends_with("step-10"));
    }

    #[test]
    fn list_json_prints_nothing_through_ui() {
        let temp = TempDir::new().unwrap();
        let args = ListArgs { json: true };
        let cmd = ListCommand::new(temp.path(), args);
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.messages().is_empty());
    }
}
