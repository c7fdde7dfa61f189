//! Configuration schema definitions for Baton.
//!
//! This module contains the struct definitions that map to the YAML
//! configuration file format.

use serde::{Deserialize, Serialize};

use crate::catalog::{ExpectedInput, StepCatalog, StepDefinition, StepKind};
use crate::error::Result;
use crate::gating::GatingPolicy;
use crate::runner::{RunOptions, Scheduling};
use crate::ui::OutputMode;

/// Root configuration structure for `.baton/config.yml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatonConfig {
    /// Global settings
    pub settings: Settings,

    /// Step definitions, in run order. Replaces the built-in catalog
    /// when non-empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepConfig>,
}

impl BatonConfig {
    /// The catalog this configuration describes.
    pub fn catalog(&self) -> Result<StepCatalog> {
        if self.steps.is_empty() {
            return Ok(StepCatalog::builtin());
        }
        StepCatalog::new(self.steps.iter().map(StepDefinition::from_config).collect())
    }

    /// Runner options from the settings.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            scheduling: self.settings.scheduling,
            gating: self.settings.gating,
        }
    }

    /// Display name of the workflow.
    pub fn workflow_name(&self) -> &str {
        self.settings
            .workflow_name
            .as_deref()
            .unwrap_or(DEFAULT_WORKFLOW_NAME)
    }
}

/// Workflow name used when none is configured.
pub const DEFAULT_WORKFLOW_NAME: &str = "Monthly FP&A Report";

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Workflow display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,

    /// Step ordering: sequential or graph
    pub scheduling: Scheduling,

    /// Upload check before a run: permissive or strict
    pub gating: GatingPolicy,

    /// Multiplier applied to every simulated duration
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Default output mode: verbose, normal, quiet, silent
    pub default_output: OutputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workflow_name: None,
            scheduling: Scheduling::default(),
            gating: GatingPolicy::default(),
            time_scale: default_time_scale(),
            default_output: OutputMode::default(),
        }
    }
}

fn default_time_scale() -> f64 {
    1.0
}

fn is_false(v: &bool) -> bool {
    !v
}

/// Configuration for a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique step id
    pub id: String,

    /// Step type
    pub kind: StepKind,

    /// Display name (defaults to the id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Simulated duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,

    /// Short description of the AI prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Steps this step consumes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Stop for human sign-off after the step's work
    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_review: bool,

    /// Expected upload (Input steps)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<ExpectedInput>,

    /// Log lines replayed by the simulated executor
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FileFormat;

    #[test]
    fn empty_config_uses_defaults() {
        let config: BatonConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.settings.scheduling, Scheduling::Sequential);
        assert_eq!(config.settings.gating, GatingPolicy::Permissive);
        assert_eq!(config.settings.time_scale, 1.0);
        assert_eq!(config.settings.default_output, OutputMode::Normal);
        assert_eq!(config.workflow_name(), DEFAULT_WORKFLOW_NAME);
        assert!(config.steps.is_empty());
    }

    #[test]
    fn empty_steps_fall_back_to_builtin_catalog() {
        let config = BatonConfig::default();
        assert_eq!(config.catalog().unwrap().len(), 11);
    }

    #[test]
    fn parses_settings() {
        let yaml = r#"
settings:
  workflow_name: Quarterly close
  scheduling: graph
  gating: strict
  time_scale: 0.1
  default_output: quiet
"#;
        let config: BatonConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.workflow_name(), "Quarterly close");
        assert_eq!(config.settings.time_scale, 0.1);
        assert_eq!(config.settings.default_output, OutputMode::Quiet);

        let options = config.run_options();
        assert_eq!(options.scheduling, Scheduling::Graph);
        assert_eq!(options.gating, GatingPolicy::Strict);
    }

    #[test]
    fn parses_steps_in_order() {
        let yaml = r#"
steps:
  - id: ledger
    kind: input
    name: Ledger export
    duration_ms: 500
    input:
      file_name: Ledger.xlsx
      format: excel
  - id: check
    kind: coherence_check
    duration_ms: 200
    depends_on: [ledger]
    requires_review: true
"#;
        let config: BatonConfig = serde_yaml::from_str(yaml).unwrap();
        let catalog = config.catalog().unwrap();

        let ids: Vec<_> = catalog.list().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ledger", "check"]);
        let ledger = catalog.get("ledger").unwrap();
        assert_eq!(ledger.name, "Ledger export");
        assert_eq!(ledger.input.as_ref().unwrap().format, FileFormat::Excel);
        assert!(catalog.get("check").unwrap().requires_review);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let yaml = "steps:\n  - id: a\n    kind: teleport\n";
        assert!(serde_yaml::from_str::<BatonConfig>(yaml).is_err());
    }

    #[test]
    fn serialization_skips_defaults() {
        let config: BatonConfig =
            serde_yaml::from_str("steps:\n  - id: a\n    kind: output\n").unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("requires_review"));
        assert!(!yaml.contains("depends_on"));
    }
}
