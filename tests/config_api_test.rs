//! Integration tests for config module public API.

use baton::catalog::StepKind;
use baton::config::{
    load_config_or_default, load_merged_config, validate, BatonConfig, DEFAULT_WORKFLOW_NAME,
};
use baton::gating::GatingPolicy;
use baton::runner::Scheduling;
use baton::ui::OutputMode;
use baton::BatonError;
use std::fs;
use tempfile::TempDir;

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join(".baton")).unwrap();
    temp
}

#[test]
fn public_api_is_accessible() {
    let config = BatonConfig::default();
    assert_eq!(config.workflow_name(), DEFAULT_WORKFLOW_NAME);
    assert_eq!(config.settings.default_output, OutputMode::Normal);
}

#[test]
fn full_config_workflow() {
    let temp = project();
    fs::write(
        temp.path().join(".baton/config.yml"),
        r#"
settings:
  workflow_name: Board pack
  scheduling: graph
steps:
  - id: deck
    kind: input
    name: Board deck
    duration_ms: 500
    input:
      file_name: Board.pptx
      format: powerpoint
  - id: summary
    kind: ai_processing
    duration_ms: 2000
    depends_on: [deck]
"#,
    )
    .unwrap();

    let config = load_merged_config(temp.path()).unwrap();
    validate(&config).unwrap();

    let catalog = config.catalog().unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get("deck").unwrap().kind, StepKind::Input);
    assert_eq!(catalog.get("summary").unwrap().name, "summary");
    assert_eq!(config.run_options().scheduling, Scheduling::Graph);
}

#[test]
fn config_merge_workflow() {
    let temp = project();
    fs::write(
        temp.path().join(".baton/config.yml"),
        r#"
settings:
  workflow_name: Base
  gating: permissive
  time_scale: 0.5
"#,
    )
    .unwrap();
    fs::write(
        temp.path().join(".baton/config.local.yml"),
        "settings:\n  gating: strict\n",
    )
    .unwrap();

    let config = load_merged_config(temp.path()).unwrap();

    assert_eq!(config.workflow_name(), "Base");
    assert_eq!(config.settings.gating, GatingPolicy::Strict);
    assert_eq!(config.settings.time_scale, 0.5);
}

#[test]
fn missing_config_falls_back_to_builtin() {
    let temp = TempDir::new().unwrap();

    assert!(matches!(
        load_merged_config(temp.path()),
        Err(BatonError::ConfigNotFound { .. })
    ));

    let config = load_config_or_default(temp.path(), None).unwrap();
    assert_eq!(config.catalog().unwrap().len(), 11);
}

#[test]
fn validation_rejects_cycles() {
    let temp = project();
    fs::write(
        temp.path().join(".baton/config.yml"),
        r#"
steps:
  - id: a
    kind: coherence_check
    depends_on: [b]
  - id: b
    kind: coherence_check
    depends_on: [a]
"#,
    )
    .unwrap();

    let err = load_config_or_default(temp.path(), None).unwrap_err();
    assert!(matches!(err, BatonError::ConfigValidationError { .. }));
    assert!(err.to_string().contains("a"));
}
