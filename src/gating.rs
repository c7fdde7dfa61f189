//! Input file gating.
//!
//! Tracks the files uploaded for the next run and decides whether the
//! catalog's Input steps are covered before a run may start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{FileFormat, StepCatalog};

/// A file handed to the workflow before a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFileRef {
    /// File name; unique within an upload set.
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFileRef {
    /// Create a reference stamped with the current time.
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            uploaded_at: Utc::now(),
        }
    }

    /// Format derived from the file extension.
    pub fn format(&self) -> Option<FileFormat> {
        FileFormat::from_file_name(&self.name)
    }
}

/// Uploaded files keyed by name, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UploadSet {
    files: Vec<UploadedFileRef>,
}

impl UploadSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. A file with the same name is replaced and the new
    /// entry moves to the end.
    pub fn add(&mut self, file: UploadedFileRef) {
        self.files.retain(|f| f.name != file.name);
        self.files.push(file);
    }

    /// Remove a file by name. Returns the removed entry, if any.
    pub fn remove(&mut self, name: &str) -> Option<UploadedFileRef> {
        let index = self.files.iter().position(|f| f.name == name)?;
        Some(self.files.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&UploadedFileRef> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFileRef> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

/// How strictly uploads are checked before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingPolicy {
    /// Inputs are assumed pre-supplied; runs always start.
    #[default]
    Permissive,
    /// Every required Input step needs a matching upload.
    Strict,
}

/// An Input step paired with the upload that satisfies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMatch {
    pub step_id: String,
    pub file_name: String,
}

/// An Input step with no matching upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    pub step_id: String,
    pub expected_file: String,
    pub format: FileFormat,
    pub required: bool,
}

impl MissingInput {
    /// Label used in error messages, e.g. `step-2 (Cashflow_Data.xlsx)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.step_id, self.expected_file)
    }
}

/// Result of matching uploads against the catalog's Input steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputCheck {
    pub matched: Vec<InputMatch>,
    pub missing: Vec<MissingInput>,
}

impl InputCheck {
    /// True when no required input is missing.
    pub fn is_satisfied(&self) -> bool {
        self.missing.iter().all(|m| !m.required)
    }

    /// Labels of the required inputs that are missing.
    pub fn missing_required(&self) -> Vec<String> {
        self.missing
            .iter()
            .filter(|m| m.required)
            .map(MissingInput::label)
            .collect()
    }
}

/// Match uploads to Input steps.
///
/// Each upload satisfies at most one step. A step first claims an upload
/// with its exact expected name; steps without one then claim, in catalog
/// order, the earliest unclaimed upload of their format. Input steps with
/// no declared expectation are ignored.
pub fn check_inputs(catalog: &StepCatalog, uploads: &UploadSet) -> InputCheck {
    let expected: Vec<_> = catalog
        .input_steps()
        .filter_map(|step| step.input.as_ref().map(|input| (step.id.as_str(), input)))
        .collect();

    let mut claimed: HashSet<&str> = HashSet::new();
    let mut by_step: Vec<Option<&str>> = vec![None; expected.len()];

    for (slot, (_, input)) in expected.iter().enumerate() {
        if let Some(file) = uploads.get(&input.file_name) {
            claimed.insert(file.name.as_str());
            by_step[slot] = Some(file.name.as_str());
        }
    }

    for (slot, (_, input)) in expected.iter().enumerate() {
        if by_step[slot].is_some() {
            continue;
        }
        let candidate = uploads
            .iter()
            .find(|f| !claimed.contains(f.name.as_str()) && f.format() == Some(input.format));
        if let Some(file) = candidate {
            claimed.insert(file.name.as_str());
            by_step[slot] = Some(file.name.as_str());
        }
    }

    let mut check = InputCheck::default();
    for ((step_id, input), file) in expected.iter().zip(by_step) {
        match file {
            Some(file_name) => check.matched.push(InputMatch {
                step_id: step_id.to_string(),
                file_name: file_name.to_string(),
            }),
            None => check.missing.push(MissingInput {
                step_id: step_id.to_string(),
                expected_file: input.file_name.clone(),
                format: input.format,
                required: input.required,
            }),
        }
    }
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ExpectedInput, StepDefinition, StepKind};

    fn two_input_catalog() -> StepCatalog {
        StepCatalog::new(vec![
            StepDefinition::new("deck", StepKind::Input, 10)
                .with_input(ExpectedInput::new("Slides.pptx", FileFormat::PowerPoint)),
            StepDefinition::new("sheet", StepKind::Input, 10)
                .with_input(ExpectedInput::new("Data.xlsx", FileFormat::Excel)),
            StepDefinition::new("check", StepKind::CoherenceCheck, 10),
        ])
        .unwrap()
    }

    #[test]
    fn add_replaces_by_name() {
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("a.xlsx", 10));
        set.add(UploadedFileRef::new("a.xlsx", 20));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a.xlsx").unwrap().size_bytes, 20);
    }

    #[test]
    fn replaced_file_moves_to_end() {
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("a.xlsx", 1));
        set.add(UploadedFileRef::new("b.pptx", 1));
        set.add(UploadedFileRef::new("a.xlsx", 2));

        let names: Vec<_> = set.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b.pptx", "a.xlsx"]);
    }

    #[test]
    fn remove_by_name() {
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("a.xlsx", 1));
        assert!(set.remove("missing.xlsx").is_none());
        assert_eq!(set.remove("a.xlsx").unwrap().name, "a.xlsx");
        assert!(set.is_empty());
    }

    #[test]
    fn exact_names_satisfy_inputs() {
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("Data.xlsx", 1));
        set.add(UploadedFileRef::new("Slides.pptx", 1));

        let check = check_inputs(&two_input_catalog(), &set);
        assert!(check.is_satisfied());
        assert_eq!(check.matched.len(), 2);
        assert_eq!(check.matched[0].step_id, "deck");
        assert_eq!(check.matched[0].file_name, "Slides.pptx");
    }

    #[test]
    fn format_match_fills_unnamed_inputs() {
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("november.xlsx", 1));

        let check = check_inputs(&two_input_catalog(), &set);
        assert!(!check.is_satisfied());
        assert_eq!(check.matched[0].step_id, "sheet");
        assert_eq!(check.matched[0].file_name, "november.xlsx");
        assert_eq!(check.missing_required(), vec!["deck (Slides.pptx)"]);
    }

    #[test]
    fn one_upload_satisfies_one_input() {
        let catalog = StepCatalog::new(vec![
            StepDefinition::new("a", StepKind::Input, 10)
                .with_input(ExpectedInput::new("A.xlsx", FileFormat::Excel)),
            StepDefinition::new("b", StepKind::Input, 10)
                .with_input(ExpectedInput::new("B.xlsx", FileFormat::Excel)),
        ])
        .unwrap();
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("other.xlsx", 1));

        let check = check_inputs(&catalog, &set);
        assert_eq!(check.matched.len(), 1);
        assert_eq!(check.missing.len(), 1);
        assert_eq!(check.missing[0].step_id, "b");
    }

    #[test]
    fn exact_name_wins_over_earlier_format_claim() {
        let catalog = StepCatalog::new(vec![
            StepDefinition::new("a", StepKind::Input, 10)
                .with_input(ExpectedInput::new("A.xlsx", FileFormat::Excel)),
            StepDefinition::new("b", StepKind::Input, 10)
                .with_input(ExpectedInput::new("B.xlsx", FileFormat::Excel)),
        ])
        .unwrap();
        let mut set = UploadSet::new();
        set.add(UploadedFileRef::new("B.xlsx", 1));
        set.add(UploadedFileRef::new("misc.xlsx", 1));

        let check = check_inputs(&catalog, &set);
        assert!(check.is_satisfied());
        let b = check.matched.iter().find(|m| m.step_id == "b").unwrap();
        assert_eq!(b.file_name, "B.xlsx");
    }

    #[test]
    fn optional_inputs_do_not_block() {
        let mut input = ExpectedInput::new("Extra.xlsx", FileFormat::Excel);
        input.required = false;
        let catalog =
            StepCatalog::new(vec![StepDefinition::new("x", StepKind::Input, 1).with_input(input)])
                .unwrap();

        let check = check_inputs(&catalog, &UploadSet::new());
        assert!(check.is_satisfied());
        assert_eq!(check.missing.len(), 1);
        assert!(check.missing_required().is_empty());
    }

    #[test]
    fn builtin_catalog_is_satisfied_by_expected_files() {
        let mut set = UploadSet::new();
        for name in [
            "Marketing_Slides.pptx",
            "Cashflow_Data.xlsx",
            "Reporting_Template.pptx",
            "Reporting_Template.xlsx",
        ] {
            set.add(UploadedFileRef::new(name, 1024));
        }
        let check = check_inputs(&StepCatalog::builtin(), &set);
        assert!(check.is_satisfied());
        assert_eq!(check.matched.len(), 4);
    }
}
