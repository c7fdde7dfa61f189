//! Step definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::config::schema::StepConfig;

/// The declared type of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Loads an uploaded document.
    Input,
    /// Validates the data of an upstream step.
    CoherenceCheck,
    /// Generates or fills a document.
    AiProcessing,
    /// Exports the final artifact.
    Output,
}

impl StepKind {
    /// Get a display character for this kind.
    pub fn display_char(&self) -> char {
        match self {
            StepKind::Input => '▤',
            StepKind::CoherenceCheck => '✓',
            StepKind::AiProcessing => '⚡',
            StepKind::Output => '⇪',
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::Input => "input",
            StepKind::CoherenceCheck => "coherence_check",
            StepKind::AiProcessing => "ai_processing",
            StepKind::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// Document format accepted by an Input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Excel,
    #[serde(rename = "powerpoint")]
    PowerPoint,
}

impl FileFormat {
    /// Detect the format from a file name's extension.
    ///
    /// Returns `None` for anything that is not a spreadsheet or a deck.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xls" => Some(FileFormat::Excel),
            "pptx" | "ppt" => Some(FileFormat::PowerPoint),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Excel => write!(f, "Excel"),
            FileFormat::PowerPoint => write!(f, "PowerPoint"),
        }
    }
}

/// The upload an Input step expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedInput {
    /// Preferred file name; an upload with this exact name always matches.
    pub file_name: String,
    /// Format that an upload with a different name must have to match.
    pub format: FileFormat,
    /// Whether strict gating refuses to start without this input.
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ExpectedInput {
    /// Create a required input.
    pub fn new(file_name: impl Into<String>, format: FileFormat) -> Self {
        Self {
            file_name: file_name.into(),
            format,
            required: true,
        }
    }
}

/// One catalog entry.
///
/// Definitions are created once when the catalog is loaded and shared
/// read-only by every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique step id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short secondary label (e.g. "Input • Excel").
    pub subtitle: String,
    /// What the step does.
    pub description: String,
    /// Declared step type.
    pub kind: StepKind,
    /// How long the simulated executor spends on this step.
    pub simulated_duration_ms: u64,
    /// Short description of the AI prompt behind the step.
    pub prompt: Option<String>,
    /// Steps whose output this step consumes.
    pub depends_on: Vec<String>,
    /// Whether the step stops in `NeedsReview` for human sign-off.
    pub requires_review: bool,
    /// Expected upload, for Input steps.
    pub input: Option<ExpectedInput>,
    /// Log lines the simulated executor replays.
    pub logs: Vec<String>,
}

impl StepDefinition {
    /// Create a minimal definition; the id doubles as the display name.
    pub fn new(id: impl Into<String>, kind: StepKind, simulated_duration_ms: u64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            subtitle: String::new(),
            description: String::new(),
            kind,
            simulated_duration_ms,
            prompt: None,
            depends_on: Vec::new(),
            requires_review: false,
            input: None,
            logs: Vec::new(),
        }
    }

    /// Build a definition from its YAML configuration.
    pub fn from_config(config: &StepConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            subtitle: config.subtitle.clone().unwrap_or_default(),
            description: config.description.clone().unwrap_or_default(),
            kind: config.kind,
            simulated_duration_ms: config.duration_ms,
            prompt: config.prompt.clone(),
            depends_on: config.depends_on.clone(),
            requires_review: config.requires_review,
            input: config.input.clone(),
            logs: config.logs.clone(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_depends_on(mut self, depends_on: &[&str]) -> Self {
        self.depends_on = depends_on.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_review(mut self) -> Self {
        self.requires_review = true;
        self
    }

    pub fn with_input(mut self, input: ExpectedInput) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_logs(mut self, logs: &[&str]) -> Self {
        self.logs = logs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Simulated duration as a [`Duration`].
    pub fn simulated_duration(&self) -> Duration {
        Duration::from_millis(self.simulated_duration_ms)
    }
}
