//! The step catalog.
//!
//! A [`StepCatalog`] is the ordered, immutable list of
//! [`StepDefinition`]s that every run traverses. Order is the run order
//! under sequential scheduling; `depends_on` edges are only consulted by
//! graph scheduling.

pub mod builtin;
pub mod definition;

pub use definition::{ExpectedInput, FileFormat, StepDefinition, StepKind};

use std::collections::HashSet;

use crate::error::{BatonError, Result};
use crate::runner::dependency::DependencyGraph;

/// Ordered list of step definitions.
#[derive(Debug, Clone, Default)]
pub struct StepCatalog {
    steps: Vec<StepDefinition>,
}

impl StepCatalog {
    /// Create a catalog, validating ids and dependency edges.
    ///
    /// Rejects empty or duplicate ids, dependencies on unknown steps and
    /// dependency cycles.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self> {
        let mut seen = HashSet::new();
        for step in &steps {
            if step.id.trim().is_empty() {
                return Err(BatonError::ConfigValidationError {
                    message: "Step id cannot be empty".to_string(),
                });
            }
            if !seen.insert(step.id.as_str()) {
                return Err(BatonError::ConfigValidationError {
                    message: format!("Duplicate step id '{}'", step.id),
                });
            }
        }

        let catalog = Self { steps };
        let graph = catalog.dependency_graph()?;
        if let Some(cycle) = graph.find_cycle() {
            return Err(BatonError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        Ok(catalog)
    }

    /// A catalog with no steps.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in monthly reporting workflow.
    pub fn builtin() -> Self {
        Self {
            steps: builtin::reporting_steps(),
        }
    }

    /// All steps in run order.
    pub fn list(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Look up a step by id.
    pub fn get(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Position of a step in run order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the catalog has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Input steps, in run order.
    pub fn input_steps(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter().filter(|s| s.kind == StepKind::Input)
    }

    /// Build the dependency graph declared by `depends_on`.
    pub fn dependency_graph(&self) -> Result<DependencyGraph> {
        self.steps
            .iter()
            .fold(DependencyGraph::builder(), |builder, step| {
                builder.add_step(step.id.clone(), step.depends_on.clone())
            })
            .build()
    }
}
