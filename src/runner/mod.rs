//! Step execution orchestration.

pub mod dependency;
pub mod events;
pub mod executor;
pub mod state;
pub mod workflow;

pub use dependency::{DependencyGraph, DependencyGraphBuilder};
pub use events::{EventBus, RunEvent};
pub use executor::{SimulatedExecutor, StepExecutor, StepOutput};
pub use state::{RunOutcome, RunState, StepExecutionRecord, StepStatus};
pub use workflow::{RunOptions, Scheduling, WorkflowRunner};
