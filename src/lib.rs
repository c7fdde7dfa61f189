//! Baton - Step-by-step execution of reporting workflows.
//!
//! Baton runs an ordered catalog of steps (load inputs, check them,
//! generate and export a report), tracking each step's status, timing and
//! logs, and notifying subscribers after every change.
//!
//! # Modules
//!
//! - [`catalog`] - Step definitions and the built-in reporting workflow
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`gating`] - Uploaded files and the input check before a run
//! - [`history`] - Records of finished runs
//! - [`runner`] - Run state machine, step executors and change events
//! - [`ui`] - Spinners, prompts, and terminal output
//!
//! # Example
//!
//! ```
//! use baton::catalog::StepCatalog;
//! use baton::runner::{RunOptions, RunOutcome, SimulatedExecutor, WorkflowRunner};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> baton::Result<()> {
//! let executor = SimulatedExecutor::new().with_time_scale(0.0);
//! let runner = WorkflowRunner::new(StepCatalog::builtin(), executor, RunOptions::default())?;
//!
//! assert_eq!(runner.run().await?, RunOutcome::Completed);
//! assert_eq!(runner.progress(), (11, 11));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gating;
pub mod history;
pub mod runner;
pub mod ui;

pub use error::{BatonError, Result};
