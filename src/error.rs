//! Error types for Baton operations.
//!
//! This module defines [`BatonError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `BatonError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `BatonError::Other`) for unexpected errors
//! - Step executors report failures with [`StepExecutionError`], which the
//!   runner records on the step before surfacing it as
//!   [`BatonError::StepExecution`]

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Baton operations.
#[derive(Debug, Error)]
pub enum BatonError {
    /// A command was issued while the run was in a state that forbids it.
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Strict gating found Input steps with no matching upload.
    #[error("Missing required inputs: {}", missing.join(", "))]
    MissingInput { missing: Vec<String> },

    /// A step's unit of work failed and halted the run.
    #[error("Step '{step}' failed: {message}")]
    StepExecution { step: String, message: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Step dependency cycle detected.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BatonError {
    /// Shorthand for an [`BatonError::InvalidState`] error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

/// Error returned by a step executor when a step's work fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StepExecutionError {
    /// Id of the step that failed.
    pub step: String,
    /// Human-readable failure reason.
    pub message: String,
}

impl StepExecutionError {
    /// Create a new step failure.
    pub fn new(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
        }
    }
}

impl From<StepExecutionError> for BatonError {
    fn from(err: StepExecutionError) -> Self {
        BatonError::StepExecution {
            step: err.step,
            message: err.message,
        }
    }
}

/// Result type alias for Baton operations.
pub type Result<T> = std::result::Result<T, BatonError>;
