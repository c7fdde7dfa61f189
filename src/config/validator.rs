//! Configuration validation rules.
//!
//! - Step ids must be non-empty and unique
//! - depends_on must reference existing steps
//! - Input steps must declare the upload they expect
//! - No circular dependencies allowed
//! - time_scale must be positive

use crate::catalog::StepKind;
use crate::config::schema::BatonConfig;
use crate::error::{BatonError, Result};
use std::collections::{HashMap, HashSet};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Step id if error is step-specific
    pub step: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, message: String, step: Option<&str>) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            step: step.map(str::to_string),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate_config(config: &BatonConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_settings(config));
    errors.extend(validate_steps(config));
    errors.extend(validate_dependencies(config));

    errors
}

fn validate_settings(config: &BatonConfig) -> Vec<ValidationError> {
    let scale = config.settings.time_scale;
    if scale.is_finite() && scale > 0.0 {
        return Vec::new();
    }
    vec![ValidationError::new(
        "invalid-time-scale",
        format!("settings.time_scale must be a positive number, got {}", scale),
        None,
    )]
}

fn validate_steps(config: &BatonConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let ids: HashSet<&str> = config.steps.iter().map(|s| s.id.as_str()).collect();
    let mut seen = HashSet::new();

    for step in &config.steps {
        let id = step.id.as_str();

        if id.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-id",
                "Step id cannot be empty".to_string(),
                None,
            ));
            continue;
        }

        if !seen.insert(id) {
            errors.push(ValidationError::new(
                "duplicate-id",
                format!("Step id '{}' is used more than once", id),
                Some(id),
            ));
        }

        for dep in &step.depends_on {
            if !ids.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    "unknown-step",
                    format!("Step '{}' depends on '{}' which does not exist", id, dep),
                    Some(id),
                ));
            }
        }

        if step.kind == StepKind::Input && step.input.is_none() {
            errors.push(ValidationError::new(
                "missing-input",
                format!("Input step '{}' must declare an expected input", id),
                Some(id),
            ));
        }
    }

    errors
}

/// Validate step dependencies for cycles.
fn validate_dependencies(config: &BatonConfig) -> Vec<ValidationError> {
    let edges: HashMap<&str, Vec<&str>> = config
        .steps
        .iter()
        .map(|s| {
            (
                s.id.as_str(),
                s.depends_on.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for step in &config.steps {
        if let Some(cycle) = detect_cycle(
            step.id.as_str(),
            &edges,
            &mut visited,
            &mut rec_stack,
            &mut path,
        ) {
            // One cycle is enough to report.
            return vec![ValidationError::new(
                "circular-dependency",
                format!("Circular dependency detected: {}", cycle),
                Some(step.id.as_str()),
            )];
        }
    }

    Vec::new()
}

fn detect_cycle<'a>(
    step: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<String> {
    if rec_stack.contains(step) {
        let cycle_start = path.iter().position(|s| *s == step)?;
        return Some(format!("{} -> {}", path[cycle_start..].join(" -> "), step));
    }

    if !visited.insert(step) {
        return None;
    }

    rec_stack.insert(step);
    path.push(step);

    if let Some(deps) = edges.get(step) {
        for dep in deps {
            if let Some(cycle) = detect_cycle(*dep, edges, visited, rec_stack, path) {
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(step);
    None
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &BatonConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(BatonError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}
