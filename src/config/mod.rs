//! Configuration loading, parsing, and validation for Baton.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use baton::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".baton");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "settings:\n  workflow_name: Close").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.workflow_name(), "Close");
//! ```
//!
//! # Configuration File Locations
//!
//! 1. Project config (`.baton/config.yml`)
//! 2. Local overrides (`.baton/config.local.yml`)
//!
//! Without a project config the built-in catalog and default settings
//! apply.

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use schema::{BatonConfig, Settings, StepConfig, DEFAULT_WORKFLOW_NAME};

pub use loader::{
    find_project_root, load_config, load_config_file, load_config_or_default, load_config_value,
    load_merged_config, parse_config, ConfigPaths, CONFIG_DIR,
};

pub use merger::{deep_merge, merge_configs};

pub use validator::{validate, validate_config, ValidationError};
