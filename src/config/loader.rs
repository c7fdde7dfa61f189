//! Configuration file discovery and loading.

use crate::config::merger::merge_configs;
use crate::config::schema::BatonConfig;
use crate::error::{BatonError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".baton";

/// Paths to configuration files in priority order (later overrides earlier).
///
/// Merge order:
/// 1. Project config (`.baton/config.yml`)
/// 2. Local overrides (`.baton/config.local.yml`)
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .baton/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .baton/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_config_path(project_root)),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }

    /// Check if any project config exists.
    pub fn has_project_config(&self) -> bool {
        self.project.is_some()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.yml")
}

/// Find the project root by walking up from `start`.
///
/// A directory containing `.baton` wins; a directory containing `.git` is
/// the fallback.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join(".git").exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a config file as a raw YAML value (for merging).
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BatonError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            BatonError::Io(e)
        }
    })?;

    // An empty file is an empty mapping, not a null document.
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Mapping(Default::default()));
    }

    serde_yaml::from_str(&content).map_err(|e| BatonError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse YAML content into a [`BatonConfig`].
///
/// `source_path` is only used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<BatonConfig> {
    serde_yaml::from_str(content).map_err(|e| BatonError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load a single config file.
pub fn load_config_file(path: &Path) -> Result<BatonConfig> {
    let value = load_config_value(path)?;
    from_value(value, path)
}

/// Load and merge the project config and its local overrides.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no project config exists.
/// Returns `ConfigParseError` if any config file is invalid.
pub fn load_merged_config(project_root: &Path) -> Result<BatonConfig> {
    let paths = ConfigPaths::discover(project_root);

    if !paths.has_project_config() {
        return Err(BatonError::ConfigNotFound {
            path: project_config_path(project_root),
        });
    }

    let configs = paths
        .all_existing()
        .into_iter()
        .map(|path| {
            debug!("Loading config layer {}", path.display());
            load_config_value(path)
        })
        .collect::<Result<Vec<_>>>()?;

    from_value(merge_configs(&configs), &project_config_path(project_root))
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging.
/// Otherwise, discovers and merges the project's config files.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<BatonConfig> {
    match config_override {
        Some(path) => load_config_file(path),
        None => load_merged_config(project_root),
    }
}

/// Load and validate config, falling back to defaults (and the built-in
/// catalog) when the project has none.
///
/// An explicit `config_override` must exist.
pub fn load_config_or_default(
    project_root: &Path,
    config_override: Option<&Path>,
) -> Result<BatonConfig> {
    let config = match load_config(project_root, config_override) {
        Err(BatonError::ConfigNotFound { path }) if config_override.is_none() => {
            debug!("No config at {}, using defaults", path.display());
            BatonConfig::default()
        }
        other => other?,
    };
    crate::config::validate(&config)?;
    Ok(config)
}

fn from_value(value: serde_yaml::Value, path: &Path) -> Result<BatonConfig> {
    serde_yaml::from_value(value).map_err(|e| BatonError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gating::GatingPolicy;
    use crate::runner::Scheduling;
    use tempfile::TempDir;

    fn project_with(config: &str, local: Option<&str>) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), config).unwrap();
        if let Some(local) = local {
            fs::write(dir.join("config.local.yml"), local).unwrap();
        }
        temp
    }

    #[test]
    fn discover_finds_project_and_local_configs() {
        let temp = project_with("", Some(""));
        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.has_project_config());
        assert!(paths.project_local.is_some());
        assert_eq!(paths.all_existing().len(), 2);
        assert!(paths.all_existing()[0].ends_with("config.yml"));
    }

    #[test]
    fn discover_returns_none_for_missing_configs() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::discover(temp.path());
        assert!(!paths.has_project_config());
        assert!(paths.all_existing().is_empty());
    }

    #[test]
    fn find_project_root_prefers_config_dir_over_git() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("nested").join("project");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        fs::create_dir_all(nested.join(CONFIG_DIR)).unwrap();

        assert_eq!(find_project_root(&nested), Some(nested.clone()));
        assert_eq!(
            find_project_root(&temp.path().join("nested")),
            Some(temp.path().to_path_buf())
        );
    }

    #[test]
    fn local_overrides_win() {
        let temp = project_with(
            "settings:\n  scheduling: graph\n  gating: strict\n",
            Some("settings:\n  gating: permissive\n"),
        );
        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config.settings.scheduling, Scheduling::Graph);
        assert_eq!(config.settings.gating, GatingPolicy::Permissive);
    }

    #[test]
    fn missing_project_config_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_merged_config(temp.path());
        assert!(matches!(result, Err(BatonError::ConfigNotFound { .. })));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_config_or_default(temp.path(), None).unwrap();
        assert!(config.steps.is_empty());
        assert_eq!(config.settings.time_scale, 1.0);
    }

    #[test]
    fn missing_override_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        let result = load_config_or_default(temp.path(), Some(&path));
        assert!(matches!(result, Err(BatonError::ConfigNotFound { .. })));
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = project_with("settings: [unclosed", None);
        let err = load_merged_config(temp.path()).unwrap_err();
        match err {
            BatonError::ConfigParseError { path, .. } => assert!(path.ends_with("config.yml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_file_is_default_config() {
        let temp = project_with("", None);
        let config = load_merged_config(temp.path()).unwrap();
        assert!(config.steps.is_empty());
    }

    #[test]
    fn override_is_loaded_without_merging() {
        let temp = project_with("settings:\n  gating: strict\n", None);
        let other = temp.path().join("other.yml");
        fs::write(&other, "settings:\n  scheduling: graph\n").unwrap();

        let config = load_config(temp.path(), Some(&other)).unwrap();
        assert_eq!(config.settings.scheduling, Scheduling::Graph);
        assert_eq!(config.settings.gating, GatingPolicy::Permissive);
    }

    #[test]
    fn parse_config_reports_source_path() {
        let err = parse_config("steps: 12", Path::new("inline.yml")).unwrap_err();
        assert!(err.to_string().contains("inline.yml"));
    }
}
