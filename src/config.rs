//! Workspace configuration for a curation run.

use crate::artifact::Severity;
use crate::error::ConfigError;
use crate::workspace::WorkspacePaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Recognized options for one run.
///
/// `max_revisions` and `fail_on_stagnation` are opt-in bounds on the revise
/// loop; by default the loop runs until the gate accepts.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CurationConfig {
    pub schema_version: u32,

    #[serde(default = "default_max_stylistic_complaints")]
    pub max_stylistic_complaints: usize,

    /// Severity code applied to complaints the gate does not recognize.
    #[serde(default = "default_unknown_severity")]
    pub treat_unknown_severity_as: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_revisions: Option<u32>,

    #[serde(default)]
    pub fail_on_stagnation: bool,
}

fn default_max_stylistic_complaints() -> usize {
    2
}

fn default_unknown_severity() -> String {
    Severity::Factual.as_str().to_string()
}

pub fn default_config() -> CurationConfig {
    CurationConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        max_stylistic_complaints: default_max_stylistic_complaints(),
        treat_unknown_severity_as: default_unknown_severity(),
        max_revisions: None,
        fail_on_stagnation: false,
    }
}

pub fn validate_config(config: &CurationConfig) -> Result<(), ConfigError> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(ConfigError::UnsupportedSchemaVersion(config.schema_version));
    }
    match config.treat_unknown_severity_as.as_str() {
        "factual" | "stylistic" => {}
        other => {
            return Err(ConfigError::InvalidOption {
                option: "treat_unknown_severity_as",
                message: format!("must be \"factual\" or \"stylistic\" (got {other:?})"),
            });
        }
    }
    Ok(())
}

pub fn load_config(workspace_root: &Path) -> Result<CurationConfig, ConfigError> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    let path = paths.config_path();
    let bytes = fs::read(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config: CurationConfig =
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse { path, source })?;
    validate_config(&config)?;
    Ok(config)
}

pub fn write_config(workspace_root: &Path, config: &CurationConfig) -> Result<(), ConfigError> {
    let paths = WorkspacePaths::new(workspace_root.to_path_buf());
    let path = paths.config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, text.as_bytes()).map_err(|source| ConfigError::Io { path, source })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = default_config();
        validate_config(&config).expect("default config valid");
        assert_eq!(config.max_stylistic_complaints, 2);
        assert_eq!(config.treat_unknown_severity_as, "factual");
        assert!(config.max_revisions.is_none());
        assert!(!config.fail_on_stagnation);
    }

    #[test]
    fn test_validate_rejects_unknown_severity_mapping() {
        let mut config = default_config();
        config.treat_unknown_severity_as = "fatal".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_schema_mismatch() {
        let mut config = default_config();
        config.schema_version = 99;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_config_round_trips_through_workspace() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = default_config();
        config.max_revisions = Some(5);
        write_config(dir.path(), &config).expect("write config");
        let loaded = load_config(dir.path()).expect("load config");
        assert_eq!(loaded.max_revisions, Some(5));
        assert_eq!(loaded.max_stylistic_complaints, 2);
    }
}
