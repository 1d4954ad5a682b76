//! Compiler configuration, loadable from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Names of the task relation and its bookkeeping columns, plus parse defaults.
///
/// Identifiers are always emitted quoted, so they are never spliced raw
/// into the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Relation holding the tasks
    pub table: String,
    /// Column every query is scoped by
    pub scope_column: String,
    /// Soft-delete column; rows with a value are excluded
    pub archived_column: String,
    /// Column for the fallback `ORDER BY ... DESC`
    pub default_sort_column: String,
    /// Limit used when the query has no `limit:` option
    pub default_limit: i64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            table: "tasks".to_string(),
            scope_column: "project_id".to_string(),
            archived_column: "archived_at".to_string(),
            default_sort_column: "created_at".to_string(),
            default_limit: 100,
        }
    }
}

impl CompilerConfig {
    /// Loads the config from a JSON file. Missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::NotFound(path_ref.to_path_buf()));
        }

        let content = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;

        let config: CompilerConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path_ref.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let identifiers = [
            ("table", &self.table),
            ("scope_column", &self.scope_column),
            ("archived_column", &self.archived_column),
            ("default_sort_column", &self.default_sort_column),
        ];
        for (name, value) in identifiers {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}
