//! Error types for the scenario runner.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or running a scenario.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// I/O error reading or writing a file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Scenario YAML could not be parsed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Report could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scenario parsed but is not usable.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

impl RunnerError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunnerError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid scenario error.
    pub fn invalid(message: impl Into<String>) -> Self {
        RunnerError::InvalidScenario(message.into())
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
