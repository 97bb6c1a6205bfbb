//! Error taxonomy for rule resolution and execution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::validation::ValidationError;

/// Errors that can occur while discovering, loading, matching or running rules.
///
/// Every variant except [`ActionError::Execution`] and [`ActionError::Timeout`]
/// is fatal to the resolution session that raised it.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// More than one rule file exists in a single directory.
    #[error("more than one rule file was found in '{}': {}", dir.display(), join_paths(files))]
    Discovery { dir: PathBuf, files: Vec<PathBuf> },

    /// YAML syntax error.
    #[error("cannot load the YAML file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Schema violations, invalid regex, mutually exclusive keys.
    #[error("'{}': {}", path.display(), summarize(errors))]
    Validation {
        path: PathBuf,
        errors: Vec<ValidationError>,
    },

    /// Undefined variable, filter misuse, missing shebang.
    #[error("template error in '{}': {message}", path.display())]
    Template { path: PathBuf, message: String },

    /// Shell interpreter or command executable unavailable.
    #[error("{0}")]
    Environment(String),

    /// No rule at all declares the requested tag.
    #[error("there is no action tagged '{tag}' for the path {}", path.display())]
    TagNotFound { tag: String, path: PathBuf },

    /// The command could not be prepared, spawned or awaited.
    #[error("{0}")]
    Execution(String),

    /// A command ran past its timeout and was killed.
    #[error("the command '{command}' timed out after {} seconds", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// Filesystem I/O error tied to a path.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for rule operations.
pub type Result<T> = std::result::Result<T, ActionError>;

impl ActionError {
    pub(crate) fn template(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Template {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn validation(path: &Path, location: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            path: path.to_path_buf(),
            errors: vec![ValidationError {
                path: location.to_string(),
                message: message.into(),
                suggestion: None,
            }],
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
