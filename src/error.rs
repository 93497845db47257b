//! Error types for modlayer
//!
//! All modules use `ModlayerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for modlayer operations
pub type ModlayerResult<T> = Result<T, ModlayerError>;

/// All errors that can occur while contributing layers
#[derive(Error, Debug)]
pub enum ModlayerError {
    // Package manager errors
    #[error("unable to install node_modules: {0}")]
    Install(String),

    #[error("unable to rebuild node_modules: {0}")]
    Rebuild(String),

    #[error("failed to check unmet dependencies: {0}")]
    UnmetDependencyCheck(String),

    // Build plan errors
    #[error("Invalid build plan at {path}: {reason}")]
    PlanInvalid { path: PathBuf, reason: String },

    #[error("Build plan not found: {0}")]
    PlanNotFound(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Layer store errors
    #[error("Invalid layer metadata at {path}: {reason}")]
    LayerMetadataInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to copy \"{}\" to \"{}\"", from.display(), to.display())]
    CopyDir {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with code {code}:\n{output}")]
    CommandExecution {
        command: String,
        code: i32,
        output: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModlayerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, code: i32, output: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            code,
            output: output.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandFailed { .. } => {
                Some("Check that npm is installed and on PATH, or set [npm] command in the config")
            }
            Self::PlanNotFound(_) => Some("Pass the build plan written by detection with --plan"),
            Self::Install(_) | Self::Rebuild(_) => {
                Some("Run the same npm command locally to reproduce the failure")
            }
            _ => None,
        }
    }
}
