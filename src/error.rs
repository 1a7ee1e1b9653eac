//! Error types for iconpack
//!
//! All modules use `IconpackResult<T>` as their return type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for iconpack operations
pub type IconpackResult<T> = Result<T, IconpackError>;

/// All errors that can occur in iconpack
#[derive(Error, Debug)]
pub enum IconpackError {
    // Resolution errors
    #[error("Icon not found: {key} (searched: {searched})")]
    NotFound { key: String, searched: String },

    #[error("Invalid icon key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    // Transform errors
    #[error("Transform failed: {reason}")]
    Transform { reason: String },

    #[error("Unsupported mode: {0}. Expected 'vector' or 'raster'")]
    UnsupportedMode(String),

    #[error("Required program not found: {name}. {hint}")]
    MissingRequiredDependency { name: String, hint: String },

    #[error("Optional program not found: {name}")]
    MissingOptionalDependency { name: String },

    // Cache errors
    #[error("Failed to write cache entry {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Generation errors
    #[error("Module generation failed: {0}")]
    Generation(String),

    #[error("Compile failed for {} icon(s): {}", .failures.len(), join_failures(.failures))]
    CompileFailed { failures: Vec<KeyFailure> },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A per-key failure carried by [`IconpackError::CompileFailed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFailure {
    pub key: String,
    pub cause: String,
}

impl fmt::Display for KeyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.cause)
    }
}

fn join_failures(failures: &[KeyFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl IconpackError {
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

    /// Create a transform error
    pub fn transform(reason: impl Into<String>) -> Self {
        Self::Transform {
            reason: reason.into(),
        }
    }

    /// Check if a failed lookup is worth attempting again on the next compile
    ///
    /// A missing file may appear later (moved, generated, checked out); a
    /// malformed file or an invalid key will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Io { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingRequiredDependency { .. } => Some(
                "Install librsvg (rsvg-convert), set raster.rasterizer, or switch to mode = \"vector\"",
            ),
            Self::MissingOptionalDependency { .. } => {
                Some("Install pngquant or set raster.quantize = false")
            }
            Self::UnsupportedMode(_) => Some("Set mode = \"vector\" or mode = \"raster\""),
            Self::CompileFailed { .. } => {
                Some("Fix the listed icons or disable strict mode to skip them")
            }
            Self::NotFound { .. } => Some("Check resolve.source_dir and the icon's uri"),
            Self::ConfigInvalid { .. } => {
                Some("Fix the named setting in iconpack.toml; `iconpack config show` prints the effective values")
            }
            _ => None,
        }
    }
}
