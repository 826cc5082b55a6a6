//! Error types for kiln
//!
//! All modules use `KilnResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kiln operations
pub type KilnResult<T> = Result<T, KilnError>;

/// All errors that can occur in kiln
#[derive(Error, Debug)]
pub enum KilnError {
    // Fetch pipeline errors. Collaborator messages are carried unmodified.
    #[error("{0}")]
    Metadata(String),

    #[error("{0}")]
    Download(String),

    #[error(transparent)]
    WorkDir(std::io::Error),

    #[error("{context}: {source}")]
    Decompression {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Packaging(String),

    #[error("{0}")]
    CachePersist(String),

    // Input errors
    #[error("Invalid package '{input}': {reason}")]
    InvalidPackage { input: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

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

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl KilnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap an extraction failure with a fixed context
    pub fn decompression(context: &'static str, source: std::io::Error) -> Self {
        Self::Decompression { context, source }
    }

    /// Check if error is likely transient. Nothing in kiln retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Metadata(_) | Self::Download(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Metadata(_) => Some("Check the organization/repository name and github.api_url"),
            Self::Packaging(_) => Some("Check that packager.program is installed and on PATH"),
            Self::CachePersist(_) => {
                Some("The artifact was built but not recorded; check cache.dir permissions")
            }
            Self::InvalidPackage { .. } => Some("Use the form <organization>/<repository>"),
            _ => None,
        }
    }
}
