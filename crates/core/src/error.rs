//! Error types for repo-blame analyses

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort an analysis
#[derive(Debug, Error)]
pub enum BlameError {
    /// Root path missing, not version-controlled, or not the tree root
    #[error("{} is not a valid repository: {reason}", .path.display())]
    InvalidRepository { path: PathBuf, reason: String },

    /// Unresolvable or contradictory request
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Persistence failed after the analysis completed
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BlameError {
    pub fn invalid_repository(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        BlameError::InvalidRepository {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        BlameError::Configuration(message.into())
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BlameError::Write {
            path: path.into(),
            source,
        }
    }

    pub fn is_invalid_repository(&self) -> bool {
        matches!(self, BlameError::InvalidRepository { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, BlameError::Configuration(_))
    }

    pub fn is_write(&self) -> bool {
        matches!(self, BlameError::Write { .. })
    }
}

/// Result type for analyses
pub type BlameResult<T> = Result<T, BlameError>;
