//! Error types for git process operations

use std::io;
use thiserror::Error;

/// Errors that can occur while invoking git
#[derive(Debug, Error)]
pub enum GitError {
    /// The git executable could not be started
    #[error("Failed to run git: {0}")]
    Spawn(#[source] io::Error),

    /// git exited with a non-zero status
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Porcelain output did not follow the expected layout
    #[error("unparsable blame output at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl GitError {
    /// Check if git reported that the path is not in the committed tree
    pub fn is_untracked(&self) -> bool {
        match self {
            GitError::CommandFailed { stderr, .. } => {
                let stderr = stderr.to_lowercase();
                stderr.contains("no such path") || stderr.contains("not in head")
            }
            _ => false,
        }
    }
}

/// Result type for git operations
pub type GitResult<T> = Result<T, GitError>;
