//! Error taxonomy for detection, splitting, and workflow execution.
//!
//! Typed errors carry enough context to name the failing file or operation;
//! the API surface converts to `anyhow::Error` so callers can attach further
//! context with `?`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitmapError {
    /// Source file could not be parsed. Non-fatal in batch contexts: the
    /// offending file is skipped and recorded.
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The plan's dependency graph is cyclic or otherwise inconsistent.
    /// Fatal at plan construction; nothing executes.
    #[error("structural error in plan: {message}")]
    Structural { message: String },

    /// An extracted group references a name that resolves to nothing.
    /// Raised before any file is written; the whole split is abandoned.
    #[error("unresolved reference `{identifier}` in group `{group}` of {path}")]
    ImportResolution {
        path: PathBuf,
        group: String,
        identifier: String,
    },

    #[error("I/O error at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pre- or post-operation validation failed at workflow level.
    #[error("validation failed for operation {operation}: {message}")]
    Validation { operation: String, message: String },

    /// The external test command exited non-zero or timed out.
    #[error("test command failed: {message}")]
    ExternalCommand { message: String },

    #[error("test command timed out after {0:?}")]
    ExternalCommandTimeout(Duration),

    /// Another workflow instance owns this tree.
    #[error("workspace already locked: {path}")]
    Lock { path: PathBuf },

    #[error("backup error: {message}")]
    Backup { message: String },
}

impl SplitmapError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn validation(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for errors worth a bounded retry (held locks, interrupted syscalls).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitmapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification_covers_io_kinds() {
        let err = SplitmapError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"),
        );
        assert!(err.is_transient());

        let err = SplitmapError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(!err.is_transient());

        assert!(!SplitmapError::structural("cycle").is_transient());
    }

    #[test]
    fn error_messages_name_the_failing_site() {
        let err = SplitmapError::ImportResolution {
            path: PathBuf::from("src/big.rs"),
            group: "parser".to_string(),
            identifier: "HashMap".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HashMap"));
        assert!(msg.contains("parser"));
        assert!(msg.contains("src/big.rs"));
    }
}
