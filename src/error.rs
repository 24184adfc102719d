//! Error types for the asmir front end.
//!
//! Line-level syntax problems never surface here; the parser records them as
//! [`crate::frontend::parser::Diagnostic`]s and keeps going. This module covers
//! the file-level failures that abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for asmir operations.
#[derive(Debug, Error)]
pub enum AsmIrError {
    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not a textual assembly dump
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource limit exceeded
    #[error("Resource limit exceeded: {resource} ({used}/{limit})")]
    ResourceExhausted {
        resource: String,
        used: u64,
        limit: u64,
    },

    /// No line of a non-empty input could be parsed
    #[error("Parse failed: all {rejected} non-blank lines were rejected")]
    ParseFailed { rejected: usize },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// IR could not be written to its destination
    #[error("Cannot write IR to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for asmir operations
pub type Result<T> = std::result::Result<T, AsmIrError>;

impl From<serde_json::Error> for AsmIrError {
    fn from(err: serde_json::Error) -> Self {
        AsmIrError::Serialization(err.to_string())
    }
}
