//! Error types for docaudit.
//!
//! Library crates use [`DocAuditError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docaudit operations.
#[derive(Debug, thiserror::Error)]
pub enum DocAuditError {
    /// Malformed chunking parameters (non-positive size, bad overlap).
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// A single chunk's model-backed check failed.
    #[error("validation of chunk {chunk_index} ({source_name}) failed: {reason}")]
    Validation {
        chunk_index: usize,
        source_name: String,
        reason: String,
    },

    /// A validation run was consumed before it reached aggregation.
    #[error("validation run stopped before aggregation ({validated} chunk(s) validated)")]
    Unfinished { validated: usize },

    /// The input path for document discovery is not a directory.
    #[error("{path:?} is not a valid directory")]
    Directory { path: PathBuf },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Language model transport, HTTP status, or response parsing error.
    #[error("model error: {0}")]
    Model(String),

    /// Text extraction from a source document failed.
    #[error("extraction error for {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// Report serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocAuditError>;

impl DocAuditError {
    /// Create an invalid-parameter error from any displayable message.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Attach a failure reason to the chunk it happened on.
    pub fn validation(chunk_index: usize, source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            chunk_index,
            source_name: source.into(),
            reason: reason.into(),
        }
    }

    /// Create a directory error for a path that is not a directory.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory { path: path.into() }
    }

    /// Create an extraction error for a document.
    pub fn extraction(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
