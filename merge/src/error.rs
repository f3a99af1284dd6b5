//! Error types for the merge engine.

use thiserror::Error;

/// Result type alias for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors that abort a merge before any file is touched.
///
/// Failures on individual notes are counted in the report instead.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Staging directory not found.
    #[error("staging directory not found: {0}")]
    StagingNotFound(String),

    /// Staging and library overlap.
    #[error("invalid paths: {0}")]
    InvalidPaths(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
