//! Error types for the archive exporter.

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that abort an export run.
///
/// Problems with a single message or image never surface here; they are
/// rendered as placeholders instead.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Archive file does not exist.
    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    /// Archive JSON has an unsupported shape.
    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    /// Archive is not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write the zip bundle.
    #[error("bundle error: {0}")]
    Bundle(#[from] zip::result::ZipError),
}
