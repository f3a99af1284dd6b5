//! Error types for the enrichment engine.

use thiserror::Error;

/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Errors that can occur while enriching notes.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// No API key available.
    #[error("completion provider not configured: missing API key")]
    ProviderNotConfigured,

    /// Library folder not found.
    #[error("library not found: {0}")]
    LibraryNotFound(String),

    /// Network failure talking to the provider.
    #[error("transport error: {0}")]
    Transport(String),

    /// API returned an error status.
    #[error("API request failed with status {status}: {body}")]
    ApiStatus { status: u16, body: String },

    /// Response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// An existing header holds bytes that are not UTF-8.
    #[error("header of {0} is not valid UTF-8")]
    InvalidEncoding(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnrichError {
    /// Whether the call that produced this error is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for EnrichError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::ApiStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_transient() {
        assert!(EnrichError::Transport("connection reset".to_string()).is_transient());
        assert!(
            !EnrichError::ApiStatus {
                status: 500,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!EnrichError::InvalidResponse("no choices".to_string()).is_transient());
        assert!(!EnrichError::ProviderNotConfigured.is_transient());
    }
}
