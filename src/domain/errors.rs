//! Domain error types
//!
//! This module defines the error hierarchy for esdump.
//! Errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main esdump error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Search backend errors
    #[error("Search backend error: {0}")]
    Search(#[from] SearchError),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Search backend errors
///
/// Errors that occur when talking to the search cluster.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Failed to connect to the cluster
    #[error("Failed to connect to search cluster: {0}")]
    ConnectionFailed(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Invalid response body
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The server-side scroll context is gone
    #[error("Scroll context expired: {0}")]
    ScrollExpired(String),

    /// One or more shards failed to answer a page
    #[error("Shard failure: {failed} of {total} shards failed")]
    ShardFailure { failed: u64, total: u64 },

    /// A hit carried no `_source` payload
    #[error("Document {0} has no _source")]
    MissingSource(String),
}

impl SearchError {
    /// Whether the request that produced this error may be sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::ConnectionFailed(_) | SearchError::Timeout(_) => true,
            SearchError::ServerError { status, .. } => matches!(status, 502..=504),
            SearchError::ClientError { status, .. } => *status == 429,
            _ => false,
        }
    }
}

impl DumpError {
    /// Whether this error is a transient search failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, DumpError::Search(e) if e.is_retryable())
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DumpError {
    fn from(err: std::io::Error) -> Self {
        DumpError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DumpError {
    fn from(err: serde_json::Error) -> Self {
        DumpError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DumpError {
    fn from(err: toml::de::Error) -> Self {
        DumpError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_error_display() {
        let err = DumpError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_search_error_conversion() {
        let search_err = SearchError::ConnectionFailed("Network error".to_string());
        let err: DumpError = search_err.into();
        assert!(matches!(err, DumpError::Search(_)));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(SearchError::ConnectionFailed("refused".into()).is_retryable());
        assert!(SearchError::Timeout("30s".into()).is_retryable());
        assert!(SearchError::ServerError {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(SearchError::ClientError {
            status: 429,
            message: "too many requests".into()
        }
        .is_retryable());

        assert!(!SearchError::ServerError {
            status: 500,
            message: "boom".into()
        }
        .is_retryable());
        assert!(!SearchError::ClientError {
            status: 404,
            message: "no such index".into()
        }
        .is_retryable());
        assert!(!SearchError::ScrollExpired("gone".into()).is_retryable());
    }

    #[test]
    fn test_dump_error_retryable_only_for_search() {
        let err: DumpError = SearchError::Timeout("slow".into()).into();
        assert!(err.is_retryable());
        assert!(!DumpError::Io("disk full".into()).is_retryable());
    }

    #[test]
    fn test_shard_failure_display() {
        let err = SearchError::ShardFailure {
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "Shard failure: 2 of 5 shards failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: DumpError = io_err.into();
        assert!(matches!(err, DumpError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: DumpError = json_err.into();
        assert!(matches!(err, DumpError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: DumpError = toml_err.into();
        assert!(matches!(err, DumpError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
