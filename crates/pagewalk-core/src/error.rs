//! Core error types for pagewalk.
//!
//! `SourceError` covers page fetch failures reported by a
//! [`crate::PageSource`]; `ConfigError` covers configuration loading.

use thiserror::Error;

/// Failure to produce a page.
///
/// The scanner treats every variant as "no data" for the page in question;
/// the distinction only matters to callers of the source itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The server answered with a non-success status
    #[error("unexpected HTTP status {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Connection, TLS, timeout or body read failure
    #[error("transport error for {url}: {message}")]
    Transport {
        /// Requested URL
        url: String,
        /// Underlying error message
        message: String,
    },

    /// The request could not be built (empty owner, page 0, bad URL)
    #[error("invalid page request: {0}")]
    InvalidRequest(String),

    /// The response could not be interpreted as a listing page
    #[error("failed to parse listing page: {0}")]
    Parse(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for page source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Status {
            url: "https://example.com/gallery/a/1".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "unexpected HTTP status 503 for https://example.com/gallery/a/1"
        );

        let err = SourceError::InvalidRequest("page 0".to_string());
        assert_eq!(err.to_string(), "invalid page request: page 0");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "requests.max_concurrent_requests".to_string(),
            reason: "too large".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for requests.max_concurrent_requests: too large"
        );
    }

    #[test]
    fn test_config_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io.into();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
