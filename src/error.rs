//! Custom error types for podcast-catalog.
//!
//! Fetch, lookup and filter failures are kept apart so callers can tell a
//! fatal catalog failure from a bad episode number or filter.

use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::io;

/// Application error types.
#[derive(Debug)]
pub enum AppError {
    /// Network/HTTP errors
    Network(String),
    /// Upstream rejected the access token
    Auth(String),
    /// API response parsing errors
    Parse(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(io::Error),
    /// The first catalog page could not be fetched
    FatalFetch(String),
    /// Episode number outside the valid range
    OutOfRange(String),
    /// Unsupported date filter or malformed custom range
    InvalidFilter(String),
    /// Invalid input from user
    InvalidInput(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "Network error: {}", msg),
            AppError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Parse(msg) => write!(f, "Parse error: {}", msg),
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::FatalFetch(msg) => write!(f, "Failed to fetch episodes: {}", msg),
            AppError::OutOfRange(msg) => write!(f, "{}", msg),
            AppError::InvalidFilter(msg) => write!(f, "{}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure object handed to the presentation layer instead of an error chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    /// Always `false`.
    pub success: bool,
    /// Human-readable message.
    pub error: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

impl From<AppError> for Failure {
    fn from(err: AppError) -> Self {
        Failure::new(err.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_out_of_range_message_is_verbatim() {
        let err = AppError::OutOfRange("Episode #5 not found. Valid range: 1-4".to_string());
        assert_eq!(err.to_string(), "Episode #5 not found. Valid range: 1-4");
    }

    #[test]
    fn test_failure_from_error() {
        let failure: Failure = AppError::FatalFetch("timeout".to_string()).into();
        assert!(!failure.success);
        assert_eq!(failure.error, "Failed to fetch episodes: timeout");
    }

    #[test]
    fn test_failure_serializes_success_flag() {
        let json = serde_json::to_string(&Failure::new("boom")).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"boom"}"#);
    }
}
