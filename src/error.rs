// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for trace-metrics.
//!
//! This module provides strongly-typed errors for different parts of the application,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation.

use thiserror::Error;

/// Errors that can occur while running a single metrics query.
///
/// These never reach the caller of [`crate::query::Aggregator::refresh`]; a failed
/// query degrades to "no data for this query".
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Response parsing error: {0}")]
    Parse(String),

    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl QueryError {
    /// Check if this error consumes an attempt and may be retried.
    ///
    /// Every non-success status is retried the same way, 401 included.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status(_))
    }

    /// HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl ConfigError {
    /// Create an invalid value error for a named field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors that can occur while scanning sources for trace annotations.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to walk directory: {0}")]
    Walk(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid include pattern: {0}")]
    InvalidPattern(String),
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        Self::Walk(err.to_string())
    }
}

impl From<globset::Error> for ScanError {
    fn from(err: globset::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_retryable() {
        assert!(QueryError::Network("connection refused".to_string()).is_retryable());
        assert!(QueryError::Status(503).is_retryable());
        assert!(QueryError::Status(401).is_retryable());
        assert!(!QueryError::Parse("missing facets".to_string()).is_retryable());
        assert!(!QueryError::NotConfigured("no key".to_string()).is_retryable());
    }

    #[test]
    fn test_query_error_status_code() {
        assert_eq!(QueryError::Status(500).status_code(), Some(500));
        assert_eq!(QueryError::Network("reset".to_string()).status_code(), None);
    }

    #[test]
    fn test_query_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{facets");
        let err: QueryError = result.unwrap_err().into();
        assert!(matches!(err, QueryError::Parse(_)));
    }

    #[test]
    fn test_config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid json");
        let json_err = result.unwrap_err();
        let config_err: ConfigError = json_err.into();
        assert!(matches!(config_err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid("untilDate", "date is in the future");
        let display = format!("{}", err);
        assert!(display.contains("untilDate"));
        assert!(display.contains("future"));
        assert_eq!(QueryError::Status(404).to_string(), "Unexpected HTTP status 404");
    }
}
