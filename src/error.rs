//! Error types for pagereq
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::http::DEFAULT_RETRY_STATUSES;
use thiserror::Error;

/// A single detail entry of an API error envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Detail name (usually the offending field)
    pub name: Option<String>,
    /// Detail code as sent by the service
    pub code: Option<String>,
    /// Human-readable message
    pub message: String,
}

/// The main error type for pagereq
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Request is invalid: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Vec<ErrorDetail>,
    },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("TLS setup failed: {message}")]
    Tls { message: String },

    // ============================================================================
    // Body Errors
    // ============================================================================
    #[error("Failed to encode request body for {url}: {message}")]
    Encode { url: String, message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Cannot place page {page}: {message}")]
    Placement { page: u32, message: String },

    #[error("Page fetch task failed: {message}")]
    Task { message: String },

    #[error("Page metadata out of range: {message}")]
    Capacity { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error for a single field
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            fields: vec![field.into()],
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create an encode error
    pub fn encode(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a TLS error
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls {
            message: message.into(),
        }
    }

    /// Create a placement error
    pub fn placement(page: u32, message: impl Into<String>) -> Self {
        Self::Placement {
            page,
            message: message.into(),
        }
    }

    /// Create a task error
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Create a capacity error
    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Capacity {
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } | Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error is retryable
    ///
    /// Transport failures other than malformed requests, timeouts, and
    /// statuses in the default retry list.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_builder(),
            Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } | Error::Api { status, .. } => {
                DEFAULT_RETRY_STATUSES.contains(status)
            }
            _ => false,
        }
    }
}

/// Result type alias for pagereq
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::http_status(404, "Not Found: /posts Service: api.local");
        assert_eq!(err.to_string(), "HTTP 404: Not Found: /posts Service: api.local");

        let err = Error::Validation {
            fields: vec!["method".to_string(), "url".to_string()],
        };
        assert_eq!(err.to_string(), "Request is invalid: method, url");

        let err = Error::placement(12, "outside of plan 5..=10");
        assert_eq!(err.to_string(), "Cannot place page 12: outside of plan 5..=10");
    }

    #[test]
    fn test_api_error_displays_envelope_message() {
        let err = Error::Api {
            status: 404,
            message: "Some failed message".to_string(),
            code: Some("SEARCH".to_string()),
            details: vec![],
        };
        assert_eq!(err.to_string(), "Some failed message");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(502, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());
        assert!(Error::http_status(504, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::http_status(429, "").is_retryable());
        assert!(!Error::config("test").is_retryable());
        assert!(!Error::placement(3, "duplicate").is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
