// src/error.rs

//! Unified error handling for the mirror.

use std::fmt;

use thiserror::Error;

/// Result type alias for mirror operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Every attempt against the remote host failed
    #[error("Transport exhausted after {attempts} attempts: {url}")]
    TransportExhausted { url: String, attempts: u32 },

    /// The remote host answered with a redirect
    #[error("Redirect ({status}) attempted with url: {url}")]
    Redirect { url: String, status: u16 },

    /// The ajax module connector reported a non-ok status
    #[error("Module {module} failed with status '{status}': {message}")]
    Module {
        module: String,
        status: String,
        message: String,
    },

    /// Mutation attempted against a read-only backend
    #[error("Backend is read-only: cannot {0}")]
    BackendReadOnly(String),

    /// Requested page, thread or record is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// An expected element is missing from a response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A list_pages filter expression could not be parsed
    #[error("Invalid filter '{expression}': {message}")]
    InvalidFilter { expression: String, message: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Local store query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a not-found error.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Create a malformed-response error.
    pub fn malformed(what: impl fmt::Display) -> Self {
        Self::MalformedResponse(what.to_string())
    }

    /// Create a read-only backend error for the named operation.
    pub fn read_only(operation: impl Into<String>) -> Self {
        Self::BackendReadOnly(operation.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a filter parsing error.
    pub fn invalid_filter(expression: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidFilter {
            expression: expression.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportExhausted { .. } | Self::Redirect { .. } | Self::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_grouping() {
        let exhausted = AppError::TransportExhausted {
            url: "http://example.wikidot.com".into(),
            attempts: 10,
        };
        assert!(exhausted.is_transport());
        assert!(!AppError::not_found("page").is_transport());
        assert!(!AppError::read_only("edit").is_transport());
    }

    #[test]
    fn test_display() {
        let err = AppError::invalid_filter("rating=>>1", "unknown operator");
        assert_eq!(
            err.to_string(),
            "Invalid filter 'rating=>>1': unknown operator"
        );
    }
}
