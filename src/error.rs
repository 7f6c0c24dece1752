// src/error.rs

//! Unified error handling for the catalog sync application.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for catalog sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Marker the store puts in a rejection body when it could not sideload an image.
const IMAGE_UPLOAD_ERROR: &str = "image_upload_error";

/// A single problem found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    pub field: &'static str,
    pub message: String,
}

impl ConfigViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more configuration values are missing or malformed
    #[error("Invalid configuration:\n{}", format_violations(.0))]
    InvalidConfig(Vec<ConfigViolation>),

    /// Page driver (browser) failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// A bounded wait elapsed
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    /// Listing page discovery failed
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Remote store answered with a non-success status
    #[error("Remote store rejected request ({status}): {body}")]
    RemoteRejected { status: u16, body: String },

    /// Operation not supported by the active driver
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a browser error.
    pub fn browser(message: impl fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }

    /// Create a timeout error.
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            after,
        }
    }

    /// Create a discovery error.
    pub fn discovery(message: impl fmt::Display) -> Self {
        Self::Discovery(message.to_string())
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Whether the remote store refused the payload because an image could not be uploaded.
    pub fn is_image_upload_error(&self) -> bool {
        matches!(self, Self::RemoteRejected { body, .. } if body.contains(IMAGE_UPLOAD_ERROR))
    }
}

fn format_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
