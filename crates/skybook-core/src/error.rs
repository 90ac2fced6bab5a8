//! Unified error types for skybook

use thiserror::Error;

/// Unified error type for all skybook operations
#[derive(Error, Debug)]
pub enum SkybookError {
    // Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    // Browser errors
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out after {timeout_ms}ms waiting for {target}")]
    Timeout { target: String, timeout_ms: u64 },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    // Workflow errors
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Not implemented: {0}")]
    Unsupported(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl SkybookError {
    /// Whether this error is a bounded wait running out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, SkybookError::Timeout { .. })
    }
}

/// Result type alias using SkybookError
pub type Result<T> = std::result::Result<T, SkybookError>;
