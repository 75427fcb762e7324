//! Custom error types for rustpapers.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PapersError>` instead of using `unwrap()`.
//! The renderer has no error type at all: malformed sections degrade to
//! empty values or a raw dump.

use thiserror::Error;

/// Main error type for rustpapers operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum PapersError {
    /// Requested record id does not correspond to a file in the store
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record file exists but is not valid JSON
    #[error("Parse error in {id}: {message}")]
    Parse {
        /// Record id (file name)
        id: String,
        /// Underlying parser message
        message: String,
    },

    /// External survey service failed (transport, auth, quota)
    #[error("Service error: {0}")]
    Service(String),

    /// External API returned an error status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code from API
        code: u16,
        /// Error message from API
        message: String,
    },

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PapersError {
    /// True for failures of the external text-generation service.
    ///
    /// Callers keep the user's selection and show the message inline.
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            PapersError::Service(_) | PapersError::Api { .. } | PapersError::Network(_)
        )
    }
}

/// Result type alias using `PapersError`
pub type Result<T> = std::result::Result<T, PapersError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a not-found error naming the id
    fn ok_or_not_found(self, id: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, id: &str) -> Result<T> {
        self.ok_or_else(|| PapersError::NotFound(id.to_string()))
    }
}
