//! Error types for rseqp

use thiserror::Error;

/// Result type for rseqp library operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Failures that stop a document before any parsing happens.
///
/// Malformed content (missing answers, unresolved images, ...) never ends up
/// here; it is absorbed as empty fields in the output.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A field of the input document has the wrong shape
    #[error("Invalid input in '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// The input could not be parsed as JSON
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> ExtractError {
        ExtractError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the offending input field, if the error points at one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ExtractError::InvalidInput { field, .. } => Some(field.as_str()),
            ExtractError::Json(_) => None,
        }
    }
}
