//! Shared Error Types
//!
//! This module defines error types that are shared between the client cache
//! and the server. They describe failures that are reported to the user
//! rather than infrastructure faults.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - A send intent violates the message constraints
//! - `NotFound` - An unknown sender, recipient or post
//!
//! # Usage
//!
//! ```rust
//! use campus_dm::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Message content cannot be empty");
//! let missing = SharedError::not_found("recipient", "u9");
//! ```
use thiserror::Error;

/// Shared error types that can occur on both ends of the connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity ("sender", "recipient", "post", ...)
        entity: String,
        /// The id that failed to resolve
        id: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Short user-facing text, used for `message-error` payloads
    pub fn summary(&self) -> String {
        match self {
            Self::SerializationError { .. } => "Malformed payload".to_string(),
            Self::ValidationError { message, .. } => message.clone(),
            Self::NotFound { entity, .. } => {
                let mut chars = entity.chars();
                match chars.next() {
                    Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                    None => "Not found".to_string(),
                }
            }
        }
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
