/**
 * Backend Error Types
 *
 * This module defines error types specific to the messaging server.
 * They are produced by the store, the broker and the socket gateway, and can
 * be converted to HTTP responses or `message-error` events.
 *
 * # Error Categories
 *
 * ## Rejections (nothing persisted)
 *
 * - Validation failures (empty text, missing post reference)
 * - Unknown sender, recipient or post
 *
 * ## Infrastructure
 *
 * - Database failures while persisting or querying
 * - Undecodable socket frames
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use campus_dm::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::UNAUTHORIZED, "Missing caller identity");
/// let err = BackendError::not_found("recipient", "u9");
/// let err = BackendError::protocol("Unknown event");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., missing identity header, bad query)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Socket protocol error (undecodable frame, unknown event)
    #[error("Protocol error: {message}")]
    ProtocolError {
        /// Human-readable error message
        message: String,
    },

    /// Validation and not-found rejections from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Database failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Convenience alias used throughout the backend
pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// Create a not-found rejection
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::SharedError(SharedError::not_found(entity, id))
    }

    /// Create a validation rejection
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SharedError(SharedError::validation(field, message))
    }

    /// Whether the error was raised before anything was persisted because the
    /// request itself was unacceptable
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::SharedError(SharedError::ValidationError { .. } | SharedError::NotFound { .. })
        )
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `ProtocolError` - 400 Bad Request
    /// - `SharedError` - 400 for validation/serialization, 404 for not-found
    /// - `DatabaseError` / `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::NotFound { .. } => StatusCode::NOT_FOUND,
            },
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::ProtocolError { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::DatabaseError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// Short text for a `message-error` event; infrastructure details go to
    /// `details` instead of the headline.
    pub fn client_summary(&self) -> String {
        match self {
            Self::SharedError(err) => err.summary(),
            Self::ProtocolError { message } => message.clone(),
            Self::HandlerError { message, .. } => message.clone(),
            Self::DatabaseError(_) | Self::SerializationError(_) => "Failed to send message".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_handler_error() {
        let error = BackendError::handler(StatusCode::UNAUTHORIZED, "Missing caller identity");
        assert_matches!(error, BackendError::HandlerError { status, ref message } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message, "Missing caller identity");
        });
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(BackendError::not_found("recipient", "u9").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            BackendError::validation("content", "empty").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(BackendError::protocol("bad frame").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            BackendError::DatabaseError(sqlx::Error::PoolClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rejections() {
        assert!(BackendError::not_found("sender", "u1").is_rejection());
        assert!(BackendError::validation("postId", "missing").is_rejection());
        assert!(!BackendError::DatabaseError(sqlx::Error::PoolClosed).is_rejection());
    }

    #[test]
    fn test_client_summary_hides_database_details() {
        let error = BackendError::DatabaseError(sqlx::Error::PoolClosed);
        assert_eq!(error.client_summary(), "Failed to send message");
        assert_eq!(BackendError::not_found("recipient", "u9").client_summary(), "Recipient not found");
    }

    #[test]
    fn test_from_shared_error() {
        let backend_error: BackendError = SharedError::validation("field", "message").into();
        assert_matches!(backend_error, BackendError::SharedError(_));
    }
}
