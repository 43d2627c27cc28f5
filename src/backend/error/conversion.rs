/**
 * Error Conversion
 *
 * This module provides conversion implementations for backend errors,
 * allowing them to be returned directly from REST handlers or turned into
 * `message-error` events on the socket path.
 *
 * # Response Format
 *
 * Error responses are returned as JSON with the following structure:
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 404
 * }
 * ```
 */

use axum::{
    response::{Response, IntoResponse},
    http::StatusCode,
    body::Body,
};
use crate::backend::error::types::BackendError;
use crate::shared::ServerEvent;

impl IntoResponse for BackendError {
    /// Convert a backend error into an HTTP response
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[Http] {}", message);
        } else {
            tracing::debug!("[Http] Rejected request: {}", message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                let mut fallback = Response::new(Body::from("Internal Server Error"));
                *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

impl BackendError {
    /// Turn the error into a `message-error` event for the sending connection
    pub fn to_event(&self, client_id: Option<String>) -> ServerEvent {
        let details = match self {
            BackendError::SharedError(_) => None,
            other => Some(other.message()),
        };
        ServerEvent::error(self.client_summary(), details, client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::event::MessageErrorPayload;

    #[tokio::test]
    async fn test_json_error_body() {
        let response = BackendError::not_found("recipient", "u9").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "recipient not found: u9");
    }

    #[test]
    fn test_to_event_carries_client_id() {
        let event = BackendError::validation("content", "Message content cannot be empty")
            .to_event(Some("temp_a_1".to_string()));
        assert_eq!(
            event,
            ServerEvent::MessageError(MessageErrorPayload {
                error: "Message content cannot be empty".to_string(),
                details: None,
                client_id: Some("temp_a_1".to_string()),
            })
        );
    }
}
