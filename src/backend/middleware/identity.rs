/**
 * Caller Identity
 *
 * Authentication happens in front of this service. The auth layer forwards
 * the authenticated user id in the `x-user-id` header, and REST handlers
 * take it through the `SessionUser` extractor.
 *
 * Requests without the header are rejected with 401.
 */

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};

use crate::backend::error::types::BackendError;

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller of a REST request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub String);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                tracing::warn!("Missing {} header", USER_ID_HEADER);
                BackendError::handler(StatusCode::UNAUTHORIZED, "Missing caller identity")
            })?;

        Ok(SessionUser(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<SessionUser, BackendError> {
        let (mut parts, _) = request.into_parts();
        SessionUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_reads_header() {
        let request = Request::builder().header(USER_ID_HEADER, " u1 ").body(()).unwrap();
        assert_eq!(extract(request).await.unwrap(), SessionUser("u1".into()));
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        let err = extract(request).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let blank = Request::builder().header(USER_ID_HEADER, "").body(()).unwrap();
        assert!(extract(blank).await.is_err());
    }
}
