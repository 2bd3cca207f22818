//! Error response handling for authentication middleware.
//!
//! This module implements `IntoResponse` for `AuthError` so handlers and
//! extractors can return errors directly. Every response carries a JSON body
//! of the form `{"message": "..."}`.
//!
//! Server-side failure causes (registry outages, storage errors) are logged
//! here and never included in the response body.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// Challenge sent with 401 responses, per RFC 6750.
const WWW_AUTHENTICATE_CHALLENGE: &str = "Bearer realm=\"keygate\"";

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Internal causes stay in the logs; the body gets a generic message.
        if self.is_server_error() {
            tracing::error!(category = %self.category(), error = %self, "Request failed");
        }

        let (status, message) = error_details(&self);

        let body = json!({
            "message": message,
        });

        // Add WWW-Authenticate header for 401 responses
        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_CHALLENGE),
            );
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Extracts response details from an `AuthError`.
///
/// Returns (HTTP status, client-facing message). Expired and malformed
/// tokens map to the same response so a caller cannot distinguish them.
fn error_details(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::InvalidCredentials => (
            StatusCode::BAD_REQUEST,
            "Invalid username or password".to_string(),
        ),
        AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "No token provided".to_string()),
        AuthError::MalformedToken { .. } => (StatusCode::FORBIDDEN, "Invalid token".to_string()),
        AuthError::ExpiredToken => (StatusCode::FORBIDDEN, "Invalid token".to_string()),
        AuthError::RevokedToken => (
            StatusCode::FORBIDDEN,
            "Token has been revoked".to_string(),
        ),
        AuthError::InsufficientPrivilege => (
            StatusCode::FORBIDDEN,
            "Admin access required".to_string(),
        ),
        AuthError::DependencyUnavailable { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
        AuthError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
        AuthError::Conflict { message } => (StatusCode::CONFLICT, message.clone()),
        AuthError::InvalidRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
        AuthError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_response() {
        let response = AuthError::MissingToken.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("Bearer"));
        assert!(www_auth.contains("realm=\"keygate\""));

        let json = body_json(response).await;
        assert_eq!(json["message"], "No token provided");
    }

    #[tokio::test]
    async fn test_malformed_token_response() {
        let response = AuthError::malformed_token("signature mismatch").into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));

        let json = body_json(response).await;
        assert_eq!(json["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_expired_token_indistinguishable_from_malformed() {
        let expired = body_json(AuthError::ExpiredToken.into_response()).await;
        let malformed = body_json(AuthError::malformed_token("bad header").into_response()).await;

        assert_eq!(expired, malformed);
    }

    #[tokio::test]
    async fn test_revoked_token_response() {
        let response = AuthError::RevokedToken.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Token has been revoked");
    }

    #[tokio::test]
    async fn test_insufficient_privilege_response() {
        let response = AuthError::InsufficientPrivilege.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Admin access required");
    }

    #[tokio::test]
    async fn test_invalid_credentials_response() {
        let response = AuthError::InvalidCredentials.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Invalid username or password");
    }

    #[tokio::test]
    async fn test_dependency_unavailable_hides_cause() {
        let response =
            AuthError::dependency_unavailable("redis connection refused").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Internal server error");
        assert!(!json.to_string().contains("redis"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = AuthError::internal("stored hash is not valid PHC").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = AuthError::not_found("User not found").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["message"], "User not found");
    }

    #[tokio::test]
    async fn test_conflict_response() {
        let response = AuthError::conflict("Username already exists").into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let json = body_json(response).await;
        assert_eq!(json["message"], "Username already exists");
    }

    #[tokio::test]
    async fn test_response_content_type_is_json() {
        let response = AuthError::InvalidCredentials.into_response();

        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
