//! Admin authentication extractor.
//!
//! Runs strictly after bearer authentication: the privilege check is a pure
//! function of the already-validated claims, with no storage access of its
//! own.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::post, Json};
//! use keygate_auth::middleware::AdminAuth;
//!
//! async fn admin_handler(AdminAuth(auth): AdminAuth) -> Json<String> {
//!     Json(format!("Hello admin: {}!", auth.username()))
//! }
//!
//! let app = Router::new()
//!     .route("/admin", post(admin_handler))
//!     .with_state(auth_state);
//! ```

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::error::AuthError;

use super::auth::{AuthState, BearerAuth};
use super::types::AuthContext;

/// Axum extractor that validates Bearer tokens and requires admin privilege.
///
/// # Errors
///
/// Returns the underlying `BearerAuth` rejection for invalid tokens, or
/// `InsufficientPrivilege` when the token's admin claim is false.
#[derive(Debug)]
pub struct AdminAuth(pub AuthContext);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // 1. Extract and validate the Bearer token
        let BearerAuth(auth) = BearerAuth::from_request_parts(parts, state).await?;

        // 2. Check the admin claim
        if !auth.is_admin() {
            tracing::debug!(
                user_id = auth.user_id(),
                username = %auth.username(),
                "Admin access denied"
            );
            return Err(AuthError::InsufficientPrivilege);
        }

        Ok(Self(auth))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySessionRegistry, SessionRegistry};
    use crate::token::{JwtService, SessionClaims};
    use axum::http::{Request, header::AUTHORIZATION};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_state(registry: Arc<dyn SessionRegistry>) -> AuthState {
        AuthState::new(
            Arc::new(JwtService::new(b"admin-test-secret-32-bytes-long!!!", "keygate-test")),
            registry,
        )
    }

    async fn parts_for(state: &AuthState, is_admin: bool) -> Parts {
        let claims = SessionClaims::builder("keygate-test", 1, "alice")
            .admin(is_admin)
            .build();
        let token = state.jwt_service.encode(&claims).unwrap();
        state
            .registry
            .register(1, &claims.jti, Duration::from_secs(3600))
            .await
            .unwrap();

        let (parts, ()) = Request::builder()
            .uri("/admin")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[tokio::test]
    async fn test_admin_token_accepted() {
        let state = test_state(Arc::new(MemorySessionRegistry::new()));
        let mut parts = parts_for(&state, true).await;

        let AdminAuth(ctx) = AdminAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(ctx.is_admin());
        assert_eq!(ctx.username(), "alice");
    }

    #[tokio::test]
    async fn test_non_admin_token_rejected() {
        let state = test_state(Arc::new(MemorySessionRegistry::new()));
        let mut parts = parts_for(&state, false).await;

        let err = AdminAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InsufficientPrivilege));
    }

    #[tokio::test]
    async fn test_missing_token_rejected_before_privilege_check() {
        let state = test_state(Arc::new(MemorySessionRegistry::new()));
        let (mut parts, ()) = Request::builder()
            .uri("/admin")
            .body(())
            .unwrap()
            .into_parts();

        let err = AdminAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }
}
