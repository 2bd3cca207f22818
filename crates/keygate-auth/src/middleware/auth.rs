//! Bearer token authentication extractor.
//!
//! This module provides the Axum extractor that gates every protected
//! endpoint: it validates the Bearer token's signature and expiry, then
//! confirms the token is still live in the session registry. Registry
//! unavailability is a rejection, never a pass.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use keygate_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(auth): BearerAuth) -> String {
//!     format!("Hello, {}!", auth.username())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::storage::SessionRegistry;
use crate::token::{JwtService, SessionClaims};

use super::types::AuthContext;

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token authentication.
///
/// Include this in your application state and make it available to the
/// `BearerAuth` extractor via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,

    /// Session registry for liveness checks.
    pub registry: Arc<dyn SessionRegistry>,
}

impl AuthState {
    /// Creates a new auth state.
    pub fn new(jwt_service: Arc<JwtService>, registry: Arc<dyn SessionRegistry>) -> Self {
        Self {
            jwt_service,
            registry,
        }
    }
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that validates Bearer tokens and extracts auth context.
///
/// This extractor:
/// 1. Extracts the `Authorization: Bearer <token>` header
/// 2. Verifies the JWT signature and issuer
/// 3. Rejects expired tokens
/// 4. Confirms the token identifier is live in the session registry
///
/// Signature and expiry failures surface the same rejection to the caller;
/// the distinction is only logged.
///
/// # Errors
///
/// Returns `AuthError` (which implements `IntoResponse`) if the header is
/// missing, the token is invalid, expired, or revoked, or the registry is
/// unreachable.
#[derive(Debug)]
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        // 1. Extract the Bearer token from the Authorization header
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        // 2. Verify signature, issuer, and expiry
        let claims = auth_state
            .jwt_service
            .decode::<SessionClaims>(token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Failed to validate token");
                AuthError::from(e)
            })?
            .claims;

        // 3. Re-check expiry without the decoder's leeway; registry TTL and
        //    claim expiry must agree at the boundary
        if claims.is_expired() {
            tracing::debug!(jti = %claims.jti, "Token expired");
            return Err(AuthError::ExpiredToken);
        }

        // 4. A token without an identifier cannot be checked for liveness
        if claims.jti.is_empty() {
            return Err(AuthError::malformed_token("Token has no identifier"));
        }

        // 5. Liveness check. A registry error propagates as-is: an
        //    unreachable registry must reject, never pass
        if !auth_state.registry.is_live(&claims.jti).await? {
            tracing::debug!(jti = %claims.jti, "Token revoked");
            return Err(AuthError::RevokedToken);
        }

        Ok(BearerAuth(AuthContext::new(claims)))
    }
}

// =============================================================================
// Tests
// =============================================================================
