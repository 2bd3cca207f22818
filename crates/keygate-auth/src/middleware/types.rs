//! Authentication context types.

use std::sync::Arc;

use crate::token::SessionClaims;

/// Authenticated request context.
///
/// Extracted from requests by the `BearerAuth` extractor once the token's
/// signature, expiry, and registry liveness have all been verified. The
/// claims are wrapped in `Arc` for cheap cloning across async boundaries.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Validated session token claims.
    pub claims: Arc<SessionClaims>,
}

impl AuthContext {
    /// Creates a context from validated claims.
    #[must_use]
    pub fn new(claims: SessionClaims) -> Self {
        Self {
            claims: Arc::new(claims),
        }
    }

    /// The authenticated user's stable identity.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.claims.sub
    }

    /// The authenticated user's username at issuance time.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.claims.username
    }

    /// The identifier of the session token backing this context.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }

    /// Whether the token carries administrative privileges.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.claims.is_admin
    }
}
