//! Session issuance.
//!
//! The issuer authenticates a username/password pair against the credential
//! store, produces a signed session token, and registers the token's
//! identifier as live. The registry write completes before the token is
//! handed back, so the very next request with that token passes the
//! liveness check.
//!
//! # Security Considerations
//!
//! - Unknown username and wrong password return the same error, and the
//!   unknown-username path still performs a full hash verification so the
//!   two cases are not distinguishable by timing
//! - A token is never returned if its registry entry could not be written
//! - Audit write failures are logged but never fail the login

use std::sync::Arc;

use time::Duration;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password;
use crate::storage::{LoginAuditStorage, SessionRegistry, UserStorage};
use crate::token::{JwtService, SessionClaims};

/// Configuration for session issuance.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Issuer name embedded in tokens as `iss` and required on decode.
    pub issuer: String,

    /// Session validity window. Applied to both the token's `exp` claim
    /// and the registry entry's TTL so the two expire together.
    pub token_ttl: Duration,
}

impl SessionConfig {
    /// Creates a configuration with the default 7-day validity window.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            token_ttl: Duration::days(7),
        }
    }

    /// Sets the session validity window.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The signed token to hand to the client.
    pub token: String,

    /// The claims embedded in the token.
    pub claims: SessionClaims,
}

/// Service that authenticates users and issues session tokens.
pub struct SessionIssuer {
    /// JWT service for signing tokens.
    jwt_service: Arc<JwtService>,

    /// Credential store.
    users: Arc<dyn UserStorage>,

    /// Liveness registry for issued tokens.
    registry: Arc<dyn SessionRegistry>,

    /// Login audit trail.
    audit: Arc<dyn LoginAuditStorage>,

    /// Issuance configuration.
    config: SessionConfig,
}

impl SessionIssuer {
    /// Creates a new session issuer.
    #[must_use]
    pub fn new(
        jwt_service: Arc<JwtService>,
        users: Arc<dyn UserStorage>,
        registry: Arc<dyn SessionRegistry>,
        audit: Arc<dyn LoginAuditStorage>,
        config: SessionConfig,
    ) -> Self {
        Self {
            jwt_service,
            users,
            registry,
            audit,
            config,
        }
    }

    /// Authenticates the given credentials and issues a session token.
    ///
    /// On success the token's identifier is live in the registry before
    /// this method returns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the username is unknown or the
    /// password is wrong (the two are indistinguishable to the caller),
    /// or a `DependencyUnavailable` error if the credential store or the
    /// registry cannot be reached.
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<IssuedSession> {
        // 1. Look up the user. On an unknown username, burn the same hash
        //    work a real verification would before rejecting.
        let Some(user) = self.users.find_by_username(username).await? else {
            password::verify_password_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        // 2. Verify the password against the stored hash.
        let password_matches = password::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::internal(format!("Stored password hash is invalid: {e}")))?;
        if !password_matches {
            return Err(AuthError::InvalidCredentials);
        }

        // 3. Build and sign the claims.
        let ttl_seconds = self.config.token_ttl.whole_seconds();
        let mut builder = SessionClaims::builder(&self.config.issuer, user.id, &user.username)
            .admin(user.is_admin)
            .group(user.group)
            .expires_in_seconds(ttl_seconds);
        if let Some(name) = &user.display_name {
            builder = builder.display_name(name);
        }
        let claims = builder.build();
        let token = self.jwt_service.encode(&claims)?;

        // 4. Register the token as live. Must complete before the token is
        //    returned, and a failure here means no token is issued at all.
        let ttl = std::time::Duration::from_secs(ttl_seconds.max(0) as u64);
        self.registry.register(user.id, &claims.jti, ttl).await?;

        // 5. Record the login. Fire-and-forget: failures are logged only.
        if let Err(e) = self.audit.record_login(user.id, &user.username).await {
            tracing::warn!(
                user_id = user.id,
                username = %user.username,
                error = %e,
                "Failed to record login audit event"
            );
        }

        Ok(IssuedSession { token, claims })
    }

    /// Gets the issuance configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
