//! Session token claims.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Default session validity window: 7 days.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

// ============================================================================
// Claims
// ============================================================================

/// Claims embedded in a session token.
///
/// Immutable once issued. The `jti` claim is the registry key for liveness;
/// everything else is identity data the guards attach to the request context
/// without a store round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Issuer (this service).
    pub iss: String,

    /// Subject: the user's stable integer identity.
    pub sub: i64,

    /// Username at issuance time.
    pub username: String,

    /// Display name at issuance time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Administrative privilege flag.
    pub is_admin: bool,

    /// Group classification (0 = default).
    pub group: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Token identifier (unique per issuance, UUID v4).
    pub jti: String,
}

impl SessionClaims {
    /// Creates a new builder for session claims.
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        subject: i64,
        username: impl Into<String>,
    ) -> SessionClaimsBuilder {
        SessionClaimsBuilder::new(issuer, subject, username)
    }

    /// Returns the token's expiry as an [`OffsetDateTime`].
    ///
    /// # Errors
    ///
    /// Returns an error if the `exp` claim is outside the representable range.
    pub fn expires_at(&self) -> Result<OffsetDateTime, time::error::ComponentRange> {
        OffsetDateTime::from_unix_timestamp(self.exp)
    }

    /// Returns `true` if the token's expiry is in the past.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < OffsetDateTime::now_utc().unix_timestamp()
    }
}

/// Builder for [`SessionClaims`].
pub struct SessionClaimsBuilder {
    iss: String,
    sub: i64,
    username: String,
    display_name: Option<String>,
    is_admin: bool,
    group: i64,
    exp: i64,
    iat: i64,
    jti: String,
}

impl SessionClaimsBuilder {
    fn new(issuer: impl Into<String>, subject: i64, username: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: subject,
            username: username.into(),
            display_name: None,
            is_admin: false,
            group: 0,
            exp: now + DEFAULT_SESSION_TTL_SECS,
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the admin flag.
    #[must_use]
    pub fn admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Sets the group classification.
    #[must_use]
    pub fn group(mut self, group: i64) -> Self {
        self.group = group;
        self
    }

    /// Sets the expiration time in seconds from issuance.
    #[must_use]
    pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
        self.exp = self.iat + seconds;
        self
    }

    /// Builds the session claims.
    #[must_use]
    pub fn build(self) -> SessionClaims {
        SessionClaims {
            iss: self.iss,
            sub: self.sub,
            username: self.username,
            display_name: self.display_name,
            is_admin: self.is_admin,
            group: self.group,
            exp: self.exp,
            iat: self.iat,
            jti: self.jti,
        }
    }
}
