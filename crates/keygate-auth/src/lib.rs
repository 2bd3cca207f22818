//! # keygate-auth
//!
//! Session authentication core for the Keygate server.
//!
//! This crate provides:
//! - Stateless HS256-signed session tokens with embedded identity claims
//! - A revocation registry that is the source of truth for session liveness
//! - Session issuance (credential check, signing, registration, audit)
//! - Session revocation (logout, administrative bulk revocation, password change)
//! - Axum extractors for bearer and admin authentication
//!
//! ## Overview
//!
//! A token by itself is never enough: its signature and expiry prove what the
//! server once said, while the revocation registry decides whether the session
//! is still alive right now. Deleting a registry entry kills the session
//! without touching the client-held token.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy shared across the crate
//! - [`middleware`] - Axum extractors and error responses
//! - [`password`] - Argon2 password hashing and verification
//! - [`session`] - Session issuance and revocation services
//! - [`storage`] - Storage traits plus in-memory implementations
//! - [`token`] - Claims, signing, and verification

pub mod error;
pub mod middleware;
pub mod password;
pub mod session;
pub mod storage;
pub mod token;

pub use error::{AuthError, ErrorCategory};
pub use middleware::{AdminAuth, AuthContext, AuthState, BearerAuth};
pub use password::{hash_password, verify_password, verify_password_dummy};
pub use session::{IssuedSession, RevocationService, SessionConfig, SessionIssuer};
pub use storage::{
    LoginAuditStorage, LoginEvent, MemorySessionRegistry, MemoryUserStorage, ModelUsage,
    NewUsageEvent, NewUser, SessionRegistry, UsageEvent, UsageStorage, User, UserModelUsage,
    UserStorage, UserUsageDetail,
};
pub use token::{DEFAULT_SESSION_TTL_SECS, JwtError, JwtService, SessionClaims};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use keygate_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::middleware::{AdminAuth, AuthContext, AuthState, BearerAuth};
    pub use crate::session::{IssuedSession, RevocationService, SessionConfig, SessionIssuer};
    pub use crate::storage::{
        LoginAuditStorage, LoginEvent, MemorySessionRegistry, MemoryUserStorage, SessionRegistry,
        UsageStorage, UserStorage,
    };
    pub use crate::token::{DEFAULT_SESSION_TTL_SECS, JwtService, SessionClaims};
}
