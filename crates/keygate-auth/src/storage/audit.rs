//! Login audit storage trait.
//!
//! Records successful logins for audit purposes. Audit writes are
//! fire-and-forget relative to the login response: a failed write is
//! logged by the caller but never fails the login itself.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;

/// A recorded login.
#[derive(Debug, Clone)]
pub struct LoginEvent {
    pub user_id: i64,
    pub username: String,
    pub logged_in_at: OffsetDateTime,
}

/// Storage operations for the login audit trail.
#[async_trait]
pub trait LoginAuditStorage: Send + Sync {
    /// Record a successful login at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails. Callers log the
    /// failure and proceed; the login must still succeed.
    async fn record_login(&self, user_id: i64, username: &str) -> AuthResult<()>;
}
