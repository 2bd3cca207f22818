//! Session revocation.
//!
//! Ends sessions before their natural expiry. Single logout deletes one
//! registry entry; bulk revocation fans out over the user's token index in
//! one atomic batch; a password change bulk-revokes unconditionally so no
//! session issued under the old credential survives.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password;
use crate::storage::{SessionRegistry, UserStorage};

/// Service for ending sessions.
pub struct RevocationService {
    /// Liveness registry for issued tokens.
    registry: Arc<dyn SessionRegistry>,

    /// Credential store, needed for the password-change flow.
    users: Arc<dyn UserStorage>,
}

impl RevocationService {
    /// Creates a new revocation service.
    #[must_use]
    pub fn new(registry: Arc<dyn SessionRegistry>, users: Arc<dyn UserStorage>) -> Self {
        Self { registry, users }
    }

    /// Revokes a single session by its token identifier.
    ///
    /// Idempotent: logging out an already-revoked session succeeds.
    ///
    /// # Errors
    ///
    /// Returns a `DependencyUnavailable` error if the registry cannot be
    /// reached.
    pub async fn logout(&self, token_id: &str) -> AuthResult<()> {
        self.registry.revoke(token_id).await
    }

    /// Revokes every session of the given user.
    ///
    /// Returns the number of token identifiers that were in the user's
    /// index; zero means the user had no active sessions, which is a
    /// success, not an error.
    ///
    /// # Errors
    ///
    /// Returns a `DependencyUnavailable` error if the registry cannot be
    /// reached or the batch fails.
    pub async fn revoke_all(&self, user_id: i64) -> AuthResult<u64> {
        self.registry.revoke_all_for_user(user_id).await
    }

    /// Changes a user's password and revokes all of their sessions.
    ///
    /// The old password must verify against the stored hash. After the new
    /// hash is durably written, every session issued under the old
    /// credential is bulk-revoked; a failure of that revocation is logged
    /// but does not undo the already-completed password change.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user no longer exists,
    /// `InvalidCredentials` if the old password is wrong, or a
    /// `DependencyUnavailable` error if the credential store cannot be
    /// reached.
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        // 1. The user must still exist.
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("User not found"))?;

        // 2. Verify the old password.
        let old_matches = password::verify_password(old_password, &user.password_hash)
            .map_err(|e| AuthError::internal(format!("Stored password hash is invalid: {e}")))?;
        if !old_matches {
            return Err(AuthError::InvalidCredentials);
        }

        // 3. Hash and store the new password.
        let new_hash = password::hash_password(new_password)
            .map_err(|e| AuthError::internal(format!("Failed to hash password: {e}")))?;
        self.users.update_password_hash(user_id, &new_hash).await?;

        // 4. Revoke every session issued under the old credential. The
        //    password change is already durable at this point, so a registry
        //    failure is logged rather than surfaced.
        match self.registry.revoke_all_for_user(user_id).await {
            Ok(revoked) => {
                tracing::info!(user_id, revoked, "Revoked sessions after password change");
            }
            Err(e) => {
                tracing::error!(
                    user_id,
                    error = %e,
                    "Failed to revoke sessions after password change"
                );
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySessionRegistry, MemoryUserStorage, NewUser};
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(60);

    /// Builds a user store holding one non-admin user; first insert gets id 1.
    async fn user_store_with(username: &str, password: &str) -> Arc<MemoryUserStorage> {
        let users = MemoryUserStorage::new();
        users
            .insert(&NewUser {
                username: username.to_string(),
                password_hash: password::hash_password(password).unwrap(),
                display_name: None,
                is_admin: false,
                group: 0,
            })
            .await
            .unwrap();
        Arc::new(users)
    }

    async fn password_hash_of(users: &MemoryUserStorage, id: i64) -> String {
        users.find_by_id(id).await.unwrap().unwrap().password_hash
    }

    /// Registry whose bulk revocation always fails.
    struct BulkFailRegistry {
        inner: MemorySessionRegistry,
    }

    #[async_trait::async_trait]
    impl SessionRegistry for BulkFailRegistry {
        async fn register(&self, user_id: i64, token_id: &str, ttl: Duration) -> AuthResult<()> {
            self.inner.register(user_id, token_id, ttl).await
        }

        async fn is_live(&self, token_id: &str) -> AuthResult<bool> {
            self.inner.is_live(token_id).await
        }

        async fn revoke(&self, token_id: &str) -> AuthResult<()> {
            self.inner.revoke(token_id).await
        }

        async fn revoke_all_for_user(&self, _user_id: i64) -> AuthResult<u64> {
            Err(AuthError::dependency_unavailable("Registry unreachable"))
        }
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = Arc::new(MemoryUserStorage::new());
        let service = RevocationService::new(registry.clone(), users);

        registry.register(1, "jti-a", TTL).await.unwrap();
        service.logout("jti-a").await.unwrap();
        assert!(!registry.is_live("jti-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_twice_succeeds() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = Arc::new(MemoryUserStorage::new());
        let service = RevocationService::new(registry.clone(), users);

        registry.register(1, "jti-a", TTL).await.unwrap();
        service.logout("jti-a").await.unwrap();
        service.logout("jti-a").await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_all_ends_every_session() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = Arc::new(MemoryUserStorage::new());
        let service = RevocationService::new(registry.clone(), users);

        registry.register(7, "jti-a", TTL).await.unwrap();
        registry.register(7, "jti-b", TTL).await.unwrap();

        assert_eq!(service.revoke_all(7).await.unwrap(), 2);
        assert!(!registry.is_live("jti-a").await.unwrap());
        assert!(!registry.is_live("jti-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_all_with_no_sessions_is_success() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = Arc::new(MemoryUserStorage::new());
        let service = RevocationService::new(registry, users);

        assert_eq!(service.revoke_all(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_change_password_revokes_sessions() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = user_store_with("alice", "old-secret").await;
        let service = RevocationService::new(registry.clone(), users.clone());

        registry.register(1, "jti-a", TTL).await.unwrap();
        registry.register(1, "jti-b", TTL).await.unwrap();

        service
            .change_password(1, "old-secret", "new-secret")
            .await
            .unwrap();

        let new_hash = password_hash_of(&users, 1).await;
        assert!(password::verify_password("new-secret", &new_hash).unwrap());
        assert!(!password::verify_password("old-secret", &new_hash).unwrap());
        assert!(!registry.is_live("jti-a").await.unwrap());
        assert!(!registry.is_live("jti-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_change_password_wrong_old_password() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = user_store_with("alice", "old-secret").await;
        let service = RevocationService::new(registry.clone(), users.clone());

        registry.register(1, "jti-a", TTL).await.unwrap();

        let err = service
            .change_password(1, "not-the-password", "new-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // Neither the hash nor the sessions changed
        let hash = password_hash_of(&users, 1).await;
        assert!(password::verify_password("old-secret", &hash).unwrap());
        assert!(registry.is_live("jti-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let registry = Arc::new(MemorySessionRegistry::new());
        let users = Arc::new(MemoryUserStorage::new());
        let service = RevocationService::new(registry, users);

        let err = service
            .change_password(99, "old", "new")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_change_password_survives_revocation_failure() {
        let registry = Arc::new(BulkFailRegistry {
            inner: MemorySessionRegistry::new(),
        });
        let users = user_store_with("alice", "old-secret").await;
        let service = RevocationService::new(registry, users.clone());

        // The password change itself must still succeed
        service
            .change_password(1, "old-secret", "new-secret")
            .await
            .unwrap();
        let hash = password_hash_of(&users, 1).await;
        assert!(password::verify_password("new-secret", &hash).unwrap());
    }
}
