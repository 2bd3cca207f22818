//! Process-local storage implementations.
//!
//! Backs the session registry and the user store with [`DashMap`]s for
//! single-instance deployments and tests. Registry state lives in process
//! memory and is lost on restart, which also invalidates nothing: tokens
//! are only valid while their registry entry exists, so a restart logs
//! everyone out.
//!
//! Multi-instance deployments need the shared Redis registry instead; each
//! instance of this registry only sees its own revocations.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{NewUser, SessionRegistry, User, UserStorage};

/// A liveness entry with its expiry deadline.
#[derive(Debug, Clone, Copy)]
struct LiveEntry {
    expires_at: Instant,
}

impl LiveEntry {
    fn new(ttl: Duration) -> Self {
        Self {
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`SessionRegistry`] implementation.
///
/// Expired entries are dropped lazily on lookup; the per-user index is
/// claimed atomically by bulk revocation, so two concurrent bulk revokes
/// for the same user resolve to one doing the work and the other seeing
/// no active sessions. Bulk revocation sweeps inside a write gate that
/// every liveness check enters for read, so a concurrent check observes a
/// user's sessions either all live or all revoked, never a partial sweep.
#[derive(Debug, Default)]
pub struct MemorySessionRegistry {
    entries: DashMap<String, LiveEntry>,
    index: DashMap<i64, HashSet<String>>,
    bulk_gate: RwLock<()>,
}

impl MemorySessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn register(&self, user_id: i64, token_id: &str, ttl: Duration) -> AuthResult<()> {
        self.entries.insert(token_id.to_string(), LiveEntry::new(ttl));
        self.index
            .entry(user_id)
            .or_default()
            .insert(token_id.to_string());
        Ok(())
    }

    async fn is_live(&self, token_id: &str) -> AuthResult<bool> {
        let _gate = self.bulk_gate.read().await;
        if let Some(entry) = self.entries.get(token_id) {
            if !entry.is_expired() {
                return Ok(true);
            }
            drop(entry);
            self.entries.remove(token_id);
        }
        Ok(false)
    }

    async fn revoke(&self, token_id: &str) -> AuthResult<()> {
        self.entries.remove(token_id);
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> AuthResult<u64> {
        // Liveness checks wait out the whole sweep behind the write gate
        let _gate = self.bulk_gate.write().await;

        // Removing the index claims the whole fan-out set in one step
        let Some((_, members)) = self.index.remove(&user_id) else {
            return Ok(0);
        };

        for token_id in &members {
            self.entries.remove(token_id);
        }
        Ok(members.len() as u64)
    }
}

/// In-memory [`UserStorage`] implementation.
///
/// Assigns sequential ids starting at 1, like a fresh relational store.
#[derive(Debug)]
pub struct MemoryUserStorage {
    users: DashMap<i64, User>,
    next_id: AtomicI64,
}

impl MemoryUserStorage {
    /// Creates an empty user store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryUserStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.clone()))
    }

    async fn find_any_admin(&self) -> AuthResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.is_admin).map(|u| u.clone()))
    }

    async fn insert(&self, user: &NewUser) -> AuthResult<User> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::conflict("Username already exists"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = User {
            id,
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            display_name: user.display_name.clone(),
            is_admin: user.is_admin,
            group: user.group,
        };
        self.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> AuthResult<()> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AuthError::not_found("User not found"))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn delete(&self, user_id: i64) -> AuthResult<()> {
        self.users
            .remove(&user_id)
            .map(|_| ())
            .ok_or_else(|| AuthError::not_found("User not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_register_then_live() {
        let registry = MemorySessionRegistry::new();
        registry.register(1, "jti-a", TTL).await.unwrap();
        assert!(registry.is_live("jti-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_token_not_live() {
        let registry = MemorySessionRegistry::new();
        assert!(!registry.is_live("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_kills_token() {
        let registry = MemorySessionRegistry::new();
        registry.register(1, "jti-a", TTL).await.unwrap();
        registry.revoke("jti-a").await.unwrap();
        assert!(!registry.is_live("jti-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let registry = MemorySessionRegistry::new();
        registry.register(1, "jti-a", TTL).await.unwrap();
        registry.revoke("jti-a").await.unwrap();
        registry.revoke("jti-a").await.unwrap();
        assert!(!registry.is_live("jti-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_entry_not_live() {
        let registry = MemorySessionRegistry::new();
        registry
            .register(1, "jti-a", Duration::from_secs(0))
            .await
            .unwrap();
        assert!(!registry.is_live("jti-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_all_kills_every_token() {
        let registry = MemorySessionRegistry::new();
        registry.register(7, "jti-a", TTL).await.unwrap();
        registry.register(7, "jti-b", TTL).await.unwrap();
        registry.register(9, "jti-c", TTL).await.unwrap();

        let revoked = registry.revoke_all_for_user(7).await.unwrap();
        assert_eq!(revoked, 2);

        assert!(!registry.is_live("jti-a").await.unwrap());
        assert!(!registry.is_live("jti-b").await.unwrap());
        // Other users are untouched
        assert!(registry.is_live("jti-c").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_all_without_sessions() {
        let registry = MemorySessionRegistry::new();
        assert_eq!(registry.revoke_all_for_user(7).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_revoke_all_is_never_observed_half_done() {
        let registry = Arc::new(MemorySessionRegistry::new());

        for round in 0..100 {
            let first = format!("jti-first-{round}");
            let second = format!("jti-second-{round}");
            registry.register(3, &first, TTL).await.unwrap();
            registry.register(3, &second, TTL).await.unwrap();

            let sweeper = {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.revoke_all_for_user(3).await.unwrap() })
            };

            // The sweep is all-or-nothing: the moment one token reads dead,
            // its sibling must read dead as well
            loop {
                if !registry.is_live(&first).await.unwrap() {
                    assert!(
                        !registry.is_live(&second).await.unwrap(),
                        "bulk revocation left a sibling token live"
                    );
                    break;
                }
            }

            assert_eq!(sweeper.await.unwrap(), 2);
        }
    }

    #[tokio::test]
    async fn test_fresh_login_after_revoke_all() {
        let registry = MemorySessionRegistry::new();
        registry.register(7, "jti-a", TTL).await.unwrap();
        registry.revoke_all_for_user(7).await.unwrap();

        registry.register(7, "jti-new", TTL).await.unwrap();
        assert!(registry.is_live("jti-new").await.unwrap());
        assert!(!registry.is_live("jti-a").await.unwrap());
        assert_eq!(registry.revoke_all_for_user(7).await.unwrap(), 1);
    }

    fn new_user(username: &str, is_admin: bool) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            display_name: None,
            is_admin,
            group: 0,
        }
    }

    #[tokio::test]
    async fn test_user_store_insert_assigns_sequential_ids() {
        let users = MemoryUserStorage::new();
        let alice = users.insert(&new_user("alice", false)).await.unwrap();
        let bob = users.insert(&new_user("bob", false)).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(
            users.find_by_username("bob").await.unwrap().unwrap().id,
            bob.id
        );
    }

    #[tokio::test]
    async fn test_user_store_duplicate_username_conflicts() {
        let users = MemoryUserStorage::new();
        users.insert(&new_user("alice", false)).await.unwrap();

        let err = users.insert(&new_user("alice", true)).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_user_store_find_any_admin() {
        let users = MemoryUserStorage::new();
        assert!(users.find_any_admin().await.unwrap().is_none());

        users.insert(&new_user("alice", false)).await.unwrap();
        users.insert(&new_user("root", true)).await.unwrap();

        let admin = users.find_any_admin().await.unwrap().unwrap();
        assert_eq!(admin.username, "root");
    }

    #[tokio::test]
    async fn test_user_store_update_and_delete() {
        let users = MemoryUserStorage::new();
        let alice = users.insert(&new_user("alice", false)).await.unwrap();

        users
            .update_password_hash(alice.id, "$argon2id$other")
            .await
            .unwrap();
        let stored = users.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "$argon2id$other");

        users.delete(alice.id).await.unwrap();
        assert!(users.find_by_id(alice.id).await.unwrap().is_none());

        let err = users.delete(alice.id).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }
}
