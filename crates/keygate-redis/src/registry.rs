//! Redis-backed session registry.
//!
//! # Key Layout
//!
//! - `token:<jti>` holds the string `"valid"` with a TTL matching the
//!   token's validity window
//! - `user:<id>:tokens` is a set of token identifiers issued to a user,
//!   read only by bulk revocation
//!
//! Natural expiry needs no cleanup job: Redis drops the liveness entry when
//! its TTL lapses. The matching index member goes stale, which is harmless
//! because bulk revocation deletes absent entries as a no-op.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use keygate_auth::{AuthError, AuthResult, SessionRegistry};

/// Value stored under a live token's key.
const TOKEN_LIVE_VALUE: &str = "valid";

/// Builds the liveness key for a token identifier.
fn token_key(token_id: &str) -> String {
    format!("token:{token_id}")
}

/// Builds the per-user index key.
fn user_tokens_key(user_id: i64) -> String {
    format!("user:{user_id}:tokens")
}

// =============================================================================
// Redis Session Registry
// =============================================================================

/// Shared session registry backed by Redis.
#[derive(Clone)]
pub struct RedisSessionRegistry {
    pool: Pool,
}

impl RedisSessionRegistry {
    /// Create a registry from an existing connection pool.
    #[must_use]
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a registry by connecting to the given Redis URL.
    ///
    /// Verifies connectivity with a PING before returning. The registry is
    /// the source of truth for session liveness, so an unreachable Redis
    /// must surface at startup instead of failing every login later.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or Redis does not
    /// answer the PING.
    pub async fn connect(url: &str, pool_size: usize, timeout_ms: u64) -> AuthResult<Self> {
        let mut redis_config = deadpool_redis::Config::from_url(url);
        let mut pool_config = redis_config.pool.take().unwrap_or_default();
        pool_config.max_size = pool_size;
        pool_config.timeouts.wait = Some(Duration::from_millis(timeout_ms));
        pool_config.timeouts.create = Some(Duration::from_millis(timeout_ms));
        pool_config.timeouts.recycle = Some(Duration::from_millis(timeout_ms));
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| {
                AuthError::dependency_unavailable(format!("Failed to create Redis pool: {e}"))
            })?;

        let mut conn = pool.get().await.map_err(|e| {
            AuthError::dependency_unavailable(format!("Failed to connect to Redis: {e}"))
        })?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::dependency_unavailable(format!("Redis PING failed: {e}")))?;

        Ok(Self { pool })
    }

    async fn conn(&self) -> AuthResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(|e| {
            AuthError::dependency_unavailable(format!("Failed to get Redis connection: {e}"))
        })
    }
}

#[async_trait]
impl SessionRegistry for RedisSessionRegistry {
    async fn register(&self, user_id: i64, token_id: &str, ttl: Duration) -> AuthResult<()> {
        let mut conn = self.conn().await?;

        // SETEX rejects a zero TTL; clamp up to one second.
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(token_key(token_id), TOKEN_LIVE_VALUE, ttl_secs)
            .await
            .map_err(|e| AuthError::dependency_unavailable(format!("Redis SETEX failed: {e}")))?;
        conn.sadd::<_, _, ()>(user_tokens_key(user_id), token_id)
            .await
            .map_err(|e| AuthError::dependency_unavailable(format!("Redis SADD failed: {e}")))?;

        Ok(())
    }

    async fn is_live(&self, token_id: &str) -> AuthResult<bool> {
        let mut conn = self.conn().await?;

        let value: Option<String> = conn
            .get(token_key(token_id))
            .await
            .map_err(|e| AuthError::dependency_unavailable(format!("Redis GET failed: {e}")))?;

        Ok(value.as_deref() == Some(TOKEN_LIVE_VALUE))
    }

    async fn revoke(&self, token_id: &str) -> AuthResult<()> {
        let mut conn = self.conn().await?;

        // DEL of an absent key is a no-op, which makes revocation idempotent.
        conn.del::<_, ()>(token_key(token_id))
            .await
            .map_err(|e| AuthError::dependency_unavailable(format!("Redis DEL failed: {e}")))?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> AuthResult<u64> {
        let mut conn = self.conn().await?;
        let index_key = user_tokens_key(user_id);

        let members: Vec<String> = conn.smembers(&index_key).await.map_err(|e| {
            AuthError::dependency_unavailable(format!("Redis SMEMBERS failed: {e}"))
        })?;

        if members.is_empty() {
            return Ok(0);
        }

        // MULTI/EXEC so a concurrent liveness check never observes a
        // half-revoked user.
        let mut pipe = redis::pipe();
        pipe.atomic();
        for token_id in &members {
            pipe.del(token_key(token_id));
        }
        pipe.del(&index_key);

        let () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::dependency_unavailable(format!("Redis EXEC failed: {e}")))?;

        tracing::debug!(user_id, revoked = members.len(), "Bulk revoked session tokens");

        Ok(members.len() as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key_format() {
        assert_eq!(token_key("abc-123"), "token:abc-123");
    }

    #[test]
    fn test_user_tokens_key_format() {
        assert_eq!(user_tokens_key(42), "user:42:tokens");
    }
}
