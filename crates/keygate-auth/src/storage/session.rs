//! Session registry trait.
//!
//! The registry is the authoritative liveness state for issued session
//! tokens. A token identifier is valid iff its registry entry is present;
//! absence means the token was revoked or has naturally expired. Entries
//! carry a TTL matching the token's validity window, which bounds registry
//! growth without any cleanup job.
//!
//! Alongside the per-token entries, the registry maintains a per-user index
//! of issued token identifiers. The index exists only to fan out bulk
//! revocation; single-token liveness checks never consult it, so it may
//! transiently contain identifiers whose entries have already expired.
//!
//! # Security Considerations
//!
//! - Implementations must propagate infrastructure failures as errors;
//!   callers treat an unreachable registry as a rejection, never as "valid"
//! - Bulk revocation must be atomic so a concurrent liveness check cannot
//!   observe a half-revoked user
//! - Lookups run on every authenticated request and must be fast

use std::time::Duration;

use async_trait::async_trait;

use crate::AuthResult;

/// Storage trait for session token liveness state.
///
/// # Implementations
///
/// - `keygate-redis` - shared Redis registry for multi-instance deployments
/// - [`MemorySessionRegistry`](crate::storage::MemorySessionRegistry) -
///   process-local registry for single-instance deployments and tests
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Registers a freshly issued token identifier as valid.
    ///
    /// Writes the liveness entry with the given TTL and adds the identifier
    /// to the owning user's index. Both writes must be complete when this
    /// method returns, so that a token handed to a client is immediately
    /// accepted by liveness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unreachable or either write
    /// fails. Callers must not return the token to the client in that case.
    async fn register(&self, user_id: i64, token_id: &str, ttl: Duration) -> AuthResult<()>;

    /// Checks whether a token identifier is currently valid.
    ///
    /// Returns `false` for identifiers that were revoked, have expired, or
    /// were never registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unreachable. Callers must treat
    /// this as a rejection (fail closed), not as a pass.
    async fn is_live(&self, token_id: &str) -> AuthResult<bool>;

    /// Revokes a single token identifier.
    ///
    /// Deletes the liveness entry. The user index is left untouched; a
    /// stale index member is harmless because bulk revocation deletes
    /// absent entries as a no-op.
    ///
    /// # Idempotency
    ///
    /// Revoking an identifier with no entry succeeds without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unreachable.
    async fn revoke(&self, token_id: &str) -> AuthResult<()>;

    /// Revokes every token identifier issued to a user.
    ///
    /// Reads the user's index, then deletes all corresponding liveness
    /// entries plus the index itself in one atomic batch. A concurrent
    /// liveness check observes either the fully pre-revocation or the fully
    /// post-revocation state, never a partially revoked user.
    ///
    /// # Returns
    ///
    /// The number of token identifiers that were present in the index.
    /// Zero means the user had no active sessions, which is a valid
    /// terminal state and not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is unreachable or the batch fails.
    async fn revoke_all_for_user(&self, user_id: i64) -> AuthResult<u64>;
}
