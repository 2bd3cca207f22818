//! User storage trait.
//!
//! Defines the interface for user persistence operations.
//! Implementations are provided by storage backends (e.g., PostgreSQL).

use async_trait::async_trait;

use crate::AuthResult;

// =============================================================================
// User Types
// =============================================================================

/// A user account.
///
/// The password hash is carried for credential verification and must never
/// be serialized into an API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable numeric identity assigned by the store.
    pub id: i64,

    /// Login name, unique across the store.
    pub username: String,

    /// Argon2 hash of the user's password in PHC string format.
    pub password_hash: String,

    /// Optional human-readable name shown in clients.
    pub display_name: Option<String>,

    /// Whether the user holds administrative privileges.
    pub is_admin: bool,

    /// Integer group classification, `0` by default.
    pub group: i64,
}

/// Data for creating a user; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub group: i64,
}

// =============================================================================
// User Storage Trait
// =============================================================================

/// Storage operations for users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find a user by their unique ID.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>>;

    /// Find a user by their username.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find any user with administrative privileges.
    ///
    /// Used at startup to decide whether a default admin must be seeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_any_admin(&self) -> AuthResult<Option<User>>;

    /// Create a new user and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` error if the username is already taken, or
    /// another error if the storage operation fails.
    async fn insert(&self, user: &NewUser) -> AuthResult<User>;

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the user doesn't exist, or another
    /// error if the storage operation fails.
    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> AuthResult<()>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the user doesn't exist, or another
    /// error if the storage operation fails.
    async fn delete(&self, user_id: i64) -> AuthResult<()>;
}
