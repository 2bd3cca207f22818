//! # keygate-postgres
//!
//! PostgreSQL storage backend for the Keygate server.
//!
//! Provides persistent storage for:
//!
//! - User accounts (credentials, display name, privileges, group)
//! - Login audit events
//! - Model usage events and the reports built from them
//!
//! Session liveness state does not live here. The revocation registry is
//! backed by `keygate-redis` or the in-memory registry in `keygate-auth`.
//!
//! # Example
//!
//! ```ignore
//! use keygate_postgres::PostgresStorage;
//!
//! // Create storage with connection pool
//! let storage = PostgresStorage::connect("postgres://localhost/keygate", 16).await?;
//! storage.create_tables_if_not_exists().await?;
//!
//! // Use user storage
//! let users = storage.users();
//! let user = users.find_by_username("alice").await?;
//! ```

pub mod login_audit;
pub mod schema;
pub mod usage;
pub mod user;

use std::sync::Arc;

use sqlx_core::pool::{Pool, PoolOptions};
use sqlx_postgres::Postgres;

use keygate_auth::{AuthError, AuthResult};

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use login_audit::PostgresLoginAuditStorage;
pub use usage::PostgresUsageStorage;
pub use user::PostgresUserStorage;

/// Maps a database error to the shared error type.
///
/// Query-level failures and unreachable-database failures are deliberately
/// not distinguished: both mean the store cannot answer, and security
/// checks built on these answers fail closed.
pub(crate) fn map_db_err(e: sqlx_core::Error) -> AuthError {
    AuthError::dependency_unavailable(format!("Database error: {e}"))
}

// =============================================================================
// PostgreSQL Storage
// =============================================================================

/// PostgreSQL storage backend for user, audit, and usage data.
///
/// This struct holds a connection pool and provides access to specialized
/// storage types for the different entities.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create new storage by connecting to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str, max_connections: u32) -> AuthResult<Self> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                AuthError::dependency_unavailable(format!("Failed to connect to PostgreSQL: {e}"))
            })?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get a reference to the Arc-wrapped pool.
    #[must_use]
    pub fn pool_arc(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }

    /// Create all tables and indexes if they do not already exist.
    ///
    /// Every statement is idempotent, so this runs on each startup.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub async fn create_tables_if_not_exists(&self) -> AuthResult<()> {
        schema::create_tables_if_not_exists(&self.pool).await
    }

    // -------------------------------------------------------------------------
    // Storage Accessors
    // -------------------------------------------------------------------------

    /// Get user storage operations.
    #[must_use]
    pub fn users(&self) -> PostgresUserStorage {
        PostgresUserStorage::new(self.pool_arc())
    }

    /// Get login audit storage operations.
    #[must_use]
    pub fn login_audit(&self) -> PostgresLoginAuditStorage {
        PostgresLoginAuditStorage::new(self.pool_arc())
    }

    /// Get usage storage operations.
    #[must_use]
    pub fn usage(&self) -> PostgresUsageStorage {
        PostgresUsageStorage::new(self.pool_arc())
    }
}
