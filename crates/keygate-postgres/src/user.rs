//! User storage.
//!
//! Stores user accounts with their Argon2 password hashes. Usernames are
//! unique at the database level; the insert maps that violation to a
//! `Conflict` so handlers can answer with a clean 409.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;

use keygate_auth::storage::{NewUser, User, UserStorage};
use keygate_auth::{AuthError, AuthResult};

use crate::{PgPool, map_db_err};

/// Row shape shared by the user queries.
type UserTuple = (i64, String, String, Option<String>, bool, i64);

fn user_from_tuple(row: UserTuple) -> User {
    User {
        id: row.0,
        username: row.1,
        password_hash: row.2,
        display_name: row.3,
        is_admin: row.4,
        group: row.5,
    }
}

// =============================================================================
// User Storage
// =============================================================================

/// PostgreSQL-backed user storage.
#[derive(Clone)]
pub struct PostgresUserStorage {
    pool: Arc<PgPool>,
}

impl PostgresUserStorage {
    /// Create a new user storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for PostgresUserStorage {
    async fn find_by_id(&self, user_id: i64) -> AuthResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, username, password_hash, display_name, is_admin, "group"
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(user_from_tuple))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, username, password_hash, display_name, is_admin, "group"
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(user_from_tuple))
    }

    async fn find_any_admin(&self) -> AuthResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, username, password_hash, display_name, is_admin, "group"
            FROM users
            WHERE is_admin
            ORDER BY id
            LIMIT 1
            "#,
        )
        .fetch_optional(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(user_from_tuple))
    }

    async fn insert(&self, user: &NewUser) -> AuthResult<User> {
        let row: UserTuple = query_as(
            r#"
            INSERT INTO users (username, password_hash, display_name, is_admin, "group")
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, display_name, is_admin, "group"
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.is_admin)
        .bind(user.group)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if let sqlx_core::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return AuthError::conflict("Username already exists");
            }
            map_db_err(e)
        })?;

        Ok(user_from_tuple(row))
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> AuthResult<()> {
        let result = query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&*self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::not_found("User not found"));
        }

        Ok(())
    }

    async fn delete(&self, user_id: i64) -> AuthResult<()> {
        let result = query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&*self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::not_found("User not found"));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
