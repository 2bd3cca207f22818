//! Login audit storage.
//!
//! Append-only record of successful logins. The issuing service treats a
//! failed write as log-and-continue, so nothing here may panic or retry.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;

use keygate_auth::storage::LoginAuditStorage;
use keygate_auth::AuthResult;

use crate::{PgPool, map_db_err};

/// PostgreSQL-backed login audit storage.
#[derive(Clone)]
pub struct PostgresLoginAuditStorage {
    pool: Arc<PgPool>,
}

impl PostgresLoginAuditStorage {
    /// Create a new login audit storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginAuditStorage for PostgresLoginAuditStorage {
    async fn record_login(&self, user_id: i64, username: &str) -> AuthResult<()> {
        query(
            r#"
            INSERT INTO login_events (user_id, username)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id)
        .bind(username)
        .execute(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }
}
