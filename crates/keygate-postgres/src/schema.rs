//! Schema bootstrap.
//!
//! Creates the tables the server needs during startup. `group` is a
//! reserved word, so the column is quoted everywhere it appears.

use sqlx_core::query::query;
use tracing::info;

use keygate_auth::AuthResult;

use crate::{PgPool, map_db_err};

/// Create all tables and indexes if they do not already exist.
///
/// # Errors
///
/// Returns an error if a statement fails.
pub async fn create_tables_if_not_exists(pool: &PgPool) -> AuthResult<()> {
    query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            is_admin BOOLEAN NOT NULL DEFAULT FALSE,
            "group" BIGINT NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_db_err)?;

    query(
        r#"
        CREATE TABLE IF NOT EXISTS login_events (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            username TEXT NOT NULL,
            logged_in_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_db_err)?;

    query(
        r#"
        CREATE TABLE IF NOT EXISTS usage_events (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            model TEXT NOT NULL,
            conversation_id TEXT NOT NULL,
            is_new_conversation BOOLEAN NOT NULL DEFAULT FALSE,
            recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_db_err)?;

    // Index for the windowed per-user report queries
    query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_usage_events_user_recorded
        ON usage_events(user_id, recorded_at)
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_db_err)?;

    // Index for the windowed all-users report queries
    query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_usage_events_recorded
        ON usage_events(recorded_at)
        "#,
    )
    .execute(pool)
    .await
    .map_err(map_db_err)?;

    info!("Database tables created");

    Ok(())
}
