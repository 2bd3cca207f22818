//! Usage event storage.
//!
//! Records model invocations and serves the aggregate and detail queries
//! behind the usage reporting endpoints. Report queries are bounded by a
//! `[start, end]` window on `recorded_at`.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use keygate_auth::storage::{
    ModelUsage, NewUsageEvent, UsageEvent, UsageStorage, UserModelUsage, UserUsageDetail,
};
use keygate_auth::AuthResult;

use crate::{PgPool, map_db_err};

/// Row shape for detail queries joined with user identity.
type UserDetailTuple = (
    i64,
    String,
    Option<String>,
    bool,
    i64,
    String,
    String,
    bool,
    OffsetDateTime,
);

fn detail_from_tuple(row: UserDetailTuple) -> UserUsageDetail {
    UserUsageDetail {
        user_id: row.0,
        username: row.1,
        display_name: row.2,
        is_admin: row.3,
        event_id: row.4,
        model: row.5,
        conversation_id: row.6,
        is_new_conversation: row.7,
        recorded_at: row.8,
    }
}

// =============================================================================
// Usage Storage
// =============================================================================

/// PostgreSQL-backed usage event storage.
#[derive(Clone)]
pub struct PostgresUsageStorage {
    pool: Arc<PgPool>,
}

impl PostgresUsageStorage {
    /// Create a new usage storage.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStorage for PostgresUsageStorage {
    async fn record(&self, event: &NewUsageEvent) -> AuthResult<()> {
        query(
            r#"
            INSERT INTO usage_events (user_id, model, conversation_id, is_new_conversation)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(event.user_id)
        .bind(&event.model)
        .bind(&event.conversation_id)
        .bind(event.is_new_conversation)
        .execute(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(())
    }

    async fn filter_new_conversations(
        &self,
        user_id: i64,
        conversation_ids: &[String],
    ) -> AuthResult<Vec<String>> {
        if conversation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(String,)> = query_as(
            r#"
            SELECT DISTINCT conversation_id
            FROM usage_events
            WHERE user_id = $1
              AND is_new_conversation
              AND conversation_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(conversation_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn usage_by_model(
        &self,
        user_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<ModelUsage>> {
        let rows: Vec<(String, i64)> = query_as(
            r#"
            SELECT model, COUNT(*)
            FROM usage_events
            WHERE user_id = $1
              AND recorded_at BETWEEN $2 AND $3
            GROUP BY model
            ORDER BY model
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(model, count)| ModelUsage { model, count })
            .collect())
    }

    async fn usage_by_user_and_model(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<UserModelUsage>> {
        let rows: Vec<(i64, String, Option<String>, bool, String, i64)> = query_as(
            r#"
            SELECT u.id, u.username, u.display_name, u.is_admin, e.model, COUNT(*)
            FROM usage_events e
            JOIN users u ON u.id = e.user_id
            WHERE e.recorded_at BETWEEN $1 AND $2
            GROUP BY u.id, u.username, u.display_name, u.is_admin, e.model
            ORDER BY u.id, e.model
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(
                |(user_id, username, display_name, is_admin, model, count)| UserModelUsage {
                    user_id,
                    username,
                    display_name,
                    is_admin,
                    model,
                    count,
                },
            )
            .collect())
    }

    async fn usage_details(
        &self,
        user_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<UsageEvent>> {
        let rows: Vec<(i64, String, String, bool, OffsetDateTime)> = query_as(
            r#"
            SELECT id, model, conversation_id, is_new_conversation, recorded_at
            FROM usage_events
            WHERE user_id = $1
              AND recorded_at BETWEEN $2 AND $3
            ORDER BY recorded_at DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(
                |(id, model, conversation_id, is_new_conversation, recorded_at)| UsageEvent {
                    id,
                    model,
                    conversation_id,
                    is_new_conversation,
                    recorded_at,
                },
            )
            .collect())
    }

    async fn usage_details_all_users(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<UserUsageDetail>> {
        let rows: Vec<UserDetailTuple> = query_as(
            r#"
            SELECT u.id, u.username, u.display_name, u.is_admin,
                   e.id, e.model, e.conversation_id, e.is_new_conversation, e.recorded_at
            FROM usage_events e
            JOIN users u ON u.id = e.user_id
            WHERE e.recorded_at BETWEEN $1 AND $2
            ORDER BY u.id, e.recorded_at DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&*self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(detail_from_tuple).collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_tuple() {
        let recorded_at = OffsetDateTime::UNIX_EPOCH;
        let detail = detail_from_tuple((
            3,
            "bob".to_string(),
            None,
            true,
            91,
            "gpt-4".to_string(),
            "conv-1".to_string(),
            true,
            recorded_at,
        ));

        assert_eq!(detail.user_id, 3);
        assert_eq!(detail.username, "bob");
        assert_eq!(detail.display_name, None);
        assert!(detail.is_admin);
        assert_eq!(detail.event_id, 91);
        assert_eq!(detail.model, "gpt-4");
        assert_eq!(detail.conversation_id, "conv-1");
        assert!(detail.is_new_conversation);
        assert_eq!(detail.recorded_at, recorded_at);
    }
}
