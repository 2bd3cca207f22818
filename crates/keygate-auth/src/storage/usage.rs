//! Usage event storage trait.
//!
//! Records model invocations (which model, which conversation, whether the
//! conversation was freshly created) and serves the aggregate and detail
//! queries behind the usage reporting endpoints. These are plain relational
//! reads and writes with no consistency concerns beyond the store's own.

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;

use crate::AuthResult;

// =============================================================================
// Usage Types
// =============================================================================

/// Data for recording a usage event; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewUsageEvent {
    pub user_id: i64,
    pub model: String,
    pub conversation_id: String,
    pub is_new_conversation: bool,
}

/// A recorded usage event.
#[derive(Debug, Clone, Serialize)]
pub struct UsageEvent {
    pub id: i64,
    pub model: String,
    pub conversation_id: String,
    pub is_new_conversation: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

/// Per-model invocation count for one user over a time window.
#[derive(Debug, Clone, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub count: i64,
}

/// Per-model invocation count joined with the owning user's identity.
#[derive(Debug, Clone, Serialize)]
pub struct UserModelUsage {
    pub user_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub model: String,
    pub count: i64,
}

/// A usage event joined with the owning user's identity.
#[derive(Debug, Clone, Serialize)]
pub struct UserUsageDetail {
    pub user_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub event_id: i64,
    pub model: String,
    pub conversation_id: String,
    pub is_new_conversation: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub recorded_at: OffsetDateTime,
}

// =============================================================================
// Usage Storage Trait
// =============================================================================

/// Storage operations for usage events.
#[async_trait]
pub trait UsageStorage: Send + Sync {
    /// Record a usage event at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn record(&self, event: &NewUsageEvent) -> AuthResult<()>;

    /// Of the given conversation ids, return those the user created as new
    /// conversations.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn filter_new_conversations(
        &self,
        user_id: i64,
        conversation_ids: &[String],
    ) -> AuthResult<Vec<String>>;

    /// Per-model usage counts for one user within a time window.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn usage_by_model(
        &self,
        user_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<ModelUsage>>;

    /// Per-model usage counts for every user within a time window, with
    /// user identity attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn usage_by_user_and_model(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<UserModelUsage>>;

    /// Raw usage events for one user within a time window, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn usage_details(
        &self,
        user_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<UsageEvent>>;

    /// Raw usage events for every user within a time window, grouped by
    /// user and newest first within each user.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn usage_details_all_users(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> AuthResult<Vec<UserUsageDetail>>;
}
