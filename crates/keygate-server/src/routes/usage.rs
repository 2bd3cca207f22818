//! Usage recording and reporting endpoints.
//!
//! Mounted under `/api/usage`. Recording and the aggregate queries need any
//! authenticated session; the raw detail listings are admin-only. Time
//! windows arrive as RFC 3339 query parameters.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use keygate_auth::{
    AdminAuth, AuthError, BearerAuth, ModelUsage, NewUsageEvent, UsageEvent, UsageStorage,
    UserModelUsage, UserUsageDetail,
};

use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/record", post(record))
        .route("/filter-conversations", post(filter_conversations))
        .route("/user-usage", get(user_usage))
        .route("/all-users-usage", get(all_users_usage))
        .route("/user-usage-details", get(user_usage_details))
        .route("/all-users-usage-details", get(all_users_usage_details))
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub model: Option<String>,
    pub conversation_id: Option<String>,
    pub is_new_conversation: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FilterConversationsRequest {
    pub user_id: Option<i64>,
    pub conversation_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct FilterConversationsResponse {
    pub conversation_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserWindowQuery {
    pub user_id: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse<T> {
    pub usage: Vec<T>,
}

/// Parses the required RFC 3339 window bounds.
fn parse_window(
    start_time: Option<String>,
    end_time: Option<String>,
) -> Result<(OffsetDateTime, OffsetDateTime), AuthError> {
    let (Some(start), Some(end)) = (start_time, end_time) else {
        return Err(AuthError::invalid_request("Missing query parameters"));
    };
    let start = OffsetDateTime::parse(&start, &Rfc3339)
        .map_err(|_| AuthError::invalid_request("Invalid time range"))?;
    let end = OffsetDateTime::parse(&end, &Rfc3339)
        .map_err(|_| AuthError::invalid_request("Invalid time range"))?;
    Ok((start, end))
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/usage/record` - append a usage event for the caller.
async fn record(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    Json(body): Json<RecordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let (Some(model), Some(conversation_id), Some(is_new_conversation)) =
        (body.model, body.conversation_id, body.is_new_conversation)
    else {
        return Err(AuthError::invalid_request("Missing required fields"));
    };

    state
        .usage
        .record(&NewUsageEvent {
            user_id: auth.user_id(),
            model,
            conversation_id,
            is_new_conversation,
        })
        .await?;
    Ok(Json(MessageResponse::new("Usage recorded successfully")))
}

/// `POST /api/usage/filter-conversations` - which of the given conversations
/// the given user started as new.
async fn filter_conversations(
    State(state): State<AppState>,
    BearerAuth(_auth): BearerAuth,
    Json(body): Json<FilterConversationsRequest>,
) -> Result<Json<FilterConversationsResponse>, AuthError> {
    let (Some(user_id), Some(conversation_ids)) = (body.user_id, body.conversation_ids) else {
        return Err(AuthError::invalid_request("Invalid parameters"));
    };

    let conversation_ids = state
        .usage
        .filter_new_conversations(user_id, &conversation_ids)
        .await?;
    Ok(Json(FilterConversationsResponse { conversation_ids }))
}

/// `GET /api/usage/user-usage` - per-model counts for one user.
async fn user_usage(
    State(state): State<AppState>,
    BearerAuth(_auth): BearerAuth,
    Query(query): Query<UserWindowQuery>,
) -> Result<Json<UsageResponse<ModelUsage>>, AuthError> {
    let Some(user_id) = query.user_id else {
        return Err(AuthError::invalid_request("Missing query parameters"));
    };
    let (start, end) = parse_window(query.start_time, query.end_time)?;

    let usage = state.usage.usage_by_model(user_id, start, end).await?;
    Ok(Json(UsageResponse { usage }))
}

/// `GET /api/usage/all-users-usage` - per-model counts for every user.
async fn all_users_usage(
    State(state): State<AppState>,
    BearerAuth(_auth): BearerAuth,
    Query(query): Query<WindowQuery>,
) -> Result<Json<UsageResponse<UserModelUsage>>, AuthError> {
    let (start, end) = parse_window(query.start_time, query.end_time)?;

    let usage = state.usage.usage_by_user_and_model(start, end).await?;
    Ok(Json(UsageResponse { usage }))
}

/// `GET /api/usage/user-usage-details` - raw events for one user, newest
/// first. Admin only.
async fn user_usage_details(
    State(state): State<AppState>,
    AdminAuth(_admin): AdminAuth,
    Query(query): Query<UserWindowQuery>,
) -> Result<Json<UsageResponse<UsageEvent>>, AuthError> {
    let Some(user_id) = query.user_id else {
        return Err(AuthError::invalid_request("Missing query parameters"));
    };
    let (start, end) = parse_window(query.start_time, query.end_time)?;

    let usage = state.usage.usage_details(user_id, start, end).await?;
    Ok(Json(UsageResponse { usage }))
}

/// `GET /api/usage/all-users-usage-details` - raw events for every user.
/// Admin only.
async fn all_users_usage_details(
    State(state): State<AppState>,
    AdminAuth(_admin): AdminAuth,
    Query(query): Query<WindowQuery>,
) -> Result<Json<UsageResponse<UserUsageDetail>>, AuthError> {
    let (start, end) = parse_window(query.start_time, query.end_time)?;

    let usage = state.usage.usage_details_all_users(start, end).await?;
    Ok(Json(UsageResponse { usage }))
}

// ============================================================================
// Tests
// ============================================================================
