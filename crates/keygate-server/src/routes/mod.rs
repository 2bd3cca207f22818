//! HTTP routes.
//!
//! Route modules translate HTTP requests into calls on the session services
//! and storage traits; no business rules live here.

pub mod auth;
pub mod client_config;
pub mod usage;

use axum::{Json, Router, routing::get};
use serde::Serialize;
use serde_json::{Value, json};

use crate::state::AppState;

/// Assembles the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .nest("/api/auth", auth::router())
        .nest("/api/usage", usage::router())
        .route("/api/config", get(client_config::client_config))
        .with_state(state)
}

async fn root() -> &'static str {
    "Keygate server is running"
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Body for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Test support
// ============================================================================
