//! Client configuration endpoint.
//!
//! `GET /api/config` serves an operator-maintained JSON document (model
//! lists, feature toggles) to authenticated clients. The file is re-read on
//! every request so edits take effect without a restart.

use axum::{Json, extract::State};
use serde::Serialize;

use keygate_auth::{AuthError, BearerAuth};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClientConfigResponse {
    pub config: serde_json::Value,
}

pub async fn client_config(
    State(state): State<AppState>,
    BearerAuth(_auth): BearerAuth,
) -> Result<Json<ClientConfigResponse>, AuthError> {
    let raw = tokio::fs::read_to_string(&state.client_config_path)
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AuthError::not_found("Client configuration not found")
            } else {
                AuthError::internal(format!("Failed to read client configuration: {e}"))
            }
        })?;

    let config: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| AuthError::internal(format!("Client configuration is not valid JSON: {e}")))?;

    Ok(Json(ClientConfigResponse { config }))
}
