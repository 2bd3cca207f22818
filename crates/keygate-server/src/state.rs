//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;

use keygate_auth::{AuthState, RevocationService, SessionIssuer, UsageStorage, UserStorage};

/// State shared by every handler.
///
/// Built once at startup in `main`; every member is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Token verification state for the auth extractors.
    pub auth: AuthState,

    /// Credential check and token issuance.
    pub issuer: Arc<SessionIssuer>,

    /// Logout, bulk revocation, and password change.
    pub revocation: Arc<RevocationService>,

    /// User account store.
    pub users: Arc<dyn UserStorage>,

    /// Usage event store.
    pub usage: Arc<dyn UsageStorage>,

    /// Path of the operator-provided client configuration document.
    pub client_config_path: PathBuf,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> AuthState {
        state.auth.clone()
    }
}
