//! Authentication and user management endpoints.
//!
//! Mounted under `/api/auth`. Token lifecycle and the admin-only user
//! management operations live here; these handlers translate HTTP bodies
//! in and out, the session services do the actual work.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use keygate_auth::{AdminAuth, AuthError, BearerAuth, NewUser, User, hash_password};

use crate::routes::MessageResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/status", get(status))
        .route("/logout", post(logout))
        .route("/revoke-all-tokens", post(revoke_all_tokens))
        .route("/add-user", post(add_user))
        .route("/delete-user", post(delete_user))
        .route("/change-password", post(change_password))
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// User identity as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub group: i64,
}

impl From<User> for UserIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            is_admin: user.is_admin,
            group: user.group,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub logged_in: bool,
    pub user: UserIdentity,
}

#[derive(Debug, Deserialize)]
pub struct RevokeAllRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RevokeAllResponse {
    pub message: String,
    pub revoked: u64,
}

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct AddUserResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// `POST /api/auth/login` - authenticate and issue a session token.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return Err(AuthError::invalid_request(
            "Username and password are required",
        ));
    };

    let session = state.issuer.login(&username, &password).await?;
    tracing::info!(
        user_id = session.claims.sub,
        username = %session.claims.username,
        "Login succeeded"
    );
    Ok(Json(LoginResponse {
        token: session.token,
    }))
}

/// `GET /api/auth/status` - report the session's identity, re-read from the
/// user store so it reflects changes made since issuance.
async fn status(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
) -> Result<Json<StatusResponse>, AuthError> {
    let user = state
        .users
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| AuthError::not_found("User not found"))?;

    Ok(Json(StatusResponse {
        logged_in: true,
        user: user.into(),
    }))
}

/// `POST /api/auth/logout` - revoke the calling session.
async fn logout(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
) -> Result<Json<MessageResponse>, AuthError> {
    state.revocation.logout(auth.token_id()).await?;
    tracing::info!(user_id = auth.user_id(), "Logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// `POST /api/auth/revoke-all-tokens` - admin force-logout of one user.
async fn revoke_all_tokens(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Json(body): Json<RevokeAllRequest>,
) -> Result<Json<RevokeAllResponse>, AuthError> {
    let Some(user_id) = body.user_id else {
        return Err(AuthError::invalid_request("user_id is required"));
    };

    let revoked = state.revocation.revoke_all(user_id).await?;

    tracing::info!(
        admin_id = admin.user_id(),
        user_id,
        revoked,
        "Force-revoked all sessions"
    );
    // Zero live sessions is a valid terminal state, not a failure.
    let message = if revoked == 0 {
        format!("User {user_id} has no active tokens")
    } else {
        format!("All tokens for user {user_id} have been revoked")
    };
    Ok(Json(RevokeAllResponse { message, revoked }))
}

/// `POST /api/auth/add-user` - admin-only account creation.
async fn add_user(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Json(body): Json<AddUserRequest>,
) -> Result<Json<AddUserResponse>, AuthError> {
    let (Some(username), Some(password), Some(display_name)) =
        (body.username, body.password, body.display_name)
    else {
        return Err(AuthError::invalid_request(
            "Username, password, and display name are required",
        ));
    };

    let password_hash = hash_password(&password)
        .map_err(|e| AuthError::internal(format!("Failed to hash password: {e}")))?;
    let user = state
        .users
        .insert(&NewUser {
            username,
            password_hash,
            display_name: Some(display_name),
            is_admin: body.is_admin,
            group: 0,
        })
        .await?;

    tracing::info!(
        admin_id = admin.user_id(),
        user_id = user.id,
        username = %user.username,
        is_admin = user.is_admin,
        "User created"
    );
    Ok(Json(AddUserResponse {
        message: "User added successfully".to_string(),
        user_id: user.id,
    }))
}

/// `POST /api/auth/delete-user` - admin-only account removal.
async fn delete_user(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Json(body): Json<DeleteUserRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Some(user_id) = body.user_id else {
        return Err(AuthError::invalid_request("user_id is required"));
    };

    // Revoke before delete: the guards trust the registry alone, so a
    // session surviving its deleted account would still authenticate.
    let revoked = state.revocation.revoke_all(user_id).await?;
    state.users.delete(user_id).await?;

    tracing::info!(
        admin_id = admin.user_id(),
        user_id,
        revoked,
        "User deleted"
    );
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// `POST /api/auth/change-password` - change the caller's password and
/// revoke every session issued under the old one.
async fn change_password(
    State(state): State<AppState>,
    BearerAuth(auth): BearerAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let (Some(old_password), Some(new_password)) = (body.old_password, body.new_password) else {
        return Err(AuthError::invalid_request(
            "Old and new passwords are required",
        ));
    };

    state
        .revocation
        .change_password(auth.user_id(), &old_password, &new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AuthError::invalid_request("Old password is incorrect")
            }
            other => other,
        })?;

    tracing::info!(user_id = auth.user_id(), "Password changed");
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{EmptyUsage, context_for, seed_user, test_env};
    use keygate_auth::{SessionRegistry, verify_password};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn env() -> crate::routes::test_support::TestEnv {
        test_env(Arc::new(EmptyUsage), PathBuf::from("config.json"))
    }

    fn login_body(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        })
    }

    #[tokio::test]
    async fn test_login_returns_live_token() {
        let env = env();
        seed_user(&env.users, "alice", "secret123", false).await;

        let response = login(State(env.state.clone()), login_body("alice", "secret123"))
            .await
            .unwrap();

        let decoded = env
            .state
            .auth
            .jwt_service
            .decode::<keygate_auth::SessionClaims>(&response.0.token)
            .unwrap();
        assert_eq!(decoded.claims.username, "alice");
        assert!(env.registry.is_live(&decoded.claims.jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let env = env();
        seed_user(&env.users, "alice", "secret123", false).await;

        let err = login(State(env.state.clone()), login_body("alice", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let env = env();
        let err = login(
            State(env.state.clone()),
            Json(LoginRequest {
                username: Some("alice".to_string()),
                password: None,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AuthError::InvalidRequest { ref message } if message == "Username and password are required"
        ));
    }

    #[tokio::test]
    async fn test_status_reports_fresh_identity() {
        let env = env();
        let alice = seed_user(&env.users, "alice", "secret123", false).await;

        let response = status(State(env.state.clone()), BearerAuth(context_for(&alice)))
            .await
            .unwrap();
        assert!(response.0.logged_in);
        assert_eq!(response.0.user.id, alice.id);
        assert_eq!(response.0.user.username, "alice");
        assert!(!response.0.user.is_admin);
    }

    #[tokio::test]
    async fn test_status_of_deleted_user_not_found() {
        let env = env();
        let alice = seed_user(&env.users, "alice", "secret123", false).await;
        let context = context_for(&alice);
        env.users.delete(alice.id).await.unwrap();

        let err = status(State(env.state.clone()), BearerAuth(context))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_logout_revokes_the_calling_session() {
        let env = env();
        seed_user(&env.users, "alice", "secret123", false).await;
        let session = env.state.issuer.login("alice", "secret123").await.unwrap();
        let context = keygate_auth::AuthContext::new(session.claims.clone());

        logout(State(env.state.clone()), BearerAuth(context.clone()))
            .await
            .unwrap();
        assert!(!env.registry.is_live(&session.claims.jti).await.unwrap());

        // Idempotent
        logout(State(env.state.clone()), BearerAuth(context))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoke_all_tokens_kills_every_session() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;
        let alice = seed_user(&env.users, "alice", "secret123", false).await;

        let first = env.state.issuer.login("alice", "secret123").await.unwrap();
        let second = env.state.issuer.login("alice", "secret123").await.unwrap();

        let response = revoke_all_tokens(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(RevokeAllRequest {
                user_id: Some(alice.id),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.revoked, 2);
        assert!(!env.registry.is_live(&first.claims.jti).await.unwrap());
        assert!(!env.registry.is_live(&second.claims.jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_all_tokens_without_sessions_is_terminal_success() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;

        let response = revoke_all_tokens(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(RevokeAllRequest { user_id: Some(999) }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.revoked, 0);
        assert_eq!(response.0.message, "User 999 has no active tokens");
    }

    #[tokio::test]
    async fn test_revoke_all_tokens_requires_user_id() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;

        let err = revoke_all_tokens(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(RevokeAllRequest { user_id: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn test_add_user_creates_working_account() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;

        let response = add_user(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(AddUserRequest {
                username: Some("bob".to_string()),
                password: Some("bobpass".to_string()),
                display_name: Some("Bob".to_string()),
                is_admin: false,
            }),
        )
        .await
        .unwrap();

        let stored = env
            .users
            .find_by_id(response.0.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.username, "bob");
        assert_eq!(stored.display_name.as_deref(), Some("Bob"));
        assert!(!stored.is_admin);
        assert!(verify_password("bobpass", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_add_user_duplicate_username_conflicts() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;
        seed_user(&env.users, "bob", "bobpass", false).await;

        let err = add_user(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(AddUserRequest {
                username: Some("bob".to_string()),
                password: Some("other".to_string()),
                display_name: Some("Bob".to_string()),
                is_admin: false,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_add_user_requires_fields() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;

        let err = add_user(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(AddUserRequest {
                username: Some("bob".to_string()),
                password: Some("bobpass".to_string()),
                display_name: None,
                is_admin: false,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AuthError::InvalidRequest { ref message }
                if message == "Username, password, and display name are required"
        ));
    }

    #[tokio::test]
    async fn test_delete_user_revokes_before_removal() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;
        let alice = seed_user(&env.users, "alice", "secret123", false).await;
        let session = env.state.issuer.login("alice", "secret123").await.unwrap();

        delete_user(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(DeleteUserRequest {
                user_id: Some(alice.id),
            }),
        )
        .await
        .unwrap();

        assert!(env.users.find_by_id(alice.id).await.unwrap().is_none());
        assert!(!env.registry.is_live(&session.claims.jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_unknown_user_not_found() {
        let env = env();
        let admin = seed_user(&env.users, "root", "rootpass", true).await;

        let err = delete_user(
            State(env.state.clone()),
            AdminAuth(context_for(&admin)),
            Json(DeleteUserRequest { user_id: Some(999) }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_change_password_revokes_and_allows_new_login() {
        let env = env();
        let alice = seed_user(&env.users, "alice", "old-secret", false).await;
        let session = env.state.issuer.login("alice", "old-secret").await.unwrap();

        change_password(
            State(env.state.clone()),
            BearerAuth(context_for(&alice)),
            Json(ChangePasswordRequest {
                old_password: Some("old-secret".to_string()),
                new_password: Some("new-secret".to_string()),
            }),
        )
        .await
        .unwrap();

        assert!(!env.registry.is_live(&session.claims.jti).await.unwrap());
        env.state.issuer.login("alice", "new-secret").await.unwrap();
        let err = env
            .state
            .issuer
            .login("alice", "old-secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_change_password_wrong_old_password() {
        let env = env();
        let alice = seed_user(&env.users, "alice", "old-secret", false).await;

        let err = change_password(
            State(env.state.clone()),
            BearerAuth(context_for(&alice)),
            Json(ChangePasswordRequest {
                old_password: Some("not-it".to_string()),
                new_password: Some("new-secret".to_string()),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            AuthError::InvalidRequest { ref message } if message == "Old password is incorrect"
        ));
    }
}
