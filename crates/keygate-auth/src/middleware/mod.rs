//! HTTP middleware for authentication and authorization.
//!
//! This module provides Axum extractors for:
//!
//! - Bearer token extraction and validation ([`BearerAuth`])
//! - Admin-only endpoints ([`AdminAuth`])
//! - JSON error responses (`IntoResponse` for `AuthError`)
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use keygate_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(auth): BearerAuth) -> String {
//!     format!("Hello, {}!", auth.username())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod types;

pub use admin::AdminAuth;
pub use auth::{AuthState, BearerAuth};
pub use types::AuthContext;
