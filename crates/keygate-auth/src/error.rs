//! Authentication and authorization error types.
//!
//! This module defines all error types that can occur during session token
//! issuance, verification, and revocation.

use std::fmt;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The username or password is wrong.
    ///
    /// Deliberately carries no detail: wrong username and wrong password are
    /// indistinguishable to the caller.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The request carries no bearer credential.
    #[error("No token provided")]
    MissingToken,

    /// The token failed signature verification or its claims cannot be parsed.
    #[error("Invalid token: {message}")]
    MalformedToken {
        /// Internal description; never surfaced verbatim to the caller.
        message: String,
    },

    /// The token's expiry is in the past.
    #[error("Token expired")]
    ExpiredToken,

    /// The token's revocation entry is gone: logged out, force-revoked, or
    /// expired out of the registry.
    #[error("Token has been revoked")]
    RevokedToken,

    /// The authenticated user lacks the privilege the endpoint requires.
    #[error("Admin access required")]
    InsufficientPrivilege,

    /// A backing store (revocation registry or credential store) could not be
    /// reached. Security checks that hit this condition fail closed.
    #[error("Dependency unavailable: {message}")]
    DependencyUnavailable {
        /// Internal description; logged, never surfaced.
        message: String,
    },

    /// The requested record does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// The operation conflicts with existing state (duplicate username).
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The request is missing required fields or is otherwise malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Internal description; logged, never surfaced.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MalformedToken` error.
    #[must_use]
    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::MalformedToken {
            message: message.into(),
        }
    }

    /// Creates a new `DependencyUnavailable` error.
    #[must_use]
    pub fn dependency_unavailable(message: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::MalformedToken { .. }
                | Self::ExpiredToken
                | Self::RevokedToken
                | Self::InsufficientPrivilege
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::DependencyUnavailable { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is a token-related error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::MissingToken
                | Self::MalformedToken { .. }
                | Self::ExpiredToken
                | Self::RevokedToken
        )
    }

    /// Returns `true` if this is an authentication error.
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::MissingToken
                | Self::MalformedToken { .. }
                | Self::ExpiredToken
                | Self::RevokedToken
        )
    }

    /// Returns `true` if this is an authorization error.
    #[must_use]
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, Self::InsufficientPrivilege)
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::MissingToken => ErrorCategory::Token,
            Self::MalformedToken { .. } => ErrorCategory::Token,
            Self::ExpiredToken => ErrorCategory::Token,
            Self::RevokedToken => ErrorCategory::Token,
            Self::InsufficientPrivilege => ErrorCategory::Authorization,
            Self::DependencyUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::NotFound { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Validation,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authentication/authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Authentication-related errors (identity verification).
    Authentication,
    /// Authorization-related errors (permission checks).
    Authorization,
    /// Token-related errors (extraction, validation, revocation).
    Token,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
