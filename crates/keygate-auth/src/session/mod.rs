//! Session lifecycle services.
//!
//! [`SessionIssuer`] turns verified credentials into signed session tokens
//! and registers them as live. [`RevocationService`] ends sessions: single
//! logout, administrative bulk revocation, and the revoke-everything side
//! effect of a password change.

pub mod issuer;
pub mod revocation;

pub use issuer::{IssuedSession, SessionConfig, SessionIssuer};
pub use revocation::RevocationService;
