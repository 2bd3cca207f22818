//! Session token types and signing.
//!
//! A session token is a compact three-part JWS (header/claims/signature)
//! signed with a server-held secret. The server never stores the token
//! itself; liveness is tracked in the revocation registry under the token's
//! `jti` claim.

pub mod claims;
pub mod jwt;

pub use claims::{DEFAULT_SESSION_TTL_SECS, SessionClaims, SessionClaimsBuilder};
pub use jwt::{JwtError, JwtService};
