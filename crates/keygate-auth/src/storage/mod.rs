//! Storage traits for authentication and usage data.
//!
//! This module defines the interfaces the session subsystem depends on.
//! Implementations are provided by backend crates:
//!
//! - `keygate-postgres` - PostgreSQL storage for users, login audit, usage
//! - `keygate-redis` - Redis-backed session registry
//!
//! A process-local [`MemorySessionRegistry`] is included for single-instance
//! deployments and tests.

pub mod audit;
pub mod memory;
pub mod session;
pub mod usage;
pub mod user;

pub use audit::{LoginAuditStorage, LoginEvent};
pub use memory::{MemorySessionRegistry, MemoryUserStorage};
pub use session::SessionRegistry;
pub use usage::{
    ModelUsage, NewUsageEvent, UsageEvent, UsageStorage, UserModelUsage, UserUsageDetail,
};
pub use user::{NewUser, User, UserStorage};
