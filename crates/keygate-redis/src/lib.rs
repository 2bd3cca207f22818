//! # keygate-redis
//!
//! Redis-backed session registry for the Keygate server.
//!
//! All server instances pointed at the same Redis observe the same liveness
//! state, so a revocation performed on one instance takes effect everywhere
//! on the next request.
//!
//! # Example
//!
//! ```ignore
//! use keygate_redis::RedisSessionRegistry;
//!
//! let registry = RedisSessionRegistry::connect("redis://localhost:6379", 16, 5000).await?;
//! registry.register(42, "some-jti", std::time::Duration::from_secs(3600)).await?;
//! ```

pub mod registry;

pub use registry::RedisSessionRegistry;
