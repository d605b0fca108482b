//! Authentication adapters.
//!
//! Implementations of the `TokenValidator` port:
//!
//! - `mock` - Test implementation backed by a map
//! - `redis` - Production lookup in the shared token hash

mod mock;
mod redis;

pub use self::mock::MockTokenValidator;
pub use self::redis::RedisTokenValidator;
