//! Broker adapters.
//!
//! - [`RedisBroker`] - production PUBLISH/SUBSCRIBE over `redis::aio`
//! - [`InMemoryBroker`] - process-local broker for tests

mod in_memory;
mod redis;

pub use self::in_memory::InMemoryBroker;
pub use self::redis::RedisBroker;
