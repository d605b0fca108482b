//! PostgreSQL adapters - Database implementations for store ports.
//!
//! - `PostgresPresenceReader` - `users.online`
//! - `PostgresOfflineUpdateStore` - durable fallback records
//! - `PostgresSubscriptionPreferences` - per-topic opt-in
//! - `PostgresMessageRepository`, `PostgresGuestRepository`,
//!   `PostgresBlacklistReader` - social stores
//!
//! Schema lives in `migrations/`.

mod offline_update_store;
mod presence;
mod social;
mod subscription_preferences;

pub use offline_update_store::PostgresOfflineUpdateStore;
pub use presence::PostgresPresenceReader;
pub use social::{PostgresBlacklistReader, PostgresGuestRepository, PostgresMessageRepository};
pub use subscription_preferences::PostgresSubscriptionPreferences;
