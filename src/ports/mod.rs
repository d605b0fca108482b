//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime core and the outside world. Adapters implement these ports.
//!
//! ## Transport
//!
//! - `Broker` - Publish/subscribe broker carrying event envelopes
//!
//! ## Notification collaborators
//!
//! - `PresenceReader` - Online flag lookup
//! - `OfflineUpdateStore` - Durable fallback for undelivered updates
//! - `SubscriptionPreferences` - Per-topic opt-in
//! - `SecondaryChannel` - Out-of-band forward (email)
//!
//! ## Identity and CRUD collaborators
//!
//! - `TokenValidator` - Session token → user
//! - `MessageRepository`, `GuestRepository`, `BlacklistReader`

mod broker;
mod offline_update_store;
mod presence;
mod secondary_channel;
mod social_store;
mod subscription_preferences;
mod token_validator;

pub use broker::{Broker, BrokerError, Subscription};
pub use offline_update_store::OfflineUpdateStore;
pub use presence::PresenceReader;
pub use secondary_channel::SecondaryChannel;
pub use social_store::{BlacklistReader, GuestRepository, MessageRepository};
pub use subscription_preferences::SubscriptionPreferences;
pub use token_validator::TokenValidator;
