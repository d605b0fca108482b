//! Realtime domain - envelopes, channel keys, offline updates.
//!
//! Pure data describing what flows through the fan-out subsystem. No I/O.

mod channel;
mod connection_state;
mod envelope;
mod offline_update;
mod topic;

pub use channel::{ChannelKey, CHANNEL_SUBTOPIC, EMAIL_TOPIC, KEY_SEPARATOR, REALTIME_TOPIC};
pub use connection_state::{CloseReason, ConnectionState};
pub use envelope::{EventEnvelope, EventKind};
pub use offline_update::OfflineUpdate;
pub use topic::{SubscriptionTopic, TopicEnvelope};
