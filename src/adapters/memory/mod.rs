//! In-memory store adapters for testing.
//!
//! One implementation per store port, each with inspection helpers and
//! failure injection for the error paths.
//!
//! # Security Note
//!
//! These adapters are for **testing only**. They use `.expect()` on lock
//! operations which will panic if locks are poisoned.

mod notification;
mod social;

pub use notification::{
    InMemoryOfflineUpdateStore, InMemoryPresence, InMemorySubscriptionPreferences,
    RecordingSecondaryChannel,
};
pub use social::{InMemoryBlacklist, InMemoryGuestRepository, InMemoryMessageRepository};
