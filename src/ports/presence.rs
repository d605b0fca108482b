//! Presence port - best-effort "is this user online" hint.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};

/// Reads the `online` flag from the profile store.
///
/// The flag is a hint, not a delivery guarantee: a user marked online may
/// have no open connection at the instant an event is published.
#[async_trait]
pub trait PresenceReader: Send + Sync {
    async fn is_online(&self, user_id: &UserId) -> Result<bool, DomainError>;
}
