//! OfflineUpdateStore port - durable fallback records.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UpdateId, UserId};
use crate::domain::realtime::OfflineUpdate;

/// Durable storage for updates that could not be delivered live.
///
/// The realtime subsystem only writes; recipients read through the
/// updates endpoint when they reconnect or poll.
#[async_trait]
pub trait OfflineUpdateStore: Send + Sync {
    /// Persist one record. Errors must be surfaced; losing an offline
    /// notification silently is not acceptable.
    async fn insert(&self, update: &OfflineUpdate) -> Result<(), DomainError>;

    /// Fetch one record by id.
    async fn get(&self, id: &UpdateId) -> Result<Option<OfflineUpdate>, DomainError>;

    /// All records for a recipient, newest first.
    async fn list_for_recipient(&self, recipient: &UserId)
        -> Result<Vec<OfflineUpdate>, DomainError>;

    /// Delete a record owned by `recipient`. Returns false if absent.
    async fn remove(&self, recipient: &UserId, id: &UpdateId) -> Result<bool, DomainError>;
}
