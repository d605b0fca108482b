//! Social store ports - the CRUD collaborators that produce realtime events.
//!
//! Only the operations the notification flows need are modelled here; the
//! rest of the profile/message/guest CRUD lives behind the HTTP layer.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::social::{GuestVisit, Message};

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<(), DomainError>;
}

#[async_trait]
pub trait GuestRepository: Send + Sync {
    /// Records a visit. Repeat visits by the same guest refresh the time.
    async fn record_visit(&self, visit: &GuestVisit) -> Result<(), DomainError>;
}

#[async_trait]
pub trait BlacklistReader: Send + Sync {
    /// Whether `owner` has blacklisted `other`.
    async fn is_blacklisted(&self, owner: &UserId, other: &UserId) -> Result<bool, DomainError>;
}
