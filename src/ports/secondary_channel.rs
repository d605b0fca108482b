//! SecondaryChannel port - out-of-band notification (email digest, etc.).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::realtime::{EventEnvelope, SubscriptionTopic};

/// Forwards an event to a user who is not connected.
///
/// Failures are reported but never roll back the durable record the
/// caller already wrote.
#[async_trait]
pub trait SecondaryChannel: Send + Sync {
    async fn push(
        &self,
        user_id: &UserId,
        topic: SubscriptionTopic,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError>;
}
