//! SubscriptionPreferences port - per-topic opt-in for secondary notifications.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::realtime::SubscriptionTopic;

#[async_trait]
pub trait SubscriptionPreferences: Send + Sync {
    /// Whether `user_id` wants secondary notifications for `topic`.
    async fn is_subscribed(
        &self,
        user_id: &UserId,
        topic: SubscriptionTopic,
    ) -> Result<bool, DomainError>;
}
