use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::realtime::{ChannelKey, EventEnvelope, SubscriptionTopic, TopicEnvelope};
use crate::ports::{Broker, SecondaryChannel};

/// Publishes topic-tagged envelopes on the user's email channel.
///
/// The body and timestamp are the original event's, so the mailer can
/// render it without a second lookup.
pub struct BrokerSecondaryChannel {
    broker: Arc<dyn Broker>,
    namespace: String,
}

impl BrokerSecondaryChannel {
    pub fn new(broker: Arc<dyn Broker>, namespace: impl Into<String>) -> Self {
        Self {
            broker,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl SecondaryChannel for BrokerSecondaryChannel {
    async fn push(
        &self,
        user_id: &UserId,
        topic: SubscriptionTopic,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let key = ChannelKey::email(&self.namespace, user_id);
        let payload = TopicEnvelope::forward(topic, envelope)
            .to_json()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;

        self.broker
            .publish_raw(&key, payload)
            .await
            .map_err(|e| DomainError::new(ErrorCode::CacheError, e.to_string()))
    }
}
