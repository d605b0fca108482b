//! Live-only pushes that bypass presence and durable storage.
//!
//! Used for events that only make sense while the user is connected
//! (upload progress, send refusals). If no hub is subscribed the event is
//! simply dropped.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::realtime::{ChannelKey, EventEnvelope, EventKind};
use crate::ports::Broker;

use super::notification_policy::NotificationError;

#[derive(Clone)]
pub struct RealtimePublisher {
    broker: Arc<dyn Broker>,
    namespace: String,
}

impl RealtimePublisher {
    pub fn new(broker: Arc<dyn Broker>, namespace: impl Into<String>) -> Self {
        Self {
            broker,
            namespace: namespace.into(),
        }
    }

    /// Publishes `body` as a `kind` envelope on the user's live channel.
    pub async fn push<T: Serialize>(
        &self,
        user_id: &UserId,
        kind: EventKind,
        body: &T,
    ) -> Result<(), NotificationError> {
        let envelope = EventEnvelope::from_body(kind, body)?;
        let key = ChannelKey::realtime(&self.namespace, user_id);
        self.broker.publish(&key, &envelope).await?;
        tracing::trace!(user_id = %user_id, kind = %kind, "Live push");
        Ok(())
    }
}
