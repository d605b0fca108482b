//! Notification policy - decides how an outbound event reaches its recipient.
//!
//! ```text
//!                  ┌─ online ──► publish on realtime channel ──► Hub ──► sockets
//! event ─► presence┤
//!                  └─ offline ─► OfflineUpdate ──► (subscribed?) ──► secondary channel
//! ```
//!
//! Failure handling:
//! - Presence lookup error: treated as offline
//! - Live publish error: falls back to the durable path
//! - Durable write error: returned to the caller
//! - Preference lookup or secondary push error: logged only

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{DomainError, UpdateId, UserId};
use crate::domain::realtime::{ChannelKey, EventEnvelope, EventKind, OfflineUpdate, SubscriptionTopic};
use crate::ports::{
    Broker, BrokerError, OfflineUpdateStore, PresenceReader, SecondaryChannel,
    SubscriptionPreferences,
};

/// How an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Published on the recipient's live channel.
    Live,
    /// Written as an offline update; `forwarded` tells whether the
    /// secondary channel accepted it.
    Stored { update_id: UpdateId, forwarded: bool },
}

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The durable fallback record could not be written.
    #[error("Failed to store offline update: {0}")]
    Store(#[from] DomainError),

    #[error("Failed to encode event body: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Live-only push failed (no durable fallback exists for it).
    #[error("Live push failed: {0}")]
    Broker(#[from] BrokerError),
}

/// Presence-aware router for outbound events (the "updater").
pub struct NotificationPolicy {
    presence: Arc<dyn PresenceReader>,
    broker: Arc<dyn Broker>,
    offline_store: Arc<dyn OfflineUpdateStore>,
    preferences: Arc<dyn SubscriptionPreferences>,
    secondary: Arc<dyn SecondaryChannel>,
    namespace: String,
}

impl NotificationPolicy {
    pub fn new(
        presence: Arc<dyn PresenceReader>,
        broker: Arc<dyn Broker>,
        offline_store: Arc<dyn OfflineUpdateStore>,
        preferences: Arc<dyn SubscriptionPreferences>,
        secondary: Arc<dyn SecondaryChannel>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            presence,
            broker,
            offline_store,
            preferences,
            secondary,
            namespace: namespace.into(),
        }
    }

    /// Routes one event from `origin` to `recipient`.
    pub async fn handle(
        &self,
        recipient: &UserId,
        origin: &UserId,
        kind: EventKind,
        payload: JsonValue,
    ) -> Result<Delivery, NotificationError> {
        let envelope = EventEnvelope::new(kind, payload);

        let online = match self.presence.is_online(recipient).await {
            Ok(online) => online,
            Err(e) => {
                tracing::warn!(user_id = %recipient, error = %e, "Presence lookup failed, treating as offline");
                false
            }
        };

        if online {
            let key = ChannelKey::realtime(&self.namespace, recipient);
            match self.broker.publish(&key, &envelope).await {
                Ok(()) => {
                    tracing::debug!(user_id = %recipient, kind = %kind, "Event published live");
                    return Ok(Delivery::Live);
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %recipient,
                        channel = %key,
                        error = %e,
                        "Live publish failed, storing offline update"
                    );
                }
            }
        }

        self.store_offline(recipient, origin, envelope).await
    }

    /// Serializes `body` and routes it like [`handle`](Self::handle).
    pub async fn notify<T: Serialize>(
        &self,
        recipient: &UserId,
        origin: &UserId,
        kind: EventKind,
        body: &T,
    ) -> Result<Delivery, NotificationError> {
        let payload = serde_json::to_value(body)?;
        self.handle(recipient, origin, kind, payload).await
    }

    async fn store_offline(
        &self,
        recipient: &UserId,
        origin: &UserId,
        envelope: EventEnvelope,
    ) -> Result<Delivery, NotificationError> {
        let update = OfflineUpdate {
            created_at: envelope.timestamp(),
            ..OfflineUpdate::new(*recipient, *origin, envelope.kind(), envelope.payload().clone())
        };
        self.offline_store.insert(&update).await?;
        tracing::debug!(user_id = %recipient, update_id = %update.id, kind = %update.kind, "Offline update stored");

        let forwarded = match SubscriptionTopic::for_event(envelope.kind()) {
            Some(topic) => self.forward(recipient, topic, &envelope).await,
            None => false,
        };

        Ok(Delivery::Stored {
            update_id: update.id,
            forwarded,
        })
    }

    async fn forward(
        &self,
        recipient: &UserId,
        topic: SubscriptionTopic,
        envelope: &EventEnvelope,
    ) -> bool {
        match self.preferences.is_subscribed(recipient, topic).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                tracing::warn!(user_id = %recipient, topic = topic.as_str(), error = %e, "Subscription lookup failed, not forwarding");
                return false;
            }
        }

        match self.secondary.push(recipient, topic, envelope).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id = %recipient, topic = topic.as_str(), error = %e, "Secondary channel push failed");
                false
            }
        }
    }
}
