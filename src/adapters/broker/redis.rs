//! Redis-backed broker for multi-process deployments.
//!
//! Publishing goes through a shared multiplexed connection. Each
//! subscription gets its own dedicated pub/sub connection, because a Redis
//! connection in subscriber mode cannot issue ordinary commands.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::realtime::{ChannelKey, EventEnvelope};
use crate::ports::{Broker, BrokerError, Subscription};

/// Redis PUBLISH/SUBSCRIBE broker.
#[derive(Clone)]
pub struct RedisBroker {
    client: redis::Client,
    conn: MultiplexedConnection,
    buffer: usize,
}

impl RedisBroker {
    /// Wraps an existing client and publishing connection.
    ///
    /// `buffer` bounds the per-subscription queue between the read loop and
    /// the subscribing hub.
    pub fn new(client: redis::Client, conn: MultiplexedConnection, buffer: usize) -> Self {
        Self {
            client,
            conn,
            buffer,
        }
    }

    /// Opens a client for `url` and establishes the publishing connection.
    pub async fn connect(url: &str, buffer: usize) -> Result<Self, BrokerError> {
        let client =
            redis::Client::open(url).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        Ok(Self::new(client, conn, buffer))
    }
}

#[async_trait]
impl Broker for RedisBroker {
    async fn publish(&self, key: &ChannelKey, envelope: &EventEnvelope) -> Result<(), BrokerError> {
        self.publish_raw(key, envelope.to_json()?).await
    }

    async fn publish_raw(&self, key: &ChannelKey, payload: String) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();

        let receivers: i64 = conn
            .publish(key.as_str(), payload)
            .await
            .map_err(|e: redis::RedisError| BrokerError::publish(key, e))?;

        tracing::trace!(channel = %key, receivers, "Published payload");
        Ok(())
    }

    async fn subscribe(&self, key: &ChannelKey) -> Result<Subscription, BrokerError> {
        let conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| BrokerError::subscribe(key, e))?;

        let mut pubsub = conn.into_pubsub();
        pubsub
            .subscribe(key.as_str())
            .await
            .map_err(|e| BrokerError::subscribe(key, e))?;

        let channel = key.clone();
        Ok(Subscription::spawn(key.clone(), self.buffer, move |tx| async move {
            let mut messages = pubsub.into_on_message();

            while let Some(msg) = messages.next().await {
                let raw: String = match msg.get_payload() {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::warn!(channel = %channel, error = %e, "Unreadable broker payload, closing subscription");
                        break;
                    }
                };

                let envelope = match EventEnvelope::from_json(&raw) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        tracing::warn!(channel = %channel, error = %e, "Malformed envelope, closing subscription");
                        break;
                    }
                };

                if tx.send(envelope).await.is_err() {
                    // Subscriber went away.
                    break;
                }
            }

            tracing::debug!(channel = %channel, "Redis read loop finished");
        }))
    }
}
