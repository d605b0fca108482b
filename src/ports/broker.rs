//! Broker port - publish/subscribe transport for realtime envelopes.
//!
//! The broker is the only thing two processes share: a publisher on one
//! node and a user's hub on another meet on the same `ChannelKey`.
//!
//! ```text
//! publish(key, envelope) ──► broker ──► Subscription(key) ──► Hub
//! ```
//!
//! A [`Subscription`] owns its background read loop. Dropping the handle
//! aborts the loop, so no reader outlives the hub that asked for it.

use std::future::Future;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::realtime::{ChannelKey, EventEnvelope};

/// Errors raised by broker adapters.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Could not reach the broker.
    #[error("Broker connection failed: {0}")]
    Connection(String),

    /// PUBLISH was rejected or the connection dropped mid-command.
    #[error("Publish to {channel} failed: {reason}")]
    Publish { channel: String, reason: String },

    /// SUBSCRIBE was rejected.
    #[error("Subscribe to {channel} failed: {reason}")]
    Subscribe { channel: String, reason: String },

    /// Envelope could not be encoded.
    #[error("Envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrokerError {
    pub fn publish(channel: &ChannelKey, reason: impl ToString) -> Self {
        Self::Publish {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn subscribe(channel: &ChannelKey, reason: impl ToString) -> Self {
        Self::Subscribe {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Live subscription to one channel.
///
/// Envelopes arrive through a bounded queue filled by the adapter's read
/// loop. `next()` returns `None` once the read loop has terminated (broker
/// disconnect, malformed payload), which is the caller's cue to
/// re-subscribe.
pub struct Subscription {
    key: ChannelKey,
    receiver: mpsc::Receiver<EventEnvelope>,
    reader: JoinHandle<()>,
}

impl Subscription {
    /// Spawns `read_loop` with the sending half of a bounded queue of
    /// `capacity` envelopes and returns the owning handle.
    pub fn spawn<F, Fut>(key: ChannelKey, capacity: usize, read_loop: F) -> Self
    where
        F: FnOnce(mpsc::Sender<EventEnvelope>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, receiver) = mpsc::channel(capacity.max(1));
        let reader = tokio::spawn(read_loop(tx));
        Self {
            key,
            receiver,
            reader,
        }
    }

    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    /// Waits for the next envelope. `None` means the subscription is dead.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}

/// Port for the external publish/subscribe broker.
///
/// Implementations must:
/// - Encode envelopes in the JSON wire format
/// - Treat publishing to a channel with no subscribers as success
/// - Never panic inside the read loop; log and terminate instead
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish one envelope on `key`.
    async fn publish(&self, key: &ChannelKey, envelope: &EventEnvelope) -> Result<(), BrokerError>;

    /// Publish an already encoded payload on `key`.
    ///
    /// Used for channels whose consumers are not hubs, such as the mailer.
    async fn publish_raw(&self, key: &ChannelKey, payload: String) -> Result<(), BrokerError>;

    /// Subscribe to `key`. The subscription is established when this returns.
    async fn subscribe(&self, key: &ChannelKey) -> Result<Subscription, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::domain::realtime::EventKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn Broker) {}

    #[tokio::test]
    async fn subscription_yields_envelopes_from_read_loop() {
        let key = ChannelKey::realtime("test", &UserId::new());
        let mut sub = Subscription::spawn(key, 4, |tx| async move {
            let envelope = EventEnvelope::new(EventKind::Message, json!({"n": 1}));
            let _ = tx.send(envelope).await;
        });

        let received = sub.next().await.unwrap();
        assert_eq!(received.payload()["n"], 1);
        // Read loop finished, so the queue closes.
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_subscription_aborts_read_loop() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();
        let key = ChannelKey::realtime("test", &UserId::new());

        let sub = Subscription::spawn(key, 4, move |_tx| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            flag.store(true, Ordering::SeqCst);
        });
        drop(sub);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn publish_error_names_channel() {
        let key = ChannelKey::realtime("ns", &UserId::new());
        let err = BrokerError::publish(&key, "connection reset");
        assert!(err.to_string().contains(key.as_str()));
    }
}
