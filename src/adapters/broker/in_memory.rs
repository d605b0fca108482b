//! In-memory broker implementation for testing.
//!
//! Envelopes are serialized to JSON on publish and parsed again by each
//! subscription's read loop, so tests exercise the same wire format as the
//! Redis adapter.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::domain::realtime::{ChannelKey, EventEnvelope};
use crate::ports::{Broker, BrokerError, Subscription};

const CHANNEL_CAPACITY: usize = 256;

/// Process-local broker with inspection hooks.
///
/// Features:
/// - Publish capture for assertions
/// - Per-channel subscribe counter
/// - Failure injection for publish and subscribe
/// - `disconnect` to end every subscription on a channel
pub struct InMemoryBroker {
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    subscribe_counts: Mutex<HashMap<String, usize>>,
    published: Mutex<Vec<(ChannelKey, EventEnvelope)>>,
    raw_published: Mutex<Vec<(ChannelKey, String)>>,
    fail_publish: AtomicBool,
    fail_subscribe: AtomicBool,
    buffer: usize,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_buffer(100)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            subscribe_counts: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
            raw_published: Mutex::new(Vec::new()),
            fail_publish: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            buffer,
        }
    }

    // === Test Helpers ===

    /// Number of successful `subscribe` calls for a channel.
    pub fn subscribe_count(&self, key: &ChannelKey) -> usize {
        self.subscribe_counts
            .lock()
            .expect("InMemoryBroker: counts lock poisoned")
            .get(key.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Everything published so far, in order.
    pub fn published(&self) -> Vec<(ChannelKey, EventEnvelope)> {
        self.published
            .lock()
            .expect("InMemoryBroker: published lock poisoned")
            .clone()
    }

    /// Envelopes published on one channel.
    pub fn published_on(&self, key: &ChannelKey) -> Vec<EventEnvelope> {
        self.published()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, envelope)| envelope)
            .collect()
    }

    /// Makes subsequent publishes fail.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent subscribes fail.
    pub fn fail_subscriptions(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Drops the channel, ending every live subscription on it.
    pub fn disconnect(&self, key: &ChannelKey) {
        self.channels
            .lock()
            .expect("InMemoryBroker: channels lock poisoned")
            .remove(key.as_str());
    }

    /// Payloads sent through `publish_raw` on one channel, in order.
    pub fn raw_published_on(&self, key: &ChannelKey) -> Vec<String> {
        self.raw_published
            .lock()
            .expect("InMemoryBroker: raw lock poisoned")
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, raw)| raw.clone())
            .collect()
    }

    /// Injects a payload straight into live subscriptions, bypassing capture
    /// and failure injection.
    pub fn inject(&self, key: &ChannelKey, raw: &str) {
        self.send(key, raw.to_string());
    }

    fn send(&self, key: &ChannelKey, raw: String) {
        let channels = self
            .channels
            .lock()
            .expect("InMemoryBroker: channels lock poisoned");
        if let Some(sender) = channels.get(key.as_str()) {
            // No receivers is fine, same as PUBLISH to an empty channel.
            let _ = sender.send(raw);
        }
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn publish(&self, key: &ChannelKey, envelope: &EventEnvelope) -> Result<(), BrokerError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::publish(key, "injected failure"));
        }

        let raw = envelope.to_json()?;
        self.published
            .lock()
            .expect("InMemoryBroker: published lock poisoned")
            .push((key.clone(), envelope.clone()));
        self.send(key, raw);
        Ok(())
    }

    async fn publish_raw(&self, key: &ChannelKey, payload: String) -> Result<(), BrokerError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(BrokerError::publish(key, "injected failure"));
        }

        self.raw_published
            .lock()
            .expect("InMemoryBroker: raw lock poisoned")
            .push((key.clone(), payload.clone()));
        self.send(key, payload);
        Ok(())
    }

    async fn subscribe(&self, key: &ChannelKey) -> Result<Subscription, BrokerError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(BrokerError::subscribe(key, "injected failure"));
        }

        let mut rx = {
            let mut channels = self
                .channels
                .lock()
                .expect("InMemoryBroker: channels lock poisoned");
            channels
                .entry(key.as_str().to_string())
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe()
        };

        *self
            .subscribe_counts
            .lock()
            .expect("InMemoryBroker: counts lock poisoned")
            .entry(key.as_str().to_string())
            .or_insert(0) += 1;

        let channel = key.clone();
        Ok(Subscription::spawn(key.clone(), self.buffer, move |tx| async move {
            loop {
                let raw = match rx.recv().await {
                    Ok(raw) => raw,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(channel = %channel, skipped, "Subscriber lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                match EventEnvelope::from_json(&raw) {
                    Ok(envelope) => {
                        if tx.send(envelope).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(channel = %channel, error = %e, "Malformed envelope, closing subscription");
                        break;
                    }
                }
            }
        }))
    }
}
