//! Per-user hub: one broker subscription, many connections.
//!
//! ```text
//!                     ┌──────────────► queue(conn-a) ──► socket a
//! broker ──► Hub(user)├──────────────► queue(conn-b) ──► socket b
//!                     └──────────────► queue(conn-c) ──► socket c
//! ```
//!
//! The hub owns a supervised fan-out task. The task subscribes to the
//! user's channel, copies every envelope onto each registered queue, and
//! re-subscribes with exponential backoff whenever the subscription fails
//! or ends. Aborting the task (on eviction or drop) releases the
//! subscription.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::foundation::{ConnectionId, UserId};
use crate::domain::realtime::{ChannelKey, EventEnvelope};
use crate::ports::Broker;

use super::queue::{OutboundQueue, PushOutcome};

/// Upstream subscription status, observable by waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// First subscribe attempt still in flight.
    Pending,
    /// Subscription established; published envelopes will be delivered.
    Subscribed,
    /// Last attempt failed or the stream ended; waiting to retry.
    Retrying,
}

/// Exponential backoff bounds for re-subscription.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(30),
        }
    }
}

/// Registered connection queues plus idle bookkeeping.
#[derive(Debug)]
struct ConnectionSet {
    queues: RwLock<HashMap<ConnectionId, Arc<OutboundQueue>>>,
    empty_since: Mutex<Option<Instant>>,
}

impl ConnectionSet {
    fn new() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            empty_since: Mutex::new(Some(Instant::now())),
        }
    }

    fn fan_out(&self, user_id: &UserId, envelope: Arc<EventEnvelope>) -> usize {
        let queues = self.queues.read().unwrap_or_else(PoisonError::into_inner);
        let mut queued = 0;

        for (connection_id, queue) in queues.iter() {
            match queue.push(envelope.clone()) {
                PushOutcome::Queued => queued += 1,
                PushOutcome::DroppedOldest => {
                    queued += 1;
                    tracing::debug!(
                        user_id = %user_id,
                        connection_id = %connection_id,
                        "Outbound queue full, dropped oldest envelope"
                    );
                }
                PushOutcome::Overflowed => {
                    tracing::warn!(
                        user_id = %user_id,
                        connection_id = %connection_id,
                        "Outbound queue overflow, disconnecting slow connection"
                    );
                }
                PushOutcome::Closed => {}
            }
        }

        queued
    }
}

/// Fan-out point for one user's live connections.
pub struct Hub {
    user_id: UserId,
    channel: ChannelKey,
    connections: Arc<ConnectionSet>,
    state: watch::Receiver<SubscriptionState>,
    fan_out: JoinHandle<()>,
}

impl Hub {
    /// Creates the hub and starts its fan-out task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        user_id: UserId,
        channel: ChannelKey,
        broker: Arc<dyn Broker>,
        backoff: Backoff,
    ) -> Self {
        let connections = Arc::new(ConnectionSet::new());
        let (state_tx, state) = watch::channel(SubscriptionState::Pending);

        let fan_out = tokio::spawn(run_fan_out(
            user_id,
            channel.clone(),
            broker,
            connections.clone(),
            state_tx,
            backoff,
        ));

        Self {
            user_id,
            channel,
            connections,
            state,
            fan_out,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn channel(&self) -> &ChannelKey {
        &self.channel
    }

    /// Adds a connection queue to the fan-out set.
    pub fn register(&self, connection_id: ConnectionId, queue: Arc<OutboundQueue>) {
        self.connections
            .queues
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection_id, queue);
        *self
            .connections
            .empty_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;

        tracing::debug!(user_id = %self.user_id, connection_id = %connection_id, "Connection registered");
    }

    /// Removes a connection. Returns false if it was not registered.
    pub fn unregister(&self, connection_id: &ConnectionId) -> bool {
        let mut queues = self
            .connections
            .queues
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let removed = queues.remove(connection_id).is_some();

        if removed && queues.is_empty() {
            *self
                .connections
                .empty_since
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        }
        drop(queues);

        if removed {
            tracing::debug!(user_id = %self.user_id, connection_id = %connection_id, "Connection unregistered");
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// How long the hub has had no connections, if it has none.
    pub fn idle_for(&self) -> Option<Duration> {
        self.connections
            .empty_since
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|since| since.elapsed())
    }

    /// Pushes an envelope to every registered queue. Returns how many
    /// queues accepted it.
    pub fn fan_out(&self, envelope: Arc<EventEnvelope>) -> usize {
        self.connections.fan_out(&self.user_id, envelope)
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Waits until the first subscribe attempt has completed, or `timeout`
    /// elapses. Returns the state observed at that point.
    pub async fn wait_ready(&self, timeout: Duration) -> SubscriptionState {
        let mut state = self.state.clone();
        let settled = tokio::time::timeout(
            timeout,
            state.wait_for(|s| *s != SubscriptionState::Pending),
        )
        .await;

        match settled {
            Ok(Ok(current)) => *current,
            _ => self.subscription_state(),
        }
    }

    /// Stops the fan-out task and releases the subscription.
    pub fn shutdown(&self) {
        self.fan_out.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.fan_out.is_finished()
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        self.fan_out.abort();
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("user_id", &self.user_id)
            .field("channel", &self.channel)
            .field("connections", &self.connection_count())
            .field("state", &self.subscription_state())
            .finish()
    }
}

async fn run_fan_out(
    user_id: UserId,
    channel: ChannelKey,
    broker: Arc<dyn Broker>,
    connections: Arc<ConnectionSet>,
    state: watch::Sender<SubscriptionState>,
    backoff: Backoff,
) {
    let mut delay = backoff.initial;

    loop {
        match broker.subscribe(&channel).await {
            Ok(mut subscription) => {
                delay = backoff.initial;
                state.send_replace(SubscriptionState::Subscribed);
                tracing::debug!(user_id = %user_id, channel = %channel, "Hub subscribed");

                while let Some(envelope) = subscription.next().await {
                    connections.fan_out(&user_id, Arc::new(envelope));
                }

                tracing::warn!(
                    user_id = %user_id,
                    channel = %channel,
                    retry_in_ms = delay.as_millis() as u64,
                    "Hub subscription ended, re-subscribing"
                );
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    channel = %channel,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Hub subscribe failed"
                );
            }
        }

        state.send_replace(SubscriptionState::Retrying);
        tokio::time::sleep(delay).await;
        delay = backoff.next(delay);
    }
}
