//! One live duplex connection.
//!
//! Lifecycle:
//! 1. Register an outbound queue with the user's hub
//! 2. Write the `token` handshake envelope
//! 3. Run heartbeat, delivery and read loops until the first one stops
//! 4. Stop the rest, unregister, close the socket
//!
//! The adapter is generic over the socket halves so tests can drive it
//! with in-memory channels instead of a real WebSocket.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::domain::foundation::{AuthenticatedUser, ConnectionId, StateMachine};
use crate::domain::realtime::{CloseReason, ConnectionState, EventEnvelope, EventKind};

use super::queue::{OutboundQueue, OverflowPolicy};
use super::registry::HubRegistry;

/// Per-connection tuning.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub ping_interval: Duration,
    pub write_timeout: Duration,
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_millis(1000),
            write_timeout: Duration::from_secs(5),
            queue_capacity: 10,
            overflow_policy: OverflowPolicy::DropOldest,
        }
    }
}

type SharedSink<W> = Arc<Mutex<W>>;

/// Drives a single WebSocket for an authenticated user.
pub struct ConnectionAdapter {
    id: ConnectionId,
    user: AuthenticatedUser,
    registry: Arc<HubRegistry>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

impl ConnectionAdapter {
    pub fn new(
        user: AuthenticatedUser,
        registry: Arc<HubRegistry>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            user,
            registry,
            settings,
            state: ConnectionState::Connecting,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn advance(&mut self, next: ConnectionState) {
        match self.state.transition_to(next) {
            Ok(state) => self.state = state,
            Err(e) => tracing::warn!(connection_id = %self.id, error = %e, "Ignored connection transition"),
        }
    }

    fn handshake(&self) -> EventEnvelope {
        EventEnvelope::new(
            EventKind::Token,
            json!({
                "id": self.user.id,
                "token": self.user.token.expose(),
            }),
        )
    }

    /// Runs the connection to completion and returns why it closed.
    pub async fn run<W, R, E>(mut self, sink: W, stream: R) -> CloseReason
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let user_id = self.user.id;
        let queue = Arc::new(OutboundQueue::new(
            self.settings.queue_capacity,
            self.settings.overflow_policy,
        ));

        let hub = self.registry.attach(&user_id, self.id, queue.clone()).await;
        let sink: SharedSink<W> = Arc::new(Mutex::new(sink));

        let reason = match write_envelope(&sink, &self.handshake(), self.settings.write_timeout).await {
            Ok(()) => {
                self.advance(ConnectionState::Open);
                tracing::info!(user_id = %user_id, connection_id = %self.id, "Connection open");
                self.serve(&sink, stream, &queue).await
            }
            Err(e) => {
                tracing::debug!(connection_id = %self.id, error = %e, "Handshake write failed");
                CloseReason::WriteFailed
            }
        };

        self.advance(ConnectionState::Closing);
        queue.close();
        hub.unregister(&self.id);

        let mut sink = sink.lock().await;
        let connection_id = self.id;
        let teardown = tokio::time::timeout(self.settings.write_timeout, async {
            if let Err(e) = sink.send(Message::Close(None)).await {
                tracing::debug!(connection_id = %connection_id, error = %e, "Close frame write failed");
            }
            if let Err(e) = sink.close().await {
                tracing::debug!(connection_id = %connection_id, error = %e, "Socket close failed");
            }
        })
        .await;
        if teardown.is_err() {
            tracing::debug!(connection_id = %self.id, "Socket close timed out");
        }
        drop(sink);

        self.advance(ConnectionState::Closed);
        tracing::info!(user_id = %user_id, connection_id = %self.id, reason = ?reason, "Connection closed");
        reason
    }

    async fn serve<W, R, E>(&self, sink: &SharedSink<W>, stream: R, queue: &Arc<OutboundQueue>) -> CloseReason
    where
        W: Sink<Message> + Unpin + Send + 'static,
        W::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
        E: Display + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        tasks.spawn(heartbeat(self.id, sink.clone(), self.settings));
        tasks.spawn(deliver(self.id, sink.clone(), queue.clone(), self.settings.write_timeout));
        tasks.spawn(read(self.id, stream));

        let reason = match tasks.join_next().await {
            Some(Ok(reason)) => reason,
            Some(Err(e)) => {
                tracing::error!(connection_id = %self.id, error = %e, "Connection task failed");
                CloseReason::TaskFailed
            }
            None => CloseReason::TaskFailed,
        };

        // Aborts and joins the remaining loops.
        tasks.shutdown().await;
        reason
    }
}

async fn write_envelope<W>(
    sink: &SharedSink<W>,
    envelope: &EventEnvelope,
    deadline: Duration,
) -> Result<(), String>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let text = envelope.to_json().map_err(|e| e.to_string())?;
    write_frame(sink, Message::Text(text), deadline).await
}

async fn write_frame<W>(sink: &SharedSink<W>, frame: Message, deadline: Duration) -> Result<(), String>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut sink = sink.lock().await;
    match tokio::time::timeout(deadline, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("write timed out after {}ms", deadline.as_millis())),
    }
}

async fn heartbeat<W>(id: ConnectionId, sink: SharedSink<W>, settings: ConnectionSettings) -> CloseReason
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut ticker = tokio::time::interval(settings.ping_interval);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = write_frame(&sink, Message::Ping(Vec::new()), settings.write_timeout).await {
            tracing::debug!(connection_id = %id, error = %e, "Heartbeat failed");
            return CloseReason::HeartbeatFailed;
        }
    }
}

async fn deliver<W>(
    id: ConnectionId,
    sink: SharedSink<W>,
    queue: Arc<OutboundQueue>,
    write_timeout: Duration,
) -> CloseReason
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(envelope) = queue.recv().await {
        if let Err(e) = write_envelope(&sink, &envelope, write_timeout).await {
            tracing::debug!(connection_id = %id, error = %e, "Delivery failed");
            return CloseReason::WriteFailed;
        }
    }
    CloseReason::QueueClosed
}

async fn read<R, E>(id: ConnectionId, mut stream: R) -> CloseReason
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %id, "Peer sent close frame");
                return CloseReason::PeerClosed;
            }
            Ok(_) => {
                // Inbound frames carry nothing; pongs are handled by the socket.
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Read failed");
                return CloseReason::ReadFailed;
            }
        }
    }
    CloseReason::PeerClosed
}
