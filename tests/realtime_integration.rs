//! End-to-end tests for presence-aware delivery.
//!
//! Wires the notification policy, the in-memory broker, the hub registry and
//! connection adapters driven over in-memory socket halves:
//!
//! ```text
//! SendMessageHandler ─► NotificationPolicy ─► InMemoryBroker ─► Hub ─► ConnectionAdapter
//!                                     └─► InMemoryOfflineUpdateStore
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message as Frame;
use futures::channel::mpsc;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use poputchiki::adapters::broker::InMemoryBroker;
use poputchiki::adapters::memory::{
    InMemoryBlacklist, InMemoryMessageRepository, InMemoryOfflineUpdateStore, InMemoryPresence,
    InMemorySubscriptionPreferences, RecordingSecondaryChannel,
};
use poputchiki::adapters::websocket::{
    Backoff, ConnectionAdapter, ConnectionSettings, HubRegistry, HubSettings, OverflowPolicy,
};
use poputchiki::application::{
    Delivery, NotificationPolicy, RealtimePublisher, SendMessageCommand, SendMessageHandler,
    SendMessageResult,
};
use poputchiki::domain::foundation::{AccessToken, AuthenticatedUser, UserId};
use poputchiki::domain::realtime::{ChannelKey, CloseReason, EventEnvelope, EventKind};
use poputchiki::ports::OfflineUpdateStore;

const NS: &str = "it";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct World {
    broker: Arc<InMemoryBroker>,
    presence: Arc<InMemoryPresence>,
    store: Arc<InMemoryOfflineUpdateStore>,
    registry: Arc<HubRegistry>,
    messages: SendMessageHandler,
}

impl World {
    fn new() -> Self {
        let broker = Arc::new(InMemoryBroker::new());
        let presence = Arc::new(InMemoryPresence::new());
        let store = Arc::new(InMemoryOfflineUpdateStore::new());

        let policy = Arc::new(NotificationPolicy::new(
            presence.clone(),
            broker.clone(),
            store.clone(),
            Arc::new(InMemorySubscriptionPreferences::new()),
            Arc::new(RecordingSecondaryChannel::new()),
            NS,
        ));
        let messages = SendMessageHandler::new(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(InMemoryBlacklist::new()),
            policy,
            RealtimePublisher::new(broker.clone(), NS),
        );

        let registry = Arc::new(HubRegistry::new(
            broker.clone(),
            HubSettings {
                namespace: NS.to_string(),
                ready_timeout: Duration::from_secs(2),
                backoff: Backoff {
                    initial: Duration::from_millis(10),
                    max: Duration::from_millis(100),
                },
            },
        ));

        Self {
            broker,
            presence,
            store,
            registry,
            messages,
        }
    }

    /// Opens a connection for `user` and waits for its handshake, so the
    /// hub subscription is up before the test publishes anything.
    async fn connect(&self, user: UserId) -> Client {
        let mut client = Client::open(self, user);
        let handshake = client.next_envelope().await;
        assert_eq!(handshake.kind(), EventKind::Token);
        client
    }

    async fn send(&self, from: UserId, to: UserId, text: &str) -> SendMessageResult {
        self.messages
            .handle(SendMessageCommand {
                origin: from,
                destination: to,
                text: text.to_string(),
                invite: false,
            })
            .await
            .unwrap()
    }
}

struct Client {
    outbound: mpsc::UnboundedReceiver<Frame>,
    inbound: mpsc::UnboundedSender<Result<Frame, axum::Error>>,
    task: JoinHandle<CloseReason>,
}

impl Client {
    fn open(world: &World, user: UserId) -> Self {
        let (sink, outbound) = mpsc::unbounded::<Frame>();
        let (inbound, stream) = mpsc::unbounded::<Result<Frame, axum::Error>>();
        let settings = ConnectionSettings {
            ping_interval: Duration::from_millis(200),
            write_timeout: Duration::from_secs(1),
            queue_capacity: 16,
            overflow_policy: OverflowPolicy::DropOldest,
        };
        let adapter = ConnectionAdapter::new(
            AuthenticatedUser::new(user, AccessToken::new(format!("token-{}", user))),
            world.registry.clone(),
            settings,
        );
        let task = tokio::spawn(adapter.run(sink, stream));
        Self {
            outbound,
            inbound,
            task,
        }
    }

    async fn next_envelope(&mut self) -> EventEnvelope {
        loop {
            let frame = timeout(Duration::from_secs(2), self.outbound.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed");
            if let Frame::Text(text) = frame {
                return EventEnvelope::from_json(&text).unwrap();
            }
        }
    }

    /// Asserts no text frame arrives within `window`.
    async fn expect_silence(&mut self, window: Duration) {
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Some(frame)) = tokio::time::timeout_at(deadline, self.outbound.next()).await {
            if let Frame::Text(text) = frame {
                panic!("unexpected frame: {}", text);
            }
        }
    }

    async fn close(self) -> CloseReason {
        let _ = self.inbound.unbounded_send(Ok(Frame::Close(None)));
        timeout(Duration::from_secs(2), self.task)
            .await
            .expect("connection did not stop")
            .unwrap()
    }
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn offline_recipient_gets_durable_update_that_survives_reconnect() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();

    let result = world.send(b, a, "see you at the station").await;
    assert!(matches!(
        result,
        SendMessageResult::Sent {
            delivery: Delivery::Stored { .. },
            ..
        }
    ));
    assert_eq!(world.store.count_for(&a), 1);
    assert!(world.broker.published_on(&ChannelKey::realtime(NS, &a)).is_empty());

    // A comes back; the hub is created but the record is untouched.
    world.presence.set_online(a, true);
    let client = world.connect(a).await;
    assert!(world.registry.get(&a).is_some());

    let updates = world.store.list_for_recipient(&a).await.unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].origin, b);
    assert_eq!(updates[0].kind, EventKind::Message);
    assert_eq!(updates[0].payload["text"], "see you at the station");

    assert_eq!(client.close().await, CloseReason::PeerClosed);
}

#[tokio::test]
async fn online_recipient_gets_live_message_and_no_record() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();
    world.presence.set_online(a, true);
    let mut client = world.connect(a).await;

    let result = world.send(b, a, "ride at 9?").await;
    assert!(matches!(
        result,
        SendMessageResult::Sent {
            delivery: Delivery::Live,
            ..
        }
    ));

    let envelope = client.next_envelope().await;
    assert_eq!(envelope.kind(), EventKind::Message);
    assert_eq!(envelope.payload()["text"], "ride at 9?");
    assert_eq!(world.store.count_for(&a), 0);

    client.close().await;
}

#[tokio::test]
async fn live_events_arrive_in_publish_order() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();
    world.presence.set_online(a, true);
    let mut client = world.connect(a).await;

    for n in 0..5 {
        world.send(b, a, &format!("message {}", n)).await;
    }

    for n in 0..5 {
        let envelope = client.next_envelope().await;
        assert_eq!(envelope.payload()["text"], format!("message {}", n));
    }
    client.close().await;
}

// =============================================================================
// Fan-out
// =============================================================================

#[tokio::test]
async fn every_connection_of_a_user_receives_the_event() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();
    world.presence.set_online(a, true);
    let mut phone = world.connect(a).await;
    let mut laptop = world.connect(a).await;

    world.send(b, a, "both of you").await;

    assert_eq!(phone.next_envelope().await.payload()["text"], "both of you");
    assert_eq!(laptop.next_envelope().await.payload()["text"], "both of you");
    assert_eq!(world.registry.get(&a).unwrap().connection_count(), 2);

    phone.close().await;
    laptop.close().await;
}

#[tokio::test]
async fn closed_connection_stops_receiving_without_errors() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();
    world.presence.set_online(a, true);
    let gone = world.connect(a).await;
    let mut stays = world.connect(a).await;

    assert_eq!(gone.close().await, CloseReason::PeerClosed);
    assert_eq!(world.registry.get(&a).unwrap().connection_count(), 1);

    world.send(b, a, "still here?").await;
    assert_eq!(stays.next_envelope().await.payload()["text"], "still here?");
    stays.expect_silence(Duration::from_millis(50)).await;

    stays.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_connections_share_one_subscription() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();
    world.presence.set_online(a, true);

    let mut clients: Vec<Client> = (0..8).map(|_| Client::open(&world, a)).collect();
    for client in clients.iter_mut() {
        assert_eq!(client.next_envelope().await.kind(), EventKind::Token);
    }

    assert_eq!(world.registry.hub_count(), 1);
    assert_eq!(
        world.broker.subscribe_count(&ChannelKey::realtime(NS, &a)),
        1
    );

    world.send(b, a, "once each").await;
    for client in clients.iter_mut() {
        assert_eq!(client.next_envelope().await.payload()["text"], "once each");
        client.expect_silence(Duration::from_millis(30)).await;
    }

    for client in clients {
        client.close().await;
    }
}

#[tokio::test]
async fn hub_outlives_its_last_connection_until_evicted() {
    let world = World::new();
    let a = UserId::new();
    world.presence.set_online(a, true);

    let client = world.connect(a).await;
    client.close().await;

    let hub = world.registry.get(&a).unwrap();
    assert_eq!(hub.connection_count(), 0);
    assert!(world.registry.evict(&a));
    assert_eq!(world.registry.hub_count(), 0);

    // A new connection builds a fresh hub with its own subscription.
    let client = world.connect(a).await;
    assert_eq!(
        world.broker.subscribe_count(&ChannelKey::realtime(NS, &a)),
        2
    );
    client.close().await;
}

#[tokio::test]
async fn blacklisted_sender_is_told_live() {
    let world = World::new();
    let a = UserId::new();
    let b = UserId::new();

    let blacklist = Arc::new(InMemoryBlacklist::new());
    blacklist.block(a, b);
    let policy = Arc::new(NotificationPolicy::new(
        world.presence.clone(),
        world.broker.clone(),
        world.store.clone(),
        Arc::new(InMemorySubscriptionPreferences::new()),
        Arc::new(RecordingSecondaryChannel::new()),
        NS,
    ));
    let handler = SendMessageHandler::new(
        Arc::new(InMemoryMessageRepository::new()),
        blacklist,
        policy,
        RealtimePublisher::new(world.broker.clone(), NS),
    );

    world.presence.set_online(b, true);
    let mut sender = world.connect(b).await;

    let result = handler
        .handle(SendMessageCommand {
            origin: b,
            destination: a,
            text: "hello?".to_string(),
            invite: false,
        })
        .await
        .unwrap();

    assert!(matches!(result, SendMessageResult::Refused));
    let refusal = sender.next_envelope().await;
    assert_eq!(refusal.kind(), EventKind::MessageSendBlacklisted);
    assert_eq!(world.store.count_for(&a), 0);

    sender.close().await;
}
