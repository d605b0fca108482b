//! Integration tests for the assembled `/api` router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use poputchiki::adapters::auth::MockTokenValidator;
use poputchiki::adapters::broker::InMemoryBroker;
use poputchiki::adapters::http::{api_router, AuthState, SocialHandlers, UpdateHandlers};
use poputchiki::adapters::memory::{
    InMemoryBlacklist, InMemoryGuestRepository, InMemoryMessageRepository,
    InMemoryOfflineUpdateStore, InMemoryPresence, InMemorySubscriptionPreferences,
    RecordingSecondaryChannel,
};
use poputchiki::adapters::websocket::{
    ConnectionSettings, HubRegistry, HubSettings, RealtimeState,
};
use poputchiki::application::{
    NotificationPolicy, RealtimePublisher, RecordGuestVisitHandler, SendMessageHandler,
};
use poputchiki::domain::foundation::{AuthError, UserId};
use poputchiki::domain::realtime::{ChannelKey, EventKind};

const NAMESPACE: &str = "poputchiki";

struct App {
    router: Router,
    policy: Arc<NotificationPolicy>,
    registry: Arc<HubRegistry>,
    broker: Arc<InMemoryBroker>,
    presence: Arc<InMemoryPresence>,
    store: Arc<InMemoryOfflineUpdateStore>,
    messages: Arc<InMemoryMessageRepository>,
    guests: Arc<InMemoryGuestRepository>,
    blacklist: Arc<InMemoryBlacklist>,
    user: UserId,
}

fn app_with(validator: MockTokenValidator, user: UserId) -> App {
    let broker = Arc::new(InMemoryBroker::new());
    let presence = Arc::new(InMemoryPresence::new());
    let store = Arc::new(InMemoryOfflineUpdateStore::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let guests = Arc::new(InMemoryGuestRepository::new());
    let blacklist = Arc::new(InMemoryBlacklist::new());
    let registry = Arc::new(HubRegistry::new(broker.clone(), HubSettings::default()));

    let policy = Arc::new(NotificationPolicy::new(
        presence.clone(),
        broker.clone(),
        store.clone(),
        Arc::new(InMemorySubscriptionPreferences::new()),
        Arc::new(RecordingSecondaryChannel::new()),
        NAMESPACE,
    ));
    let social = SocialHandlers::new(
        Arc::new(SendMessageHandler::new(
            messages.clone(),
            blacklist.clone(),
            policy.clone(),
            RealtimePublisher::new(broker.clone(), NAMESPACE),
        )),
        Arc::new(RecordGuestVisitHandler::new(guests.clone(), policy.clone())),
    );

    let auth: AuthState = Arc::new(validator);
    let router = api_router(
        auth,
        RealtimeState::new(registry.clone(), ConnectionSettings::default()),
        UpdateHandlers::new(store.clone()),
        social,
    );

    App {
        router,
        policy,
        registry,
        broker,
        presence,
        store,
        messages,
        guests,
        blacklist,
        user,
    }
}

fn app() -> App {
    let user = UserId::new();
    app_with(MockTokenValidator::new().with_user("good-token", user), user)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", "Bearer good-token")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn realtime_without_token_is_401() {
    let app = app();
    let response = app.router.oneshot(get("/api/realtime")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "UNAUTHENTICATED");
    assert_eq!(app.registry.hub_count(), 0);
}

#[tokio::test]
async fn realtime_with_unknown_token_is_401() {
    let app = app();
    let response = app
        .router
        .oneshot(get("/api/realtime?token=forged"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn authenticated_plain_get_is_not_upgraded() {
    let app = app();
    let response = app
        .router
        .oneshot(get("/api/realtime?token=good-token"))
        .await
        .unwrap();

    // Authenticated, but not a WebSocket handshake.
    assert!(response.status().is_client_error());
    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.registry.hub_count(), 0);
}

#[tokio::test]
async fn token_store_outage_is_503() {
    let user = UserId::new();
    let app = app_with(
        MockTokenValidator::new().with_error(AuthError::service_unavailable("redis down")),
        user,
    );
    let response = app
        .router
        .oneshot(get("/api/updates?token=anything"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn stored_updates_are_listed_newest_first() {
    let app = app();
    let origin = UserId::new();
    for text in ["first", "second"] {
        app.policy
            .handle(&app.user, &origin, EventKind::Message, json!({ "text": text }))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/api/updates")
                .header("Authorization", "Bearer good-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let updates = body["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0]["body"]["text"], "second");
    assert_eq!(updates[1]["body"]["text"], "first");
    assert_eq!(updates[0]["origin"], json!(origin));
}

#[tokio::test]
async fn message_to_offline_user_is_stored() {
    let app = app();
    let bob = UserId::new();

    let response = app
        .router
        .oneshot(post(
            &format!("/api/user/{}/messages", bob),
            json!({ "text": "ride to Kazan tomorrow?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["delivery"]["via"], "stored");
    assert_eq!(body["message"]["origin"], json!(app.user));

    assert_eq!(app.messages.all().len(), 1);
    let records = app.store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].recipient, bob);
    assert_eq!(records[0].origin, app.user);
    assert_eq!(records[0].kind, EventKind::Message);
}

#[tokio::test]
async fn invite_to_online_user_is_published_live() {
    let app = app();
    let bob = UserId::new();
    app.presence.set_online(bob, true);

    let response = app
        .router
        .oneshot(post(
            &format!("/api/user/{}/messages", bob),
            json!({ "text": "join me", "invite": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(json_body(response).await["delivery"]["via"], "live");

    let sent = app.broker.published_on(&ChannelKey::realtime(NAMESPACE, &bob));
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind(), EventKind::Invite);
    assert_eq!(sent[0].payload()["text"], "join me");
    assert!(app.store.all().is_empty());
}

#[tokio::test]
async fn blacklisted_sender_is_403_and_told_live() {
    let app = app();
    let bob = UserId::new();
    app.blacklist.block(bob, app.user);

    let response = app
        .router
        .oneshot(post(
            &format!("/api/user/{}/messages", bob),
            json!({ "text": "hello?" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(response).await["code"], "BLACKLISTED");
    assert!(app.messages.all().is_empty());

    let refusals = app
        .broker
        .published_on(&ChannelKey::realtime(NAMESPACE, &app.user));
    assert_eq!(refusals.len(), 1);
    assert_eq!(refusals[0].kind(), EventKind::MessageSendBlacklisted);
}

#[tokio::test]
async fn blank_message_is_400() {
    let app = app();
    let response = app
        .router
        .oneshot(post(
            &format!("/api/user/{}/messages", UserId::new()),
            json!({ "text": "  " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.all().is_empty());
}

#[tokio::test]
async fn guest_visit_notifies_profile_owner() {
    let app = app();
    let owner = UserId::new();

    let response = app
        .router
        .oneshot(post(&format!("/api/user/{}/guests", owner), json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["visit"]["guest"], json!(app.user));
    assert_eq!(body["delivery"]["via"], "stored");

    assert_eq!(app.guests.visits_of(&owner).len(), 1);
    let records = app.store.all();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, EventKind::Guest);
    assert_eq!(records[0].origin, app.user);
}

#[tokio::test]
async fn producer_with_malformed_user_id_is_400() {
    let app = app();
    let response = app
        .router
        .oneshot(post("/api/user/not-a-user/guests", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.all().is_empty());
}

#[tokio::test]
async fn producer_without_token_is_401() {
    let app = app();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/user/{}/guests", UserId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.guests.visits_of(&app.user).is_empty());
}
