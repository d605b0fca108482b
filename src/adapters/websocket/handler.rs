//! WebSocket upgrade handler for realtime connections.
//!
//! Route: `GET /api/realtime`. The caller must already be authenticated by
//! `auth_middleware` (header or `?token=`); the socket itself is driven by
//! [`ConnectionAdapter`].

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::get,
    Router,
};
use futures::StreamExt;

use crate::adapters::http::middleware::RequireAuth;

use super::connection::{ConnectionAdapter, ConnectionSettings};
use super::registry::HubRegistry;

/// State required for realtime upgrades.
#[derive(Clone)]
pub struct RealtimeState {
    pub registry: Arc<HubRegistry>,
    pub settings: ConnectionSettings,
}

impl RealtimeState {
    pub fn new(registry: Arc<HubRegistry>, settings: ConnectionSettings) -> Self {
        Self { registry, settings }
    }
}

/// Upgrades an authenticated request and runs the connection until it
/// closes.
pub async fn ws_handler(
    RequireAuth(user): RequireAuth,
    State(state): State<RealtimeState>,
    ws: WebSocketUpgrade,
) -> Response {
    tracing::debug!(user_id = %user.id, "Realtime upgrade");

    ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        ConnectionAdapter::new(user, state.registry, state.settings)
            .run(sink, stream)
            .await;
    })
}

/// Router for the realtime endpoint, mounted under `/api`.
pub fn realtime_router(state: RealtimeState) -> Router {
    Router::new()
        .route("/realtime", get(ws_handler))
        .with_state(state)
}
