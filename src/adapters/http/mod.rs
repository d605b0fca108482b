//! HTTP adapters - REST and WebSocket endpoints.
//!
//! Every route sits behind `auth_middleware`; handlers that need a caller
//! extract it with `RequireAuth`.

pub mod middleware;
pub mod social;
pub mod updates;

use axum::Router;

use crate::adapters::websocket::{realtime_router, RealtimeState};

pub use middleware::{auth_middleware, AuthRejection, AuthState, RequireAuth};
pub use social::{social_routes, SocialHandlers};
pub use updates::{updates_routes, UpdateHandlers};

/// Builds the `/api` router:
///
/// - `GET /api/realtime` - WebSocket upgrade
/// - `/api/updates` - offline update endpoints
/// - `/api/user/:id/...` - social actions that notify `:id`
pub fn api_router(
    auth: AuthState,
    realtime: RealtimeState,
    updates: UpdateHandlers,
    social: SocialHandlers,
) -> Router {
    let api = Router::new()
        .merge(realtime_router(realtime))
        .nest("/updates", updates_routes(updates))
        .nest("/user", social_routes(social));

    Router::new()
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
}
