//! HTTP routes for update endpoints.

use axum::{routing::get, Router};

use super::handlers::{acknowledge_update, get_update, list_updates, UpdateHandlers};

/// Creates the updates router, mounted at `/api/updates`.
pub fn updates_routes(handlers: UpdateHandlers) -> Router {
    Router::new()
        .route("/", get(list_updates))
        .route("/:id", get(get_update).delete(acknowledge_update))
        .with_state(handlers)
}
