//! HTTP routes for social endpoints.

use axum::{routing::post, Router};

use super::handlers::{record_guest_visit, send_message, SocialHandlers};

/// Creates the social router, mounted at `/api/user`.
pub fn social_routes(handlers: SocialHandlers) -> Router {
    Router::new()
        .route("/:id/messages", post(send_message))
        .route("/:id/guests", post(record_guest_visit))
        .with_state(handlers)
}
