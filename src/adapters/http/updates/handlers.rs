//! HTTP handlers for update endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::domain::foundation::{DomainError, ErrorCode, UpdateId};
use crate::ports::OfflineUpdateStore;

use super::dto::{ErrorResponse, UpdateListResponse, UpdateResponse};

#[derive(Clone)]
pub struct UpdateHandlers {
    store: Arc<dyn OfflineUpdateStore>,
}

impl UpdateHandlers {
    pub fn new(store: Arc<dyn OfflineUpdateStore>) -> Self {
        Self { store }
    }
}

/// GET /api/updates
pub async fn list_updates(
    State(handlers): State<UpdateHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    match handlers.store.list_for_recipient(&user.id).await {
        Ok(updates) => {
            let response = UpdateListResponse {
                updates: updates.into_iter().map(UpdateResponse::from).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_store_error(e),
    }
}

/// GET /api/updates/:id
pub async fn get_update(
    State(handlers): State<UpdateHandlers>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UpdateId>,
) -> Response {
    match handlers.store.get(&id).await {
        // Someone else's record is reported as missing.
        Ok(Some(update)) if update.recipient == user.id => {
            (StatusCode::OK, Json(UpdateResponse::from(update))).into_response()
        }
        Ok(_) => (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found(&id))).into_response(),
        Err(e) => handle_store_error(e),
    }
}

/// DELETE /api/updates/:id
pub async fn acknowledge_update(
    State(handlers): State<UpdateHandlers>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<UpdateId>,
) -> Response {
    match handlers.store.remove(&user.id, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found(&id))).into_response(),
        Err(e) => handle_store_error(e),
    }
}

fn handle_store_error(error: DomainError) -> Response {
    tracing::error!(code = %error.code, error = %error, "Offline update store failed");
    let message = match error.code {
        ErrorCode::DatabaseError => "Update store unavailable",
        _ => "An unexpected error occurred",
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal(message)),
    )
        .into_response()
}
