//! HTTP handlers for social endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::updates::ErrorResponse;
use crate::application::{
    NotificationError, RecordGuestVisitCommand, RecordGuestVisitError, RecordGuestVisitHandler,
    SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult,
};
use crate::domain::foundation::{DomainError, UserId};

use super::dto::{GuestVisitResponse, SendMessageRequest, SentMessageResponse};

#[derive(Clone)]
pub struct SocialHandlers {
    send_message: Arc<SendMessageHandler>,
    record_visit: Arc<RecordGuestVisitHandler>,
}

impl SocialHandlers {
    pub fn new(send_message: Arc<SendMessageHandler>, record_visit: Arc<RecordGuestVisitHandler>) -> Self {
        Self {
            send_message,
            record_visit,
        }
    }
}

/// POST /api/user/:id/messages
pub async fn send_message(
    State(handlers): State<SocialHandlers>,
    RequireAuth(user): RequireAuth,
    Path(destination): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let destination = match parse_user_id(&destination) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = SendMessageCommand {
        origin: user.id,
        destination,
        text: req.text,
        invite: req.invite,
    };

    match handlers.send_message.handle(cmd).await {
        Ok(SendMessageResult::Sent { message, delivery }) => {
            let response = SentMessageResponse {
                message,
                delivery: delivery.into(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        // The sender already got a live refusal envelope.
        Ok(SendMessageResult::Refused) => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("BLACKLISTED", "You are blacklisted by this user")),
        )
            .into_response(),
        Err(SendMessageError::Validation(e)) => bad_request(e.to_string()),
        Err(SendMessageError::Store(e)) => handle_store_error(e),
        Err(SendMessageError::Notification(e)) => handle_notification_error(e),
    }
}

/// POST /api/user/:id/guests
pub async fn record_guest_visit(
    State(handlers): State<SocialHandlers>,
    RequireAuth(user): RequireAuth,
    Path(owner): Path<String>,
) -> Response {
    let owner = match parse_user_id(&owner) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = RecordGuestVisitCommand {
        user: owner,
        guest: user.id,
    };

    match handlers.record_visit.handle(cmd).await {
        Ok((visit, delivery)) => {
            let response = GuestVisitResponse {
                visit,
                delivery: delivery.into(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(RecordGuestVisitError::Validation(e)) => bad_request(e.to_string()),
        Err(RecordGuestVisitError::Store(e)) => handle_store_error(e),
        Err(RecordGuestVisitError::Notification(e)) => handle_notification_error(e),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, Response> {
    UserId::parse(raw).map_err(|_| bad_request("Invalid user ID"))
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("BAD_REQUEST", message)),
    )
        .into_response()
}

fn handle_store_error(error: DomainError) -> Response {
    tracing::error!(code = %error.code, error = %error, "Social store failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal("An unexpected error occurred")),
    )
        .into_response()
}

fn handle_notification_error(error: NotificationError) -> Response {
    tracing::error!(error = %error, "Recipient could not be notified");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal("Notification failed")),
    )
        .into_response()
}
