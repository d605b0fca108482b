//! HTTP DTOs for update endpoints.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::domain::foundation::{Timestamp, UpdateId, UserId};
use crate::domain::realtime::{EventKind, OfflineUpdate};

/// One offline update, shaped like the envelope a live connection would
/// have received plus its record id and origin.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
    pub id: UpdateId,
    pub origin: UserId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub body: JsonValue,
    pub time: Timestamp,
}

impl From<OfflineUpdate> for UpdateResponse {
    fn from(update: OfflineUpdate) -> Self {
        Self {
            id: update.id,
            origin: update.origin,
            kind: update.kind,
            body: update.payload,
            time: update.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateListResponse {
    pub updates: Vec<UpdateResponse>,
}

/// Error body shared by the update endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: &UpdateId) -> Self {
        Self {
            code: "NOT_FOUND".to_string(),
            message: format!("Update not found: {}", id),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
        }
    }
}
