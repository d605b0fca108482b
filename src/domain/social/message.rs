//! Private messages between users.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{RecordId, Timestamp, UserId, ValidationError};
use crate::domain::realtime::EventKind;

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// A message from `origin` to `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub origin: UserId,
    pub destination: UserId,
    pub text: String,
    /// Travel invitation rather than plain chat.
    #[serde(default)]
    pub invite: bool,
    pub time: Timestamp,
}

impl Message {
    /// Creates a new message, validating its text.
    pub fn new(
        origin: UserId,
        destination: UserId,
        text: impl Into<String>,
        invite: bool,
    ) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("text"));
        }
        let length = text.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(ValidationError::out_of_range(
                "text",
                1,
                MAX_MESSAGE_LENGTH as i64,
                length as i64,
            ));
        }
        if origin == destination {
            return Err(ValidationError::invalid_format(
                "destination",
                "cannot send a message to yourself",
            ));
        }

        Ok(Self {
            id: RecordId::new(),
            origin,
            destination,
            text,
            invite,
            time: Timestamp::now(),
        })
    }

    /// Realtime kind announced to the destination.
    pub fn event_kind(&self) -> EventKind {
        if self.invite {
            EventKind::Invite
        } else {
            EventKind::Message
        }
    }
}

/// Body sent back to a sender whose message was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSendBlacklisted {
    /// The user who blacklisted the sender.
    pub id: UserId,
}
