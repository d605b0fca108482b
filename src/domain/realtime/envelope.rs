//! Event envelope - the unit of realtime data distributed to connections.
//!
//! Wire format (JSON, identical on the broker and on the WebSocket):
//!
//! ```text
//! {"type": "message", "body": {...}, "time": "2024-01-15T10:30:00.123Z"}
//! ```
//!
//! `type` is the lower-cased tag of the event kind. The kind is always
//! supplied explicitly by the producer.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::domain::foundation::Timestamp;

/// Logical kind of a realtime event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// New chat message.
    Message,
    /// Travel invitation (a message flagged as invite).
    Invite,
    /// Someone visited the user's profile.
    Guest,
    /// A followed user posted a status update.
    Status,
    /// Comment on one of the user's statuses.
    Comment,
    /// The user was added to someone's favorites.
    Favorite,
    /// Upload/processing progress for the user's own media.
    Progress,
    /// A message the user tried to send was refused (sender is blacklisted).
    #[serde(rename = "messagesendblacklisted")]
    MessageSendBlacklisted,
    /// Connection handshake carrying the caller's own identity and token.
    Token,
}

impl EventKind {
    /// Wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Message => "message",
            EventKind::Invite => "invite",
            EventKind::Guest => "guest",
            EventKind::Status => "status",
            EventKind::Comment => "comment",
            EventKind::Favorite => "favorite",
            EventKind::Progress => "progress",
            EventKind::MessageSendBlacklisted => "messagesendblacklisted",
            EventKind::Token => "token",
        }
    }

    /// Parses a wire tag back into a kind.
    pub fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "message" => EventKind::Message,
            "invite" => EventKind::Invite,
            "guest" => EventKind::Guest,
            "status" => EventKind::Status,
            "comment" => EventKind::Comment,
            "favorite" => EventKind::Favorite,
            "progress" => EventKind::Progress,
            "messagesendblacklisted" => EventKind::MessageSendBlacklisted,
            "token" => EventKind::Token,
            _ => return None,
        })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged, timestamped notification.
///
/// Immutable once constructed; fan-out shares a single instance behind an
/// `Arc` across every connection of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    kind: EventKind,
    #[serde(rename = "body")]
    payload: JsonValue,
    #[serde(rename = "time")]
    timestamp: Timestamp,
}

impl EventEnvelope {
    /// Creates an envelope stamped with the current time.
    pub fn new(kind: EventKind, payload: JsonValue) -> Self {
        Self {
            kind,
            payload,
            timestamp: Timestamp::now(),
        }
    }

    /// Creates an envelope from any serializable body.
    pub fn from_body<T: Serialize>(kind: EventKind, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, serde_json::to_value(body)?))
    }

    /// Creates an envelope with an explicit timestamp.
    pub fn at(kind: EventKind, payload: JsonValue, timestamp: Timestamp) -> Self {
        Self {
            kind,
            payload,
            timestamp,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Serializes to the JSON wire format.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses the JSON wire format.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_serializes_with_wire_field_names() {
        let envelope = EventEnvelope::new(EventKind::Message, json!({"text": "hi"}));
        let value: JsonValue = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["type"], "message");
        assert_eq!(value["body"]["text"], "hi");
        assert!(value["time"].is_string());
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn blacklisted_kind_uses_single_lowercase_tag() {
        let envelope = EventEnvelope::new(EventKind::MessageSendBlacklisted, json!({"id": "x"}));
        let raw = envelope.to_json().unwrap();
        assert!(raw.contains(r#""type":"messagesendblacklisted""#));
    }

    #[test]
    fn envelope_parses_wire_format() {
        let raw = r#"{"type":"guest","body":{"guest":"abc"},"time":"2024-01-15T10:30:00Z"}"#;
        let envelope = EventEnvelope::from_json(raw).unwrap();

        assert_eq!(envelope.kind(), EventKind::Guest);
        assert_eq!(envelope.payload()["guest"], "abc");
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let raw = r#"{"type":"teleport","body":{},"time":"2024-01-15T10:30:00Z"}"#;
        assert!(EventEnvelope::from_json(raw).is_err());
    }

    #[test]
    fn kind_tags_match_serde_names() {
        for kind in [
            EventKind::Message,
            EventKind::Invite,
            EventKind::Guest,
            EventKind::Status,
            EventKind::Comment,
            EventKind::Favorite,
            EventKind::Progress,
            EventKind::MessageSendBlacklisted,
            EventKind::Token,
        ] {
            let serialized = serde_json::to_string(&kind).unwrap();
            assert_eq!(serialized, format!("\"{}\"", kind.as_str()));
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn from_body_serializes_struct_payload() {
        #[derive(Serialize)]
        struct Progress {
            progress: f32,
        }

        let envelope = EventEnvelope::from_body(EventKind::Progress, &Progress { progress: 0.5 })
            .unwrap();
        assert_eq!(envelope.payload()["progress"], 0.5);
    }
}
