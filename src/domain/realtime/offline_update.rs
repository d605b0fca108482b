//! Offline update - durable stand-in for a live delivery that could not occur.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{Timestamp, UpdateId, UserId};

use super::{EventEnvelope, EventKind};

/// Durable record written when the recipient has no live path.
///
/// Its lifecycle belongs to the store; the recipient reads it on reconnect
/// or when polling for updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineUpdate {
    pub id: UpdateId,
    pub recipient: UserId,
    pub origin: UserId,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "body")]
    pub payload: JsonValue,
    #[serde(rename = "time")]
    pub created_at: Timestamp,
}

impl OfflineUpdate {
    pub fn new(recipient: UserId, origin: UserId, kind: EventKind, payload: JsonValue) -> Self {
        Self {
            id: UpdateId::new(),
            recipient,
            origin,
            kind,
            payload,
            created_at: Timestamp::now(),
        }
    }

    /// Envelope equivalent of this record, stamped with its creation time.
    pub fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope::at(self.kind, self.payload.clone(), self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_update_records_both_parties() {
        let recipient = UserId::new();
        let origin = UserId::new();
        let update = OfflineUpdate::new(recipient, origin, EventKind::Message, json!({"text": "hi"}));

        assert_eq!(update.recipient, recipient);
        assert_eq!(update.origin, origin);
        assert_eq!(update.kind, EventKind::Message);
    }

    #[test]
    fn envelope_keeps_kind_payload_and_creation_time() {
        let update = OfflineUpdate::new(
            UserId::new(),
            UserId::new(),
            EventKind::Guest,
            json!({"guest": "g"}),
        );
        let envelope = update.to_envelope();

        assert_eq!(envelope.kind(), EventKind::Guest);
        assert_eq!(envelope.payload(), &update.payload);
        assert_eq!(envelope.timestamp(), update.created_at);
    }

    #[test]
    fn update_serializes_with_wire_names() {
        let update = OfflineUpdate::new(UserId::new(), UserId::new(), EventKind::Status, json!({}));
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "status");
        assert!(value.get("body").is_some());
        assert!(value.get("time").is_some());
    }
}
