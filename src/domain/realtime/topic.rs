//! Subscription topics for the secondary notification channel.
//!
//! Users opt in per topic (e.g. "email me about new messages"). Topics are
//! derived from the event kind; kinds without a topic are never forwarded.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::{EventEnvelope, EventKind};
use crate::domain::foundation::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTopic {
    Messages,
    Invites,
    Guests,
    Statuses,
    Comments,
    Favorites,
}

impl SubscriptionTopic {
    /// Topic a user must be subscribed to for this kind to be forwarded.
    pub fn for_event(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::Message => Some(SubscriptionTopic::Messages),
            EventKind::Invite => Some(SubscriptionTopic::Invites),
            EventKind::Guest => Some(SubscriptionTopic::Guests),
            EventKind::Status => Some(SubscriptionTopic::Statuses),
            EventKind::Comment => Some(SubscriptionTopic::Comments),
            EventKind::Favorite => Some(SubscriptionTopic::Favorites),
            EventKind::Progress | EventKind::MessageSendBlacklisted | EventKind::Token => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTopic::Messages => "messages",
            SubscriptionTopic::Invites => "invites",
            SubscriptionTopic::Guests => "guests",
            SubscriptionTopic::Statuses => "statuses",
            SubscriptionTopic::Comments => "comments",
            SubscriptionTopic::Favorites => "favorites",
        }
    }
}

impl fmt::Display for SubscriptionTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope forwarded on the secondary channel.
///
/// Same `{type, body, time}` shape as [`EventEnvelope`], but `type` carries
/// the subscription topic instead of the event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEnvelope {
    #[serde(rename = "type")]
    topic: SubscriptionTopic,
    #[serde(rename = "body")]
    payload: JsonValue,
    #[serde(rename = "time")]
    timestamp: Timestamp,
}

impl TopicEnvelope {
    /// Re-tags `envelope` with `topic`, keeping its body and time.
    pub fn forward(topic: SubscriptionTopic, envelope: &EventEnvelope) -> Self {
        Self {
            topic,
            payload: envelope.payload().clone(),
            timestamp: envelope.timestamp(),
        }
    }

    pub fn topic(&self) -> SubscriptionTopic {
        self.topic
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_and_invite_map_to_separate_topics() {
        assert_eq!(
            SubscriptionTopic::for_event(EventKind::Message),
            Some(SubscriptionTopic::Messages)
        );
        assert_eq!(
            SubscriptionTopic::for_event(EventKind::Invite),
            Some(SubscriptionTopic::Invites)
        );
    }

    #[test]
    fn transient_kinds_have_no_topic() {
        assert_eq!(SubscriptionTopic::for_event(EventKind::Progress), None);
        assert_eq!(SubscriptionTopic::for_event(EventKind::Token), None);
        assert_eq!(
            SubscriptionTopic::for_event(EventKind::MessageSendBlacklisted),
            None
        );
    }

    #[test]
    fn topic_serializes_lowercase() {
        let json = serde_json::to_string(&SubscriptionTopic::Guests).unwrap();
        assert_eq!(json, "\"guests\"");
        assert_eq!(SubscriptionTopic::Guests.as_str(), "guests");
    }

    #[test]
    fn forwarded_envelope_is_tagged_with_topic() {
        let original = EventEnvelope::new(EventKind::Message, json!({"text": "hi"}));
        let forwarded = TopicEnvelope::forward(SubscriptionTopic::Messages, &original);

        let wire: JsonValue = serde_json::from_str(&forwarded.to_json().unwrap()).unwrap();
        assert_eq!(wire["type"], "messages");
        assert_eq!(wire["body"], json!({"text": "hi"}));
        assert_eq!(
            wire["time"],
            serde_json::to_value(original.timestamp()).unwrap()
        );
    }
}
