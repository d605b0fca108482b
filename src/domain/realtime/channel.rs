//! Channel key derivation.
//!
//! Every process derives a user's broker channel from the same four parts,
//! so publishers and subscribers agree without any directory service:
//!
//! ```text
//! <namespace>:realtime:channel:<userIdHex>
//! ```

use std::fmt;

use crate::domain::foundation::UserId;

/// Separator between key segments.
pub const KEY_SEPARATOR: &str = ":";

/// Topic segment for live WebSocket delivery.
pub const REALTIME_TOPIC: &str = "realtime";

/// Topic segment for the secondary (email) notification channel.
pub const EMAIL_TOPIC: &str = "email";

/// Subtopic segment shared by all per-user channels.
pub const CHANNEL_SUBTOPIC: &str = "channel";

/// Deterministic broker channel name for one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey(String);

impl ChannelKey {
    /// Derives a key from its four parts.
    pub fn derive(namespace: &str, topic: &str, subtopic: &str, user_id: &UserId) -> Self {
        let user_hex = user_id.hex();
        Self([namespace, topic, subtopic, user_hex.as_str()].join(KEY_SEPARATOR))
    }

    /// Live delivery channel for a user.
    pub fn realtime(namespace: &str, user_id: &UserId) -> Self {
        Self::derive(namespace, REALTIME_TOPIC, CHANNEL_SUBTOPIC, user_id)
    }

    /// Secondary notification channel for a user.
    pub fn email(namespace: &str, user_id: &UserId) -> Self {
        Self::derive(namespace, EMAIL_TOPIC, CHANNEL_SUBTOPIC, user_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
