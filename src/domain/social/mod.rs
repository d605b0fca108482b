//! Social records whose creation produces realtime events.

mod guest;
mod message;
mod progress;

pub use guest::GuestVisit;
pub use message::{Message, MessageSendBlacklisted, MAX_MESSAGE_LENGTH};
pub use progress::ProgressMessage;
