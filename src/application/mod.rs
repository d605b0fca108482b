//! Application layer - event routing and the command handlers that feed it.
//!
//! - `NotificationPolicy` - presence-aware live/durable routing
//! - `RealtimePublisher` - live-only pushes
//! - `handlers` - commands that produce realtime events

pub mod handlers;
mod notification_policy;
mod realtime_publisher;

pub use handlers::{
    RecordGuestVisitCommand, RecordGuestVisitError, RecordGuestVisitHandler, SendMessageCommand,
    SendMessageError, SendMessageHandler, SendMessageResult,
};
pub use notification_policy::{Delivery, NotificationError, NotificationPolicy};
pub use realtime_publisher::RealtimePublisher;
