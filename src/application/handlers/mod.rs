//! Command handlers that produce realtime events.
//!
//! - `social` - messaging and guest tracking

pub mod social;

pub use social::{
    RecordGuestVisitCommand, RecordGuestVisitError, RecordGuestVisitHandler, SendMessageCommand,
    SendMessageError, SendMessageHandler, SendMessageResult,
};
