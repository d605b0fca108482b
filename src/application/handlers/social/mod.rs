//! Social command handlers.

mod record_guest_visit;
mod send_message;

pub use record_guest_visit::{RecordGuestVisitCommand, RecordGuestVisitError, RecordGuestVisitHandler};
pub use send_message::{SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult};
