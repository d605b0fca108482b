//! HTTP adapter for the social actions that produce realtime events.
//!
//! - `POST /api/user/:id/messages` - send a message (or invite) to `:id`
//! - `POST /api/user/:id/guests` - record a visit to `:id`'s profile

mod dto;
mod handlers;
mod routes;

pub use dto::{DeliveryResponse, GuestVisitResponse, SendMessageRequest, SentMessageResponse};
pub use handlers::SocialHandlers;
pub use routes::social_routes;
