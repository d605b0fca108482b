//! HTTP adapter for durable offline updates.
//!
//! - `GET /api/updates` - caller's records, newest first
//! - `GET /api/updates/:id` - one record
//! - `DELETE /api/updates/:id` - acknowledge (remove) a record

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, UpdateListResponse, UpdateResponse};
pub use handlers::UpdateHandlers;
pub use routes::updates_routes;
