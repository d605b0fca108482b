//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `auth` - Session token validation (Redis, mock)
//! - `broker` - Publish/subscribe broker (Redis, in-memory)
//! - `email` - Secondary notification channel over the broker
//! - `http` - axum routes and middleware
//! - `memory` - In-memory stores for tests
//! - `postgres` - Durable stores
//! - `websocket` - Hubs, registry and live connections

pub mod auth;
pub mod broker;
pub mod email;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod websocket;
