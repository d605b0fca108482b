//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, auth)
//! - `realtime` - Event envelopes, channel keys, offline updates, connection lifecycle
//! - `social` - Payloads produced by messaging, guests and media uploads

pub mod foundation;
pub mod realtime;
pub mod social;
