//! Poputchiki - social travel-companion backend
//!
//! This crate holds the presence-aware realtime notification subsystem:
//! events for a user are pushed live over WebSockets when the user is
//! online, and stored as durable offline updates otherwise.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
