//! WebSocket adapters for realtime fan-out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                              Broker                                  │
//! │   InMemoryBroker (test) │ RedisBroker (production)                   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ one subscription per user
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      HubRegistry                                     │
//! │   Hub: user-a          Hub: user-b          Hub: user-c              │
//! │   ├── connection-1     ├── connection-4     └── (idle, evictable)    │
//! │   └── connection-2     └── connection-5                              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ OutboundQueue per connection
//!                                     ▼
//!                         ConnectionAdapter (heartbeat, delivery, read)
//! ```
//!
//! # Components
//!
//! - [`queue`] - bounded per-connection outbound queue
//! - [`hub`] - per-user subscription and fan-out task
//! - [`registry`] - process-wide user → hub map with idle eviction
//! - [`connection`] - one live socket
//! - [`handler`] - axum upgrade handler

pub mod connection;
pub mod handler;
pub mod hub;
pub mod queue;
pub mod registry;

pub use connection::{ConnectionAdapter, ConnectionSettings};
pub use handler::{realtime_router, ws_handler, RealtimeState};
pub use hub::{Backoff, Hub, SubscriptionState};
pub use queue::{OutboundQueue, OverflowPolicy, PushOutcome};
pub use registry::{HubRegistry, HubSettings};
