//! Lifecycle of one live duplex connection.
//!
//! ```text
//! Connecting ──► Open ──► Closing ──► Closed
//!      │                     ▲
//!      └─────────────────────┘   (handshake failed)
//! ```

use serde::Serialize;

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Upgrade accepted, handshake not yet written.
    Connecting,
    /// Registered with the hub; heartbeat and delivery running.
    Open,
    /// Teardown in progress: loops stopping, hub registration removed.
    Closing,
    /// Terminal. Nothing is delivered any more.
    Closed,
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Connecting, Open) | (Connecting, Closing) | (Open, Closing) | (Closing, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Connecting => vec![Open, Closing],
            Open => vec![Closing],
            Closing => vec![Closed],
            Closed => vec![],
        }
    }
}

/// Why a connection left the `Open` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Peer sent a close frame or the stream ended.
    PeerClosed,
    /// Reading from the peer failed.
    ReadFailed,
    /// Writing an envelope failed or timed out.
    WriteFailed,
    /// The heartbeat probe could not be sent.
    HeartbeatFailed,
    /// The outbound queue was closed (hub eviction or overflow disconnect).
    QueueClosed,
    /// One of the connection's loops panicked or was cancelled.
    TaskFailed,
}
