//! Bounded per-connection outbound queue.
//!
//! The hub's fan-out task pushes without ever waiting; the connection's
//! delivery loop is the single consumer and awaits new items. When the
//! queue is full the configured [`OverflowPolicy`] decides whether the
//! oldest envelope is discarded or the connection is cut off.

use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

use crate::domain::realtime::EventEnvelope;

/// What to do when a connection cannot keep up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest queued envelope to make room.
    #[default]
    DropOldest,
    /// Close the queue; the connection tears itself down.
    Disconnect,
}

/// Result of a non-blocking push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after discarding the oldest envelope.
    DroppedOldest,
    /// Queue was full under `Disconnect`; it is now closed.
    Overflowed,
    /// Queue was already closed; nothing queued.
    Closed,
}

#[derive(Debug)]
struct QueueState {
    items: VecDeque<Arc<EventEnvelope>>,
    closed: bool,
}

/// Single-consumer bounded queue of shared envelopes.
#[derive(Debug)]
pub struct OutboundQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl OutboundQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues without blocking.
    pub fn push(&self, envelope: Arc<EventEnvelope>) -> PushOutcome {
        let mut state = self.lock();
        if state.closed {
            return PushOutcome::Closed;
        }

        let mut outcome = PushOutcome::Queued;
        if state.items.len() >= self.capacity {
            match self.policy {
                OverflowPolicy::DropOldest => {
                    state.items.pop_front();
                    outcome = PushOutcome::DroppedOldest;
                }
                OverflowPolicy::Disconnect => {
                    state.closed = true;
                    state.items.clear();
                    drop(state);
                    self.notify.notify_one();
                    return PushOutcome::Overflowed;
                }
            }
        }

        state.items.push_back(envelope);
        drop(state);
        self.notify.notify_one();
        outcome
    }

    /// Waits for the next envelope. Returns `None` once the queue is closed;
    /// anything still queued at close time is discarded.
    pub async fn recv(&self) -> Option<Arc<EventEnvelope>> {
        loop {
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(envelope) = state.items.pop_front() {
                    return Some(envelope);
                }
            }
            // A push between the unlock and here leaves a stored permit.
            self.notify.notified().await;
        }
    }

    /// Closes the queue and wakes the consumer. Idempotent.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.items.clear();
        drop(state);
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
