//! Realtime fan-out configuration

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::websocket::{Backoff, ConnectionSettings, HubSettings, OverflowPolicy};

use super::error::ValidationError;

/// Tuning for hubs, connections and the broker.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Prefix of every broker channel key
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Envelopes buffered between a broker read loop and its hub
    #[serde(default = "default_broker_buffer")]
    pub broker_buffer: usize,

    /// Outbound queue capacity per connection
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer: usize,

    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    #[serde(default = "default_ping_interval")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,

    /// Seconds an empty hub survives before eviction; 0 keeps hubs forever
    #[serde(default = "default_hub_idle_grace")]
    pub hub_idle_grace_secs: u64,

    #[serde(default = "default_hub_sweep_interval")]
    pub hub_sweep_interval_secs: u64,

    /// How long a new connection waits for its hub's subscription
    #[serde(default = "default_subscribe_ready_timeout")]
    pub subscribe_ready_timeout_ms: u64,

    #[serde(default = "default_initial_backoff")]
    pub resubscribe_initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub resubscribe_max_backoff_ms: u64,
}

impl RealtimeConfig {
    pub fn hub_idle_grace(&self) -> Duration {
        Duration::from_secs(self.hub_idle_grace_secs)
    }

    pub fn hub_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.hub_sweep_interval_secs)
    }

    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            namespace: self.namespace.clone(),
            ready_timeout: Duration::from_millis(self.subscribe_ready_timeout_ms),
            backoff: Backoff {
                initial: Duration::from_millis(self.resubscribe_initial_backoff_ms),
                max: Duration::from_millis(self.resubscribe_max_backoff_ms),
            },
        }
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            ping_interval: Duration::from_millis(self.ping_interval_ms),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            queue_capacity: self.connection_buffer,
            overflow_policy: self.overflow_policy,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.namespace.is_empty() || self.namespace.contains(':') {
            return Err(ValidationError::InvalidNamespace);
        }
        let positive = [
            ("broker_buffer", self.broker_buffer as u64),
            ("connection_buffer", self.connection_buffer as u64),
            ("ping_interval_ms", self.ping_interval_ms),
            ("write_timeout_secs", self.write_timeout_secs),
            ("resubscribe_initial_backoff_ms", self.resubscribe_initial_backoff_ms),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ValidationError::ZeroRealtimeSetting(name));
        }
        if self.resubscribe_max_backoff_ms < self.resubscribe_initial_backoff_ms {
            return Err(ValidationError::InvalidBackoff);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            broker_buffer: default_broker_buffer(),
            connection_buffer: default_connection_buffer(),
            overflow_policy: OverflowPolicy::default(),
            ping_interval_ms: default_ping_interval(),
            write_timeout_secs: default_write_timeout(),
            hub_idle_grace_secs: default_hub_idle_grace(),
            hub_sweep_interval_secs: default_hub_sweep_interval(),
            subscribe_ready_timeout_ms: default_subscribe_ready_timeout(),
            resubscribe_initial_backoff_ms: default_initial_backoff(),
            resubscribe_max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_namespace() -> String {
    "poputchiki".to_string()
}

fn default_broker_buffer() -> usize {
    100
}

fn default_connection_buffer() -> usize {
    10
}

fn default_ping_interval() -> u64 {
    1000
}

fn default_write_timeout() -> u64 {
    5
}

fn default_hub_idle_grace() -> u64 {
    300
}

fn default_hub_sweep_interval() -> u64 {
    60
}

fn default_subscribe_ready_timeout() -> u64 {
    2000
}

fn default_initial_backoff() -> u64 {
    250
}

fn default_max_backoff() -> u64 {
    30_000
}
