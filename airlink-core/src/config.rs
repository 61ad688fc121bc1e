use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Knobs that tune the bridge runtime.
///
/// All fields carry defaults so a partial TOML/JSON payload only needs to
/// mention the values it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bound of the inbound event channel, in records.
    pub event_queue_capacity: usize,
    /// Hard cap on access points collected for a single scan. A scan that
    /// reaches the cap is delivered truncated rather than failed.
    pub scan_fragment_cap: usize,
    /// How long startup/shutdown wait for the dispatch task handshake (ms).
    pub handshake_timeout_ms: u64,
    /// Name attached to the dispatch task span.
    pub dispatch_task_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            scan_fragment_cap: Self::DEFAULT_SCAN_FRAGMENT_CAP,
            handshake_timeout_ms: 5_000,
            dispatch_task_name: "airlink-dispatch".to_string(),
        }
    }
}

impl BridgeConfig {
    pub const DEFAULT_QUEUE_CAPACITY: usize = 32;
    pub const DEFAULT_SCAN_FRAGMENT_CAP: usize = 32;

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_scan_fragment_cap(mut self, cap: usize) -> Self {
        self.scan_fragment_cap = cap;
        self
    }

    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }
}
