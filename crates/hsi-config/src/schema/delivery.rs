//! Per-client delivery configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens when a client's send queue is full.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest queued frame to make room.
    #[default]
    DropOldest,
    /// Discard the incoming frame.
    DropNewest,
    /// Treat a full queue as a failed delivery and evict the client.
    Disconnect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Frames buffered per client before the overflow policy applies.
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    /// Upper bound on a single socket write.
    pub send_timeout_ms: u64,
}

impl DeliveryConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 32,
            overflow: OverflowPolicy::DropOldest,
            send_timeout_ms: 2000,
        }
    }
}
