use std::time::Duration;

use hsi_common::Label;
use serde::{Deserialize, Serialize};

/// External line source used in serial mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Device path (e.g. `/dev/ttyUSB0`) or `tcp://host:port`.
    pub address: String,
    /// Expected transfer rate of the device. Informational only: it is
    /// checked and logged when the source opens but never applied, since
    /// the line discipline is configured outside this process.
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Sleep between polls when no record is pending.
    pub poll_delay_ms: u64,
    /// Readings strictly above this map to `"1"`.
    pub threshold: i64,
    /// Label emitted for records that do not parse.
    pub default_label: Label,
    /// Longest accepted record, in bytes.
    pub max_line_length: usize,
}

impl SourceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            address: "/dev/ttyUSB0".into(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            poll_delay_ms: 10,
            threshold: 100,
            default_label: Label::Zero,
            max_line_length: 256,
        }
    }
}
