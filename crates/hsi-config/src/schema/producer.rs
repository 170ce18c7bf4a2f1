//! Producer loop configuration types.

use std::time::Duration;

use hsi_common::{Frame, PayloadMode};
use serde::{Deserialize, Serialize};

/// Where frames come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProducerMode {
    /// Fixed-interval structured frames.
    #[default]
    Timer,
    /// Threshold labels from an external line source.
    Serial,
}

impl ProducerMode {
    pub fn payload_mode(self) -> PayloadMode {
        match self {
            ProducerMode::Timer => PayloadMode::Structured,
            ProducerMode::Serial => PayloadMode::Label,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub mode: ProducerMode,
    /// Timer period in milliseconds.
    pub interval_ms: u64,
    /// Initial vector broadcast in timer mode.
    pub vector: Vec<f64>,
    /// Initial label broadcast in timer mode.
    pub text: String,
}

impl ProducerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn initial_frame(&self) -> Frame {
        Frame::new(self.vector.clone(), self.text.clone())
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        let frame = Frame::default();
        Self {
            mode: ProducerMode::Timer,
            interval_ms: 100,
            vector: frame.vector,
            text: frame.text,
        }
    }
}
