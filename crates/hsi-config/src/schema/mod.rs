//! Configuration schema types for hsi-stream.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the reference defaults (port 8000,
//! path `/ws`, 10 Hz timer).

mod delivery;
mod logging;
mod producer;
mod server;
mod source;

pub use delivery::*;
pub use logging::*;
pub use producer::*;
pub use server::*;
pub use source::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for hsi-stream.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HsiConfig {
    pub server: ServerConfig,
    pub producer: ProducerConfig,
    pub source: SourceConfig,
    pub delivery: DeliveryConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsi_common::PayloadMode;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = HsiConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.path, "/ws");
        assert_eq!(config.producer.mode, ProducerMode::Timer);
        assert_eq!(config.producer.interval().as_millis(), 100);
        assert_eq!(config.source.read_timeout().as_secs(), 1);
        assert_eq!(config.source.poll_delay().as_millis(), 10);
        assert_eq!(config.delivery.overflow, OverflowPolicy::DropOldest);
    }

    #[test]
    fn producer_mode_selects_payload_shape() {
        assert_eq!(ProducerMode::Timer.payload_mode(), PayloadMode::Structured);
        assert_eq!(ProducerMode::Serial.payload_mode(), PayloadMode::Label);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: HsiConfig = toml::from_str(
            r#"
[server]
port = 9001

[delivery]
overflow = "disconnect"
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.path, "/ws");
        assert_eq!(config.delivery.overflow, OverflowPolicy::Disconnect);
        assert_eq!(config.delivery.queue_capacity, 32);
    }

    #[test]
    fn serial_mode_parses() {
        let config: HsiConfig = toml::from_str(
            r#"
[producer]
mode = "serial"

[source]
address = "tcp://127.0.0.1:7000"
threshold = 250
"#,
        )
        .unwrap();
        assert_eq!(config.producer.mode, ProducerMode::Serial);
        assert_eq!(config.source.address, "tcp://127.0.0.1:7000");
        assert_eq!(config.source.threshold, 250);
        assert_eq!(config.source.baud_rate, 9600);
    }
}
