//! hsi-stream configuration system.
//!
//! TOML-based configuration with full validation. All sections use
//! defaults matching the reference deployment, so partial configs work
//! out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hsi_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    DeliveryConfig, HsiConfig, LoggingConfig, OverflowPolicy, ProducerConfig, ProducerMode,
    ServerConfig, SourceConfig, CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use hsi_common::ConfigError;

/// Load config from `path`, or from the platform default path when `None`,
/// and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<HsiConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &HsiConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&HsiConfig::default());
        assert!(json.contains("\"server\""));
        assert!(json.contains("\"producer\""));
        assert!(json.contains("\"source\""));
        assert!(json.contains("\"delivery\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = config_to_json(&HsiConfig::default());
        let parsed: HsiConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.path, "/ws");
        assert_eq!(parsed.delivery.overflow, OverflowPolicy::DropOldest);
    }

    #[test]
    fn load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[producer]\ninterval_ms = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
