//! Reading and parsing config files.

use std::path::Path;

use hsi_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::HsiConfig;
use crate::validation;

/// Parse TOML text; missing keys take their defaults. `origin` names the
/// input in error messages.
pub fn parse_config(content: &str, origin: &str) -> Result<HsiConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("{origin}: {e}")))
}

/// Read and parse one file.
///
/// Out-of-range values only produce a warning here; [`crate::load_config`]
/// is the strict entry point.
pub fn load_from_path(path: &Path) -> Result<HsiConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
        _ => ConfigError::ParseError(format!("failed to read {}: {e}", path.display())),
    })?;
    let config = parse_config(&content, &path.display().to_string())?;

    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), error = %e, "Config has invalid values");
    }
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load from [`default_config_path`], writing the template on first run.
pub fn load_default() -> Result<HsiConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            if create_default_config(&path)? {
                Ok(HsiConfig::default())
            } else {
                // Another process wrote it first.
                load_from_path(&path)
            }
        }
        other => other,
    }
}
