//! Where the config file lives, and writing the first-run template.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use hsi_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HSI_STREAM_CONFIG";

/// `$HSI_STREAM_CONFIG` when set, otherwise
/// `<platform config dir>/hsi-stream/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_config_path(std::env::var_os(CONFIG_ENV), dirs::config_dir())
}

pub(crate) fn resolve_config_path(
    explicit: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    config_dir
        .map(|dir| dir.join("hsi-stream").join("config.toml"))
        .ok_or_else(|| {
            ConfigError::ParseError(format!(
                "could not determine config directory; set {CONFIG_ENV}"
            ))
        })
}

/// Write the commented template to `path`, creating parent directories.
///
/// An existing file is never overwritten. Returns whether a file was written.
pub fn create_default_config(path: &Path) -> Result<bool, ConfigError> {
    let io_err = |action: &str, e: std::io::Error| {
        ConfigError::ParseError(format!("failed to {action} {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err("create directory for", e))?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(io_err("create", e)),
    };
    file.write_all(default_config_toml().as_bytes())
        .map_err(|e| io_err("write", e))?;

    info!(path = %path.display(), "Wrote default config");
    Ok(true)
}
