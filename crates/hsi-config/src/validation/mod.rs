//! Full configuration validation.
//!
//! Validates numeric ranges and string formats for every section and
//! collects all errors into a single `ConfigError`.

mod helpers;
mod misc;


use crate::schema::HsiConfig;
use hsi_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HsiConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    misc::validate_server(&mut errors, config);
    misc::validate_producer(&mut errors, config);
    misc::validate_source(&mut errors, config);
    misc::validate_delivery(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
