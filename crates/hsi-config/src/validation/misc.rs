//! Per-section validators: server, producer, source, delivery.

use crate::schema::{HsiConfig, ProducerMode};

use super::helpers::{validate_non_empty, validate_range};

/// Validate listener settings.
pub(crate) fn validate_server(errors: &mut Vec<String>, config: &HsiConfig) {
    validate_non_empty(errors, "server.host", &config.server.host);
    if !config.server.path.starts_with('/') {
        errors.push(format!(
            "server.path = {:?} must start with '/'",
            config.server.path
        ));
    }
}

/// Validate timer cadence and frame contents.
pub(crate) fn validate_producer(errors: &mut Vec<String>, config: &HsiConfig) {
    validate_range(
        errors,
        "producer.interval_ms",
        config.producer.interval_ms,
        10,
        10_000,
    );
    if config.producer.vector.iter().any(|v| !v.is_finite()) {
        errors.push("producer.vector must contain only finite numbers".into());
    }
}

/// Validate the external source. Only checked when it will be opened.
pub(crate) fn validate_source(errors: &mut Vec<String>, config: &HsiConfig) {
    if config.producer.mode != ProducerMode::Serial {
        return;
    }
    validate_non_empty(errors, "source.address", &config.source.address);
    validate_range(
        errors,
        "source.baud_rate",
        u64::from(config.source.baud_rate),
        50,
        4_000_000,
    );
    validate_range(
        errors,
        "source.read_timeout_ms",
        config.source.read_timeout_ms,
        10,
        60_000,
    );
    validate_range(
        errors,
        "source.poll_delay_ms",
        config.source.poll_delay_ms,
        1,
        1000,
    );
    validate_range(
        errors,
        "source.max_line_length",
        config.source.max_line_length as u64,
        8,
        65_536,
    );
}

/// Validate per-client queueing.
pub(crate) fn validate_delivery(errors: &mut Vec<String>, config: &HsiConfig) {
    validate_range(
        errors,
        "delivery.queue_capacity",
        config.delivery.queue_capacity as u64,
        1,
        4096,
    );
    validate_range(
        errors,
        "delivery.send_timeout_ms",
        config.delivery.send_timeout_ms,
        10,
        60_000,
    );
}
