// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks ranges and cross-field constraints that serde attributes cannot
//! express. All errors are collected; validation does not fail fast.

use crate::diagnostic::ConfigError;
use crate::model::{FerryConfig, MAX_BATCH_CAP};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const MAX_WORKERS: usize = 16;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &FerryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::validation(
            "agent.log_level",
            format!(
                "`{}` is not one of {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.source.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "source.database_path",
            "must not be empty",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if !config.source.database_path.trim().is_empty()
        && config.source.database_path == config.storage.database_path
    {
        errors.push(ConfigError::validation(
            "storage.database_path",
            "must differ from source.database_path; the message store is read-only",
        ));
    }

    if !(1..=MAX_BATCH_CAP).contains(&config.source.batch_cap) {
        errors.push(ConfigError::validation(
            "source.batch_cap",
            format!(
                "must be between 1 and {MAX_BATCH_CAP}, got {}",
                config.source.batch_cap
            ),
        ));
    }

    let url = config.delivery.endpoint_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::validation(
            "delivery.endpoint_url",
            format!("`{url}` must be an http:// or https:// URL"),
        ));
    }

    if !(1..=MAX_WORKERS).contains(&config.delivery.workers) {
        errors.push(ConfigError::validation(
            "delivery.workers",
            format!(
                "must be between 1 and {MAX_WORKERS}, got {}",
                config.delivery.workers
            ),
        ));
    }

    if config.delivery.connect_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "delivery.connect_timeout_secs",
            "must be at least 1",
        ));
    }

    if config.delivery.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "delivery.request_timeout_secs",
            "must be at least 1",
        ));
    }

    if config.schedule.interval_secs == 0 {
        errors.push(ConfigError::validation(
            "schedule.interval_secs",
            "must be at least 1",
        ));
    }

    if config.schedule.entrypoint.trim().is_empty() {
        errors.push(ConfigError::validation(
            "schedule.entrypoint",
            "must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
