// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks relationships serde cannot express, such as the posting log
//! outliving the freshness window it backs.

use crate::diagnostic::ConfigError;
use crate::model::DealcastConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &DealcastConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.scheduler.tick_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "scheduler.tick_interval_secs must be greater than 0",
        ));
    }

    if config.discovery.interval_secs == 0 {
        errors.push(ConfigError::validation(
            "discovery.interval_secs must be greater than 0",
        ));
    }

    if config.queue.capacity == 0 {
        errors.push(ConfigError::validation(
            "queue.capacity must be greater than 0",
        ));
    }

    if config.discovery.low_water_mark > config.queue.capacity {
        errors.push(ConfigError::validation(format!(
            "discovery.low_water_mark ({}) must not exceed queue.capacity ({})",
            config.discovery.low_water_mark, config.queue.capacity
        )));
    }

    if config.dedup.posting_log_retention_days <= config.dedup.freshness_window_days {
        errors.push(ConfigError::validation(format!(
            "dedup.posting_log_retention_days ({}) must be greater than dedup.freshness_window_days ({})",
            config.dedup.posting_log_retention_days, config.dedup.freshness_window_days
        )));
    }

    if let Some(endpoint) = &config.search.endpoint
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "search.endpoint `{endpoint}` must be an http(s) URL"
        )));
    }

    if config.telegram.bot_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
        errors.push(ConfigError::validation(
            "telegram.bot_token must not be empty when set",
        ));
    }

    if let Some(listen) = &config.metrics.prometheus_listen
        && listen.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ConfigError::validation(format!(
            "metrics.prometheus_listen `{listen}` is not a valid socket address"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
