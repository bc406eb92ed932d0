// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Dealcast configuration system.

use dealcast_config::diagnostic::ConfigError;
use dealcast_config::model::DealcastConfig;
use dealcast_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_dealcast_config() {
    let toml = r#"
[service]
name = "deals-eu"
log_level = "debug"

[storage]
database_path = "/tmp/dealcast-test.db"
wal_mode = false

[scheduler]
tick_interval_secs = 30

[discovery]
interval_secs = 3600
low_water_mark = 20
exclude_limit = 1000

[queue]
capacity = 100
queued_ttl_days = 14
posted_ttl_days = 3

[dedup]
freshness_window_days = 30
posting_log_retention_days = 45

[search]
endpoint = "https://search.internal/v1/candidates"
api_key = "sk-search"
timeout_secs = 10

[telegram]
bot_token = "123:ABC"

[metrics]
prometheus_listen = "127.0.0.1:9464"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "deals-eu");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/dealcast-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.scheduler.tick_interval_secs, 30);
    assert_eq!(config.discovery.low_water_mark, 20);
    assert_eq!(config.queue.capacity, 100);
    assert_eq!(config.queue.posted_ttl_days, 3);
    assert_eq!(config.dedup.posting_log_retention_days, 45);
    assert_eq!(config.search.api_key.as_deref(), Some("sk-search"));
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.timeout_secs, 30);
    assert_eq!(
        config.metrics.prometheus_listen.as_deref(),
        Some("127.0.0.1:9464")
    );
}

#[test]
fn defaults_match_engine_constants() {
    let config = DealcastConfig::default();
    assert_eq!(config.scheduler.tick_interval_secs, 60);
    assert_eq!(config.discovery.interval_secs, 21_600);
    assert_eq!(config.discovery.low_water_mark, 50);
    assert_eq!(config.queue.capacity, 200);
    assert_eq!(config.queue.queued_ttl_days, 30);
    assert_eq!(config.queue.posted_ttl_days, 7);
    assert_eq!(config.dedup.freshness_window_days, 60);
    assert_eq!(config.dedup.posting_log_retention_days, 90);
    assert!(config.search.endpoint.is_none());
}

/// A typo in a section key produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_queue_key_suggests_correction() {
    let toml = r#"
[queue]
capacty = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let found = errors.iter().any(|e| {
        matches!(
            e,
            ConfigError::UnknownKey { key, suggestion, .. }
                if key == "capacty" && suggestion.as_deref() == Some("capacity")
        )
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[sheduler]
tick_interval_secs = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown section");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "sheduler"))
    );
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[queue]
capacity = "lots"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string capacity");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parsing() {
    let toml = r#"
[dedup]
freshness_window_days = 120
"#;

    let errors = load_and_validate_str(toml).expect_err("retention must exceed freshness");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
#[serial]
fn env_vars_override_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dealcast.toml");
    std::fs::write(&path, "[queue]\ncapacity = 120\n").unwrap();

    // SAFETY: test-only env mutation, serialized with #[serial].
    unsafe {
        std::env::set_var("DEALCAST_QUEUE_CAPACITY", "150");
        std::env::set_var("DEALCAST_TELEGRAM_BOT_TOKEN", "env-token");
    }
    let result = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("DEALCAST_QUEUE_CAPACITY");
        std::env::remove_var("DEALCAST_TELEGRAM_BOT_TOKEN");
    }

    let config = result.expect("config should load");
    assert_eq!(config.queue.capacity, 150);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("env-token"));
}

#[test]
#[serial]
fn file_values_apply_without_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dealcast.toml");
    std::fs::write(&path, "[scheduler]\ntick_interval_secs = 15\n").unwrap();

    let config = load_and_validate_path(&path).expect("config should load");
    assert_eq!(config.scheduler.tick_interval_secs, 15);
}
