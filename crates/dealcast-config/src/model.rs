// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Dealcast posting engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Dealcast configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DealcastConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Posting scheduler tick settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Periodic discovery cycle settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Bounded product queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Repeat-suppression and posting log retention.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Product search provider endpoint.
    #[serde(default)]
    pub search: SearchConfig,

    /// Telegram bot used for posting and owner notifications.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Metrics export.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "dealcast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dealcast").join("dealcast.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("dealcast.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Posting scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between scheduler ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

fn default_tick_interval_secs() -> u64 {
    60
}

/// Discovery cycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Seconds between discovery cycles (default: 6 hours).
    #[serde(default = "default_discovery_interval_secs")]
    pub interval_secs: u64,

    /// Queues below this size are refilled.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Cap on the size of the exclusion snapshot fetched per campaign.
    #[serde(default = "default_exclude_limit")]
    pub exclude_limit: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_discovery_interval_secs(),
            low_water_mark: default_low_water_mark(),
            exclude_limit: default_exclude_limit(),
        }
    }
}

fn default_discovery_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_low_water_mark() -> usize {
    50
}

fn default_exclude_limit() -> usize {
    5000
}

/// Product queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum `queued` rows per campaign.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Queued rows older than this many days are purged.
    #[serde(default = "default_queued_ttl_days")]
    pub queued_ttl_days: u32,

    /// Posted rows older than this many days are purged.
    #[serde(default = "default_posted_ttl_days")]
    pub posted_ttl_days: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            queued_ttl_days: default_queued_ttl_days(),
            posted_ttl_days: default_posted_ttl_days(),
        }
    }
}

fn default_capacity() -> usize {
    200
}

fn default_queued_ttl_days() -> u32 {
    30
}

fn default_posted_ttl_days() -> u32 {
    7
}

/// Repeat-suppression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Products posted within this many days are not admitted again.
    #[serde(default = "default_freshness_window_days")]
    pub freshness_window_days: u32,

    /// Posting log rows are kept this long for reporting. Must exceed the freshness window.
    #[serde(default = "default_posting_log_retention_days")]
    pub posting_log_retention_days: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            freshness_window_days: default_freshness_window_days(),
            posting_log_retention_days: default_posting_log_retention_days(),
        }
    }
}

fn default_freshness_window_days() -> u32 {
    60
}

fn default_posting_log_retention_days() -> u32 {
    90
}

/// Product search provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// HTTP endpoint accepting search requests. `None` disables discovery.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent with each request.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables posting.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Socket address for the Prometheus scrape endpoint, e.g. `127.0.0.1:9464`.
    #[serde(default)]
    pub prometheus_listen: Option<String>,
}
