// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dealcast.toml` > `~/.config/dealcast/dealcast.toml` > `/etc/dealcast/dealcast.toml`
//! with environment variable overrides via `DEALCAST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DealcastConfig;

/// Top-level sections, used to turn `DEALCAST_QUEUE_QUEUED_TTL_DAYS` into `queue.queued_ttl_days`.
const SECTIONS: &[&str] = &[
    "service",
    "storage",
    "scheduler",
    "discovery",
    "queue",
    "dedup",
    "search",
    "telegram",
    "metrics",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dealcast/dealcast.toml` (system-wide)
/// 3. `~/.config/dealcast/dealcast.toml` (user XDG config)
/// 4. `./dealcast.toml` (local directory)
/// 5. `DEALCAST_*` environment variables
pub fn load_config() -> Result<DealcastConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<DealcastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DealcastConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DealcastConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DealcastConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DealcastConfig::default()))
        .merge(Toml::file("/etc/dealcast/dealcast.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dealcast/dealcast.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dealcast.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `DEALCAST_TELEGRAM_BOT_TOKEN` must map to `telegram.bot_token`.
fn env_provider() -> Env {
    Env::prefixed("DEALCAST_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env key to its dotted config path.
///
/// Figment hands the mapper the key in its original case, so it is lowercased first.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}
