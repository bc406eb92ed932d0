// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Dealcast posting engine.
//!
//! TOML configuration with strict key checking (`deny_unknown_fields`), XDG
//! file hierarchy lookup, `DEALCAST_*` environment overrides, and miette
//! diagnostics with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use dealcast_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("queue capacity: {}", config.queue.capacity);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::DealcastConfig;

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `DealcastConfig` or every diagnostic found.
pub fn load_and_validate() -> Result<DealcastConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<DealcastConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<DealcastConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/dealcast/dealcast.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("dealcast/dealcast.toml"));
    }
    candidates.push(
        std::env::current_dir()
            .map(|d| d.join("dealcast.toml"))
            .unwrap_or_else(|_| "dealcast.toml".into()),
    );

    candidates
        .into_iter()
        .filter_map(|path| {
            std::fs::read_to_string(&path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
