// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the storage and collaborator adapters a command needs.

use std::sync::Arc;

use async_trait::async_trait;
use dealcast_config::model::DealcastConfig;
use dealcast_core::traits::{NotificationSink, PluginAdapter, SearchProvider};
use dealcast_core::types::{AdapterType, HealthStatus, Notification};
use dealcast_core::{DealcastError, StorageAdapter};
use dealcast_search::HttpSearchProvider;
use dealcast_storage::SqliteStorage;
use dealcast_telegram::TelegramNotifier;
use tracing::{info, warn};

/// Open and migrate the configured database.
pub async fn open_storage(config: &DealcastConfig) -> Result<Arc<SqliteStorage>, DealcastError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

pub fn search_provider(
    config: &DealcastConfig,
) -> Result<Arc<dyn SearchProvider + Send + Sync>, DealcastError> {
    Ok(Arc::new(HttpSearchProvider::new(&config.search)?))
}

/// Telegram notifications when a bot token is configured, log lines otherwise.
pub fn notifier(config: &DealcastConfig) -> Result<Arc<dyn NotificationSink + Send + Sync>, DealcastError> {
    if config.telegram.bot_token.is_some() {
        return Ok(Arc::new(TelegramNotifier::new(&config.telegram)?));
    }
    warn!("telegram.bot_token not set, owner notifications go to the log only");
    Ok(Arc::new(LogNotifier))
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl PluginAdapter for LogNotifier {
    fn name(&self) -> &str {
        "log-notifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(
        &self,
        user_id: &str,
        notification: &Notification,
    ) -> Result<(), DealcastError> {
        info!(user_id, message = %notification.message(), "owner notification");
        Ok(())
    }
}

/// Close storage, logging rather than failing on error.
pub async fn close_storage(storage: &SqliteStorage) {
    if let Err(e) = storage.close().await {
        warn!(error = %e, "failed to close storage cleanly");
    }
}
