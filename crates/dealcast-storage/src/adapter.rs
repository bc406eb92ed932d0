// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use dealcast_config::model::StorageConfig;
use dealcast_core::types::{
    AdmissionOutcome, Campaign, CampaignId, CampaignStatus, Candidate, NewCampaign, NewTiming,
    PostingRecord, PostingStats, QueuedProduct, Timing,
};
use dealcast_core::{AdapterType, DealcastError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. No connection is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The underlying database, or an error if not yet initialized.
    pub fn db(&self) -> Result<&Database, DealcastError> {
        self.db.get().ok_or_else(|| DealcastError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self) -> Result<(), DealcastError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        if self.db.get().is_some() {
            self.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), DealcastError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DealcastError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DealcastError> {
        self.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Campaigns ---

    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, DealcastError> {
        queries::campaigns::create_campaign(self.db()?, campaign).await
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, DealcastError> {
        queries::campaigns::get_campaign(self.db()?, id).await
    }

    async fn get_campaign_by_name(&self, name: &str) -> Result<Option<Campaign>, DealcastError> {
        queries::campaigns::get_campaign_by_name(self.db()?, name).await
    }

    async fn list_campaigns(
        &self,
        statuses: &[CampaignStatus],
    ) -> Result<Vec<Campaign>, DealcastError> {
        queries::campaigns::list_campaigns(self.db()?, statuses).await
    }

    async fn set_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<(), DealcastError> {
        queries::campaigns::set_status(self.db()?, id, status).await
    }

    async fn compare_and_set_status(
        &self,
        id: CampaignId,
        expected: CampaignStatus,
        new: CampaignStatus,
    ) -> Result<bool, DealcastError> {
        queries::campaigns::compare_and_set_status(self.db()?, id, expected, new).await
    }

    async fn set_last_post_time(
        &self,
        id: CampaignId,
        at: DateTime<Utc>,
    ) -> Result<(), DealcastError> {
        queries::campaigns::set_last_post_time(self.db()?, id, at).await
    }

    async fn delete_campaign(&self, id: CampaignId) -> Result<bool, DealcastError> {
        queries::campaigns::delete_campaign(self.db()?, id).await
    }

    // --- Timings ---

    async fn save_timing(&self, timing: &NewTiming) -> Result<Timing, DealcastError> {
        queries::timings::save_timing(self.db()?, timing).await
    }

    async fn list_timings(&self, campaign_id: CampaignId) -> Result<Vec<Timing>, DealcastError> {
        queries::timings::list_timings(self.db()?, campaign_id).await
    }

    async fn delete_timing(&self, timing_id: i64) -> Result<bool, DealcastError> {
        queries::timings::delete_timing(self.db()?, timing_id).await
    }

    async fn has_timings(&self, campaign_id: CampaignId) -> Result<bool, DealcastError> {
        queries::timings::has_timings(self.db()?, campaign_id).await
    }

    // --- Product queue ---

    async fn add_with_displacement(
        &self,
        campaign_id: CampaignId,
        candidate: &Candidate,
        capacity: usize,
    ) -> Result<AdmissionOutcome, DealcastError> {
        queries::queue::add_with_displacement(self.db()?, campaign_id, candidate, capacity).await
    }

    async fn get_next(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<QueuedProduct>, DealcastError> {
        queries::queue::get_next(self.db()?, campaign_id).await
    }

    async fn mark_posted(&self, product_row_id: i64) -> Result<(), DealcastError> {
        queries::queue::mark_posted(self.db()?, product_row_id).await
    }

    async fn queue_size(&self, campaign_id: CampaignId) -> Result<usize, DealcastError> {
        queries::queue::queue_size(self.db()?, campaign_id).await
    }

    async fn cleanup_queue(
        &self,
        queued_ttl_days: u32,
        posted_ttl_days: u32,
    ) -> Result<usize, DealcastError> {
        queries::queue::cleanup_queue(self.db()?, queued_ttl_days, posted_ttl_days).await
    }

    // --- Posting log ---

    async fn record_posting(&self, record: &PostingRecord) -> Result<(), DealcastError> {
        queries::posting_log::record_posting(self.db()?, record).await
    }

    async fn prune_posting_log(&self, retention_days: u32) -> Result<usize, DealcastError> {
        queries::posting_log::prune_posting_log(self.db()?, retention_days).await
    }

    async fn excluded_product_ids(
        &self,
        campaign_id: CampaignId,
        freshness_window_days: u32,
        limit: usize,
    ) -> Result<HashSet<String>, DealcastError> {
        queries::dedup::excluded_product_ids(self.db()?, campaign_id, freshness_window_days, limit)
            .await
    }

    async fn posting_stats(
        &self,
        campaign_id: CampaignId,
        days: u32,
    ) -> Result<PostingStats, DealcastError> {
        queries::posting_log::posting_stats(self.db()?, campaign_id, days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn operations_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.get_campaign(1).await.is_err());
        assert!(matches!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }

    #[tokio::test]
    async fn initialize_twice_is_an_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("twice.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(storage.initialize().await.is_err());
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        storage.close().await.unwrap();
    }
}
