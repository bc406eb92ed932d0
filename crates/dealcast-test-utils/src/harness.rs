// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for engine-level integration tests.
//!
//! `TestHarness` owns an initialized SQLite store in a temp directory, the
//! mock collaborators, and a config tuned for small queues.

use std::sync::Arc;

use dealcast_config::model::{DealcastConfig, StorageConfig};
use dealcast_core::types::{
    Campaign, CampaignStatus, Candidate, NewCampaign, NewTiming, TimingDay,
};
use dealcast_core::{DealcastError, StorageAdapter};
use dealcast_storage::SqliteStorage;

use crate::fixtures::hms;
use crate::mock_notifier::MockNotifier;
use crate::mock_search::MockSearchProvider;
use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<Vec<Candidate>>,
    config: DealcastConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            config: DealcastConfig::default(),
        }
    }

    /// Scripted search responses, consumed in order.
    pub fn with_search_responses(mut self, responses: Vec<Vec<Candidate>>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue.capacity = capacity;
        self
    }

    pub fn with_low_water_mark(mut self, mark: usize) -> Self {
        self.config.discovery.low_water_mark = mark;
        self
    }

    /// Build the harness, creating and migrating a fresh database.
    pub async fn build(self) -> Result<TestHarness, DealcastError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| DealcastError::Storage {
            source: e.into(),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;

        Ok(TestHarness {
            storage: Arc::new(storage),
            search: Arc::new(MockSearchProvider::with_responses(self.responses)),
            transport: Arc::new(MockTransport::new()),
            notifier: Arc::new(MockNotifier::new()),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    pub storage: Arc<SqliteStorage>,
    pub search: Arc<MockSearchProvider>,
    pub transport: Arc<MockTransport>,
    pub notifier: Arc<MockNotifier>,
    pub config: DealcastConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Create a campaign, give it a whole-day window, and mark it running.
    pub async fn running_campaign(&self, campaign: NewCampaign) -> Result<Campaign, DealcastError> {
        let created = self.storage.create_campaign(&campaign).await?;
        self.storage
            .save_timing(&NewTiming {
                campaign_id: created.id,
                day: TimingDay::Daily,
                start: hms(0, 0, 0),
                end: hms(23, 59, 59),
            })
            .await?;
        self.storage
            .set_status(created.id, CampaignStatus::Running)
            .await?;
        self.campaign(created.id).await
    }

    /// Re-read a campaign, failing if it no longer exists.
    pub async fn campaign(&self, id: i64) -> Result<Campaign, DealcastError> {
        self.storage
            .get_campaign(id)
            .await?
            .ok_or_else(|| DealcastError::campaign_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::new_campaign;

    #[tokio::test]
    async fn harness_builds_with_initialized_storage() {
        let harness = TestHarness::builder()
            .with_queue_capacity(3)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.config.queue.capacity, 3);
        assert!(harness.storage.list_campaigns(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn running_campaign_has_a_window() {
        let harness = TestHarness::builder().build().await.unwrap();
        let campaign = harness.running_campaign(new_campaign("h")).await.unwrap();
        assert_eq!(campaign.status, CampaignStatus::Running);
        assert!(harness.storage.has_timings(campaign.id).await.unwrap());
    }
}
