// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DealcastError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AdmissionOutcome, Campaign, CampaignId, CampaignStatus, Candidate, NewCampaign, NewTiming,
    PostingRecord, PostingStats, QueuedProduct, Timing,
};

/// Adapter for storage and persistence backends.
///
/// Owns campaigns, their timing windows, the bounded per-campaign product
/// queue, and the append-only posting log. Every method is atomic on its own;
/// callers compose them under the `preparing` status gate.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), DealcastError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), DealcastError>;

    // --- Campaigns ---

    /// Inserts a campaign in `preparing` status. Duplicate names yield `Conflict`.
    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, DealcastError>;

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, DealcastError>;

    async fn get_campaign_by_name(&self, name: &str) -> Result<Option<Campaign>, DealcastError>;

    /// Lists campaigns whose status is in `statuses`; an empty slice lists all.
    async fn list_campaigns(
        &self,
        statuses: &[CampaignStatus],
    ) -> Result<Vec<Campaign>, DealcastError>;

    /// Unconditionally writes the status. Fails with `NotFound` for unknown ids.
    async fn set_status(&self, id: CampaignId, status: CampaignStatus)
    -> Result<(), DealcastError>;

    /// Writes `new` only if the stored status is still `expected`.
    ///
    /// Returns `false` when the row was missing or held another status.
    async fn compare_and_set_status(
        &self,
        id: CampaignId,
        expected: CampaignStatus,
        new: CampaignStatus,
    ) -> Result<bool, DealcastError>;

    async fn set_last_post_time(
        &self,
        id: CampaignId,
        at: DateTime<Utc>,
    ) -> Result<(), DealcastError>;

    /// Deletes a campaign together with its timings and queue rows.
    async fn delete_campaign(&self, id: CampaignId) -> Result<bool, DealcastError>;

    // --- Timings ---

    /// Upserts on `(campaign_id, day, start)`; an existing row only gets a new end time.
    async fn save_timing(&self, timing: &NewTiming) -> Result<Timing, DealcastError>;

    async fn list_timings(&self, campaign_id: CampaignId) -> Result<Vec<Timing>, DealcastError>;

    async fn delete_timing(&self, timing_id: i64) -> Result<bool, DealcastError>;

    async fn has_timings(&self, campaign_id: CampaignId) -> Result<bool, DealcastError>;

    // --- Product queue ---

    /// Admits `candidate` into a queue bounded by `capacity`, evicting the
    /// worst row when full and the candidate scores strictly better.
    async fn add_with_displacement(
        &self,
        campaign_id: CampaignId,
        candidate: &Candidate,
        capacity: usize,
    ) -> Result<AdmissionOutcome, DealcastError>;

    /// The best queued row: lowest score first, unknown scores last.
    async fn get_next(&self, campaign_id: CampaignId)
    -> Result<Option<QueuedProduct>, DealcastError>;

    /// Flips a queued row to `posted` and stamps `posted_at`.
    async fn mark_posted(&self, product_row_id: i64) -> Result<(), DealcastError>;

    /// Number of `queued` rows for the campaign.
    async fn queue_size(&self, campaign_id: CampaignId) -> Result<usize, DealcastError>;

    /// Purges `queued` rows older than `queued_ttl_days` and `posted` rows
    /// older than `posted_ttl_days`. Returns the number of rows removed.
    async fn cleanup_queue(
        &self,
        queued_ttl_days: u32,
        posted_ttl_days: u32,
    ) -> Result<usize, DealcastError>;

    // --- Posting log ---

    async fn record_posting(&self, record: &PostingRecord) -> Result<(), DealcastError>;

    /// Deletes posting-log rows older than `retention_days`.
    async fn prune_posting_log(&self, retention_days: u32) -> Result<usize, DealcastError>;

    /// Snapshot of product ids posted within `freshness_window_days` or
    /// currently queued, most recent first, capped at `limit`.
    async fn excluded_product_ids(
        &self,
        campaign_id: CampaignId,
        freshness_window_days: u32,
        limit: usize,
    ) -> Result<HashSet<String>, DealcastError>;

    async fn posting_stats(
        &self,
        campaign_id: CampaignId,
        days: u32,
    ) -> Result<PostingStats, DealcastError>;
}
