// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery cycle: refills low queues from the search provider and runs
//! retention cleanup.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dealcast_config::model::DealcastConfig;
use dealcast_core::types::{AdmissionOutcome, Campaign, CampaignStatus};
use dealcast_core::{DealcastError, SearchProvider, SearchRequest, StorageAdapter};

use crate::recording;

/// Items requested per category: fewer per category as the category count grows.
pub fn fetch_breadth(category_count: usize) -> usize {
    match category_count {
        0 | 1 => 100,
        2..=5 => 30,
        _ => 10,
    }
}

/// Settings shared by every refill pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefillSettings {
    pub capacity: usize,
    pub freshness_window_days: u32,
    pub exclude_limit: usize,
}

impl RefillSettings {
    pub fn from_config(config: &DealcastConfig) -> Self {
        Self {
            capacity: config.queue.capacity,
            freshness_window_days: config.dedup.freshness_window_days,
            exclude_limit: config.discovery.exclude_limit,
        }
    }
}

/// Diagnostic counters for one refill pass. They do not affect correctness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefillStats {
    pub fetched: usize,
    pub added: usize,
    pub displaced: usize,
    pub variation_skipped: usize,
    pub rejected: usize,
    pub excluded: usize,
    pub missing_score: usize,
    pub over_threshold: usize,
    pub errors: usize,
}

impl RefillStats {
    /// Candidates that ended up in the queue.
    pub fn admitted(&self) -> usize {
        self.added + self.displaced
    }

    fn record(&mut self, outcome: AdmissionOutcome) {
        match outcome {
            AdmissionOutcome::Added => self.added += 1,
            AdmissionOutcome::Displaced => self.displaced += 1,
            AdmissionOutcome::VariationSkipped => self.variation_skipped += 1,
            AdmissionOutcome::Rejected => self.rejected += 1,
        }
        recording::record_admission(outcome);
    }

    fn absorb(&mut self, other: &RefillStats) {
        self.fetched += other.fetched;
        self.added += other.added;
        self.displaced += other.displaced;
        self.variation_skipped += other.variation_skipped;
        self.rejected += other.rejected;
        self.excluded += other.excluded;
        self.missing_score += other.missing_score;
        self.over_threshold += other.over_threshold;
        self.errors += other.errors;
    }
}

/// Fetch candidates for one campaign and offer the survivors to its queue.
///
/// The caller must hold the campaign in `preparing`. The dedup snapshot is
/// taken once, before the search call, and used for the whole pass.
/// Search failures and snapshot failures abort the pass; a storage failure
/// on a single candidate is counted and the pass continues.
pub async fn refill_queue(
    storage: &(dyn StorageAdapter + Send + Sync),
    search: &(dyn SearchProvider + Send + Sync),
    campaign: &Campaign,
    settings: &RefillSettings,
) -> Result<RefillStats, DealcastError> {
    let excluded = storage
        .excluded_product_ids(
            campaign.id,
            settings.freshness_window_days,
            settings.exclude_limit,
        )
        .await?;

    let mut exclude_ids: Vec<String> = excluded.iter().cloned().collect();
    exclude_ids.sort_unstable();
    let request = SearchRequest {
        category_ids: campaign.categories.clone(),
        filters: campaign.filters.clone(),
        exclude_ids,
        breadth: fetch_breadth(campaign.categories.len()),
    };

    let candidates = search.fetch_candidates(&request).await?;
    let mut stats = RefillStats {
        fetched: candidates.len(),
        ..Default::default()
    };

    for candidate in candidates {
        if excluded.contains(&candidate.product_id) {
            stats.excluded += 1;
            continue;
        }
        let Some(score) = candidate.quality_score else {
            stats.missing_score += 1;
            continue;
        };
        if score > campaign.filters.max_quality_score {
            stats.over_threshold += 1;
            continue;
        }

        match storage
            .add_with_displacement(campaign.id, &candidate, settings.capacity)
            .await
        {
            Ok(outcome) => stats.record(outcome),
            Err(e) => {
                warn!(
                    campaign_id = campaign.id,
                    product_id = %candidate.product_id,
                    error = %e,
                    "failed to admit candidate"
                );
                stats.errors += 1;
            }
        }
    }

    recording::record_filtered("excluded", stats.excluded);
    recording::record_filtered("missing_score", stats.missing_score);
    recording::record_filtered("over_threshold", stats.over_threshold);
    recording::record_filtered("error", stats.errors);
    debug!(campaign_id = campaign.id, ?stats, "refill pass complete");
    Ok(stats)
}

/// Settings for the periodic cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub refill: RefillSettings,
    pub low_water_mark: usize,
    pub queued_ttl_days: u32,
    pub posted_ttl_days: u32,
    pub posting_log_retention_days: u32,
}

impl DiscoverySettings {
    pub fn from_config(config: &DealcastConfig) -> Self {
        Self {
            refill: RefillSettings::from_config(config),
            low_water_mark: config.discovery.low_water_mark,
            queued_ttl_days: config.queue.queued_ttl_days,
            posted_ttl_days: config.queue.posted_ttl_days,
            posting_log_retention_days: config.dedup.posting_log_retention_days,
        }
    }
}

/// What one discovery cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Campaigns that got a refill pass.
    pub refilled: usize,
    /// Campaigns at or above the low-water mark.
    pub sufficient: usize,
    pub skipped_no_categories: usize,
    /// Campaigns already held by another population pass.
    pub skipped_in_flight: usize,
    /// Campaigns whose search call failed.
    pub failed: usize,
    pub stats: RefillStats,
    pub queue_rows_purged: usize,
    pub log_rows_pruned: usize,
}

/// Periodic refill of low queues plus retention cleanup.
pub struct DiscoveryCycle {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    search: Arc<dyn SearchProvider + Send + Sync>,
    settings: DiscoverySettings,
}

impl DiscoveryCycle {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        search: Arc<dyn SearchProvider + Send + Sync>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            storage,
            search,
            settings,
        }
    }

    /// Run one cycle over every running campaign below the low-water mark.
    pub async fn run(&self) -> Result<DiscoveryReport, DealcastError> {
        let mut report = DiscoveryReport::default();
        let campaigns = self
            .storage
            .list_campaigns(&[CampaignStatus::Running, CampaignStatus::Preparing])
            .await?;

        for campaign in campaigns {
            let size = self.storage.queue_size(campaign.id).await?;
            if size >= self.settings.low_water_mark {
                report.sufficient += 1;
                continue;
            }
            if campaign.categories.is_empty() {
                debug!(campaign_id = campaign.id, "no categories configured, skipping");
                report.skipped_no_categories += 1;
                continue;
            }
            if campaign.status == CampaignStatus::Preparing {
                report.skipped_in_flight += 1;
                continue;
            }
            self.refill_campaign(&campaign, &mut report).await?;
        }

        report.queue_rows_purged = self
            .storage
            .cleanup_queue(self.settings.queued_ttl_days, self.settings.posted_ttl_days)
            .await?;
        report.log_rows_pruned = self
            .storage
            .prune_posting_log(self.settings.posting_log_retention_days)
            .await?;
        recording::record_purged("product_queue", report.queue_rows_purged);
        recording::record_purged("posting_log", report.log_rows_pruned);

        info!(
            refilled = report.refilled,
            failed = report.failed,
            added = report.stats.added,
            displaced = report.stats.displaced,
            purged = report.queue_rows_purged,
            pruned = report.log_rows_pruned,
            "discovery cycle complete"
        );
        Ok(report)
    }

    /// Claim the campaign, refill it, and hand it back as `running`.
    async fn refill_campaign(
        &self,
        campaign: &Campaign,
        report: &mut DiscoveryReport,
    ) -> Result<(), DealcastError> {
        let claimed = self
            .storage
            .compare_and_set_status(campaign.id, CampaignStatus::Running, CampaignStatus::Preparing)
            .await?;
        if !claimed {
            report.skipped_in_flight += 1;
            return Ok(());
        }

        let result = refill_queue(
            self.storage.as_ref(),
            self.search.as_ref(),
            campaign,
            &self.settings.refill,
        )
        .await;

        let restored = self
            .storage
            .compare_and_set_status(campaign.id, CampaignStatus::Preparing, CampaignStatus::Running)
            .await?;
        if !restored {
            warn!(
                campaign_id = campaign.id,
                "campaign status changed during discovery, leaving it as is"
            );
        }

        match result {
            Ok(stats) => {
                report.refilled += 1;
                report.stats.absorb(&stats);
                Ok(())
            }
            Err(e @ DealcastError::Search { .. }) => {
                warn!(campaign_id = campaign.id, error = %e, "search failed during discovery");
                report.failed += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Run cycles every `interval` until cancelled. The first cycle starts immediately.
    pub async fn run_periodic(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run().await {
                        error!(error = %e, "discovery cycle failed");
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("discovery loop shutting down");
                    break;
                }
            }
        }
    }
}
