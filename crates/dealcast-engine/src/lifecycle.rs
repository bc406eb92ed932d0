// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing campaign and timing operations.
//!
//! Enforces the lifecycle rules that do not involve population:
//! a campaign can only be started once it has a posting window, cannot be
//! started while a population pass holds it in `preparing`, and can always
//! be stopped.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use dealcast_core::types::{
    Campaign, CampaignId, CampaignStatus, NewCampaign, NewTiming, PostingStats, Timing,
};
use dealcast_core::{DealcastError, StorageAdapter};

/// A campaign plus the facts a listing shows next to it.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    pub campaign: Campaign,
    pub has_timing: bool,
    pub queue_size: usize,
}

/// Campaign state machine entry points for user actions.
#[derive(Clone)]
pub struct CampaignService {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
}

impl CampaignService {
    pub fn new(storage: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Validate and insert a new campaign. It starts out `preparing`.
    pub async fn create(&self, campaign: NewCampaign) -> Result<Campaign, DealcastError> {
        let name = campaign.name.trim();
        if name.is_empty() {
            return Err(DealcastError::Config("campaign name must not be empty".into()));
        }
        if campaign.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(DealcastError::Config(format!(
                "campaign `{name}` needs at least one category"
            )));
        }

        let channels: Vec<String> = campaign
            .channels
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if channels.is_empty() {
            return Err(DealcastError::Config(format!(
                "campaign `{name}` needs at least one channel"
            )));
        }

        let campaign = NewCampaign {
            name: name.to_string(),
            channels,
            ..campaign
        };
        let created = self.storage.create_campaign(&campaign).await?;
        info!(campaign_id = created.id, name = %created.name, "campaign created");
        Ok(created)
    }

    pub async fn is_name_available(&self, name: &str) -> Result<bool, DealcastError> {
        Ok(self.storage.get_campaign_by_name(name.trim()).await?.is_none())
    }

    pub async fn get(&self, id: CampaignId) -> Result<Campaign, DealcastError> {
        self.storage
            .get_campaign(id)
            .await?
            .ok_or_else(|| DealcastError::campaign_not_found(id))
    }

    /// Campaigns in `statuses` (all when empty) with timing and queue facts.
    pub async fn list(
        &self,
        statuses: &[CampaignStatus],
    ) -> Result<Vec<CampaignSummary>, DealcastError> {
        let campaigns = self.storage.list_campaigns(statuses).await?;
        let mut summaries = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let has_timing = self.storage.has_timings(campaign.id).await?;
            let queue_size = self.storage.queue_size(campaign.id).await?;
            summaries.push(CampaignSummary {
                campaign,
                has_timing,
                queue_size,
            });
        }
        Ok(summaries)
    }

    /// User "start". Requires a channel, at least one timing, and no population in flight.
    pub async fn start(&self, id: CampaignId) -> Result<Campaign, DealcastError> {
        let campaign = self.get(id).await?;
        match campaign.status {
            CampaignStatus::Running => return Ok(campaign),
            CampaignStatus::Preparing => {
                return Err(DealcastError::InvalidTransition {
                    from: campaign.status.to_string(),
                    to: CampaignStatus::Running.to_string(),
                    reason: "products are still being gathered".into(),
                });
            }
            CampaignStatus::Stopped => {}
        }

        if campaign.channels.iter().all(|c| c.trim().is_empty()) {
            return Err(DealcastError::Config(format!(
                "campaign `{}` has no channels to post to",
                campaign.name
            )));
        }

        if !self.storage.has_timings(id).await? {
            return Err(DealcastError::Config(format!(
                "campaign `{}` has no posting windows; add a timing before starting it",
                campaign.name
            )));
        }

        let applied = self
            .storage
            .compare_and_set_status(id, CampaignStatus::Stopped, CampaignStatus::Running)
            .await?;
        if !applied {
            return Err(DealcastError::Conflict(format!(
                "campaign {id} changed status while starting"
            )));
        }
        info!(campaign_id = id, "campaign started");
        self.get(id).await
    }

    /// User "stop". Always allowed; an in-flight population will not override it.
    pub async fn stop(&self, id: CampaignId) -> Result<Campaign, DealcastError> {
        self.storage.set_status(id, CampaignStatus::Stopped).await?;
        info!(campaign_id = id, "campaign stopped");
        self.get(id).await
    }

    /// Delete a campaign with its timings and queue. Fails if it does not exist.
    pub async fn delete(&self, id: CampaignId) -> Result<(), DealcastError> {
        if !self.storage.delete_campaign(id).await? {
            return Err(DealcastError::campaign_not_found(id));
        }
        info!(campaign_id = id, "campaign deleted");
        Ok(())
    }

    /// Add or update a posting window. `start` must precede `end`.
    pub async fn save_timing(&self, timing: NewTiming) -> Result<Timing, DealcastError> {
        if timing.start >= timing.end {
            return Err(DealcastError::Config(format!(
                "timing start {} must be before end {}",
                timing.start, timing.end
            )));
        }
        self.storage.save_timing(&timing).await
    }

    pub async fn list_timings(&self, campaign_id: CampaignId) -> Result<Vec<Timing>, DealcastError> {
        self.storage.list_timings(campaign_id).await
    }

    pub async fn remove_timing(&self, timing_id: i64) -> Result<(), DealcastError> {
        if !self.storage.delete_timing(timing_id).await? {
            return Err(DealcastError::NotFound {
                entity: "timing",
                id: timing_id.to_string(),
            });
        }
        Ok(())
    }

    /// Posting-log aggregates over the last `days` days.
    pub async fn stats(&self, id: CampaignId, days: u32) -> Result<PostingStats, DealcastError> {
        self.get(id).await?;
        self.storage.posting_stats(id, days).await
    }
}
