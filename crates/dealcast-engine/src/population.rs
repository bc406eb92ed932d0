// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-demand queue population under the `preparing` status gate.
//!
//! A population pass owns its campaign from the moment it writes `preparing`
//! until it writes the end status. Scheduling and discovery both ignore
//! `preparing` campaigns, which is what keeps two passes off the same queue.
//! The end status is written with a compare-and-swap, so a user "stop" that
//! lands mid-pass is not overwritten.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use dealcast_core::types::{Campaign, CampaignId, CampaignStatus, NewCampaign, Notification};
use dealcast_core::{DealcastError, NotificationSink, SearchProvider, StorageAdapter};

use crate::discovery::{RefillSettings, refill_queue};
use crate::lifecycle::CampaignService;
use crate::recording;

/// Why a population pass runs, which decides its end status and who hears about failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationMode {
    /// First fill after creation. Ends `stopped` so the owner reviews and starts it.
    Initial,
    /// Background top-up of a running campaign whose queue ran dry. Ends `running`.
    Replenish,
}

impl PopulationMode {
    pub fn restore_status(self) -> CampaignStatus {
        match self {
            Self::Initial => CampaignStatus::Stopped,
            Self::Replenish => CampaignStatus::Running,
        }
    }

    /// Whether search failures are reported to the owner.
    pub fn interactive(self) -> bool {
        matches!(self, Self::Initial)
    }
}

/// How a population pass ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PopulationOutcome {
    /// Products were admitted and the campaign went back to its restore status.
    Admitted { count: usize },
    /// Nothing usable was found; the campaign is now `stopped`.
    Exhausted,
    /// The search collaborator failed; the campaign went back to its restore status.
    Failed { reason: String },
    /// Another pass already holds the campaign, or it is no longer running.
    Skipped,
}

/// Runs population passes against the search provider.
pub struct Populator {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    search: Arc<dyn SearchProvider + Send + Sync>,
    notifier: Arc<dyn NotificationSink + Send + Sync>,
    settings: RefillSettings,
}

impl Populator {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        search: Arc<dyn SearchProvider + Send + Sync>,
        notifier: Arc<dyn NotificationSink + Send + Sync>,
        settings: RefillSettings,
    ) -> Self {
        Self {
            storage,
            search,
            notifier,
            settings,
        }
    }

    /// Run one population pass for `campaign_id`.
    ///
    /// A campaign without categories is rejected before any state changes.
    /// Storage errors propagate; the campaign is released first when possible.
    pub async fn populate(
        &self,
        campaign_id: CampaignId,
        mode: PopulationMode,
    ) -> Result<PopulationOutcome, DealcastError> {
        let campaign = self
            .storage
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| DealcastError::campaign_not_found(campaign_id))?;

        if campaign.categories.is_empty() {
            return Err(DealcastError::Config(format!(
                "campaign `{}` has no categories to search",
                campaign.name
            )));
        }

        match mode {
            PopulationMode::Initial => {
                self.storage
                    .set_status(campaign_id, CampaignStatus::Preparing)
                    .await?;
            }
            PopulationMode::Replenish => {
                let claimed = self
                    .storage
                    .compare_and_set_status(
                        campaign_id,
                        CampaignStatus::Running,
                        CampaignStatus::Preparing,
                    )
                    .await?;
                if !claimed {
                    debug!(campaign_id, "campaign not running, replenishment skipped");
                    recording::record_population("skipped");
                    return Ok(PopulationOutcome::Skipped);
                }
            }
        }

        let result = refill_queue(
            self.storage.as_ref(),
            self.search.as_ref(),
            &campaign,
            &self.settings,
        )
        .await;

        match result {
            Ok(stats) if stats.admitted() == 0 => {
                self.release(campaign_id, CampaignStatus::Stopped).await?;
                info!(campaign_id, ?stats, "population found no products, campaign stopped");
                self.notify_owner(
                    &campaign,
                    Notification::PopulationComplete {
                        campaign_id,
                        campaign_name: campaign.name.clone(),
                        count: 0,
                    },
                )
                .await;
                recording::record_population("exhausted");
                Ok(PopulationOutcome::Exhausted)
            }
            Ok(stats) => {
                self.release(campaign_id, mode.restore_status()).await?;
                let count = stats.admitted();
                info!(campaign_id, count, ?mode, "population complete");
                recording::record_population("admitted");
                Ok(PopulationOutcome::Admitted { count })
            }
            Err(e @ DealcastError::Search { .. }) => {
                self.release(campaign_id, mode.restore_status()).await?;
                warn!(campaign_id, error = %e, ?mode, "population search failed");
                if mode.interactive() {
                    self.notify_owner(
                        &campaign,
                        Notification::PopulationFailed {
                            campaign_id,
                            campaign_name: campaign.name.clone(),
                            reason: e.to_string(),
                        },
                    )
                    .await;
                }
                recording::record_population("failed");
                Ok(PopulationOutcome::Failed {
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                if let Err(release_err) = self.release(campaign_id, mode.restore_status()).await {
                    error!(campaign_id, error = %release_err, "failed to release campaign");
                }
                Err(e)
            }
        }
    }

    /// Launch a pass on `tracker` without waiting for it.
    pub fn spawn_population(
        self: &Arc<Self>,
        tracker: &TaskTracker,
        campaign_id: CampaignId,
        mode: PopulationMode,
    ) {
        let populator = Arc::clone(self);
        tracker.spawn(async move {
            match populator.populate(campaign_id, mode).await {
                Ok(outcome) => debug!(campaign_id, ?outcome, "background population finished"),
                Err(e) => error!(campaign_id, error = %e, "background population failed"),
            }
        });
    }

    /// Create a campaign and start its initial population in the background.
    pub async fn create_and_populate(
        self: &Arc<Self>,
        service: &CampaignService,
        campaign: NewCampaign,
        tracker: &TaskTracker,
    ) -> Result<Campaign, DealcastError> {
        let created = service.create(campaign).await?;
        self.spawn_population(tracker, created.id, PopulationMode::Initial);
        Ok(created)
    }

    /// Leave `preparing` for `status`, unless someone else already moved the campaign.
    async fn release(
        &self,
        campaign_id: CampaignId,
        status: CampaignStatus,
    ) -> Result<(), DealcastError> {
        let applied = self
            .storage
            .compare_and_set_status(campaign_id, CampaignStatus::Preparing, status)
            .await?;
        if !applied {
            warn!(
                campaign_id,
                target = %status,
                "campaign left preparing during population, keeping its current status"
            );
        }
        Ok(())
    }

    async fn notify_owner(&self, campaign: &Campaign, notification: Notification) {
        let Some(owner) = campaign.created_by.as_deref() else {
            info!(campaign_id = campaign.id, message = %notification.message(), "no owner to notify");
            return;
        };
        if let Err(e) = self.notifier.notify(owner, &notification).await {
            warn!(campaign_id = campaign.id, error = %e, "owner notification failed");
        }
    }
}
