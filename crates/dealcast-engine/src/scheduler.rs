// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Posting scheduler: the fixed-interval tick that matches windows, throttles,
//! dequeues, and delivers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use dealcast_core::types::{Campaign, CampaignStatus, DeliveryReport, PostingRecord};
use dealcast_core::{DealcastError, PostingTransport, StorageAdapter};

use crate::population::{PopulationMode, Populator};
use crate::recording;
use crate::timing::{TickClock, frequency_allows, window_open};

/// Per-tick counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub running: usize,
    pub outside_window: usize,
    pub throttled: usize,
    /// Campaigns with nothing queued; a replenishment was launched for each.
    pub replenishing: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Clears the busy flag when the tick ends, including on early return.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives posting for all running campaigns.
pub struct PostingScheduler {
    storage: Arc<dyn StorageAdapter + Send + Sync>,
    transport: Arc<dyn PostingTransport + Send + Sync>,
    populator: Arc<Populator>,
    tracker: TaskTracker,
    busy: AtomicBool,
}

impl PostingScheduler {
    pub fn new(
        storage: Arc<dyn StorageAdapter + Send + Sync>,
        transport: Arc<dyn PostingTransport + Send + Sync>,
        populator: Arc<Populator>,
        tracker: TaskTracker,
    ) -> Self {
        Self {
            storage,
            transport,
            populator,
            tracker,
            busy: AtomicBool::new(false),
        }
    }

    fn try_begin(&self) -> Option<TickGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| TickGuard(&self.busy))
    }

    /// Process one tick at `clock`.
    ///
    /// Returns `None` without doing anything if another tick is still running.
    /// Storage errors abort the tick and propagate.
    pub async fn tick(&self, clock: &TickClock) -> Result<Option<TickReport>, DealcastError> {
        let Some(_guard) = self.try_begin() else {
            warn!("previous tick still running, skipping this one");
            recording::record_tick_skipped();
            return Ok(None);
        };

        let campaigns = self
            .storage
            .list_campaigns(&[CampaignStatus::Running])
            .await?;
        recording::set_running_campaigns(campaigns.len());

        let mut report = TickReport {
            running: campaigns.len(),
            ..Default::default()
        };
        for campaign in &campaigns {
            self.process_campaign(campaign, clock, &mut report).await?;
        }

        debug!(?report, "tick complete");
        Ok(Some(report))
    }

    async fn process_campaign(
        &self,
        campaign: &Campaign,
        clock: &TickClock,
        report: &mut TickReport,
    ) -> Result<(), DealcastError> {
        let timings = self.storage.list_timings(campaign.id).await?;
        if !window_open(&timings, clock) {
            report.outside_window += 1;
            return Ok(());
        }

        if !frequency_allows(campaign.posting_frequency, campaign.last_post_time, clock.utc) {
            report.throttled += 1;
            return Ok(());
        }

        let Some(product) = self.storage.get_next(campaign.id).await? else {
            info!(campaign_id = campaign.id, "queue empty, scheduling replenishment");
            self.populator
                .spawn_population(&self.tracker, campaign.id, PopulationMode::Replenish);
            report.replenishing += 1;
            return Ok(());
        };

        let delivery = match self.transport.deliver(campaign, &product).await {
            Ok(delivery) => delivery,
            Err(e) => {
                warn!(
                    campaign_id = campaign.id,
                    product_id = %product.product_id,
                    error = %e,
                    "delivery failed"
                );
                DeliveryReport::default()
            }
        };

        // Consumed whether or not delivery worked. A row purged since `get_next`
        // is already gone; the post itself still has to be logged.
        match self.storage.mark_posted(product.id).await {
            Ok(()) => {}
            Err(DealcastError::NotFound { .. }) => {
                warn!(
                    campaign_id = campaign.id,
                    product_id = %product.product_id,
                    "queued row vanished before it could be marked posted"
                );
            }
            Err(e) => return Err(e),
        }
        recording::record_post(delivery.success());

        if !delivery.success() {
            report.failed += 1;
            return Ok(());
        }

        self.storage
            .set_last_post_time(campaign.id, clock.utc)
            .await?;
        for channel in &delivery.delivered_channels {
            self.storage
                .record_posting(&PostingRecord {
                    campaign_id: campaign.id,
                    channel: channel.clone(),
                    product_id: product.product_id.clone(),
                    final_link: delivery.final_link.clone(),
                    posted_at: clock.utc,
                })
                .await?;
        }
        info!(
            campaign_id = campaign.id,
            product_id = %product.product_id,
            channels = delivery.delivered_channels.len(),
            "product posted"
        );
        report.delivered += 1;
        Ok(())
    }

    /// Tick every `interval` until cancelled, then wait for background
    /// populations to finish.
    pub async fn run(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(&TickClock::local_now()).await {
                        error!(error = %e, "scheduler tick failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        debug!("background populations drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::RefillSettings;
    use dealcast_test_utils::TestHarness;
    use dealcast_test_utils::fixtures::{candidate, new_campaign};
    use tracing_test::traced_test;

    fn scheduler(harness: &TestHarness) -> PostingScheduler {
        let populator = Arc::new(Populator::new(
            harness.storage.clone(),
            harness.search.clone(),
            harness.notifier.clone(),
            RefillSettings::from_config(&harness.config),
        ));
        PostingScheduler::new(
            harness.storage.clone(),
            harness.transport.clone(),
            populator,
            TaskTracker::new(),
        )
    }

    #[tokio::test]
    #[traced_test]
    async fn overlapping_tick_is_skipped() {
        let harness = TestHarness::builder().build().await.unwrap();
        let c = harness.running_campaign(new_campaign("busy")).await.unwrap();
        harness
            .storage
            .add_with_displacement(c.id, &candidate("a", None, Some(1)), 10)
            .await
            .unwrap();
        let scheduler = scheduler(&harness);

        let guard = scheduler.try_begin().unwrap();
        let skipped = scheduler.tick(&TickClock::local_now()).await.unwrap();
        assert!(skipped.is_none());
        assert_eq!(harness.transport.delivery_count().await, 0);
        assert!(logs_contain("previous tick still running"));

        drop(guard);
        let report = scheduler.tick(&TickClock::local_now()).await.unwrap().unwrap();
        assert_eq!(report.running, 1);
    }

    /// Delivers everywhere, but the queued row disappears mid-delivery as if
    /// retention cleanup had purged it.
    struct VanishingRowTransport {
        storage: Arc<dyn StorageAdapter + Send + Sync>,
    }

    #[async_trait::async_trait]
    impl dealcast_core::PluginAdapter for VanishingRowTransport {
        fn name(&self) -> &str {
            "vanishing-row"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn adapter_type(&self) -> dealcast_core::AdapterType {
            dealcast_core::AdapterType::Transport
        }

        async fn health_check(&self) -> Result<dealcast_core::HealthStatus, DealcastError> {
            Ok(dealcast_core::HealthStatus::Healthy)
        }

        async fn shutdown(&self) -> Result<(), DealcastError> {
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl PostingTransport for VanishingRowTransport {
        async fn deliver(
            &self,
            campaign: &Campaign,
            product: &dealcast_core::types::QueuedProduct,
        ) -> Result<DeliveryReport, DealcastError> {
            self.storage.mark_posted(product.id).await?;
            Ok(DeliveryReport {
                delivered_channels: campaign.channels.clone(),
                final_link: "https://shop.example/p".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn purged_row_still_logs_the_delivered_post() {
        let harness = TestHarness::builder().build().await.unwrap();
        let vanishing = harness.running_campaign(new_campaign("vanishing")).await.unwrap();
        let steady = harness.running_campaign(new_campaign("steady")).await.unwrap();
        for c in [&vanishing, &steady] {
            harness
                .storage
                .add_with_displacement(c.id, &candidate("a", None, Some(1)), 10)
                .await
                .unwrap();
        }
        let populator = Arc::new(Populator::new(
            harness.storage.clone(),
            harness.search.clone(),
            harness.notifier.clone(),
            RefillSettings::from_config(&harness.config),
        ));
        let scheduler = PostingScheduler::new(
            harness.storage.clone(),
            Arc::new(VanishingRowTransport {
                storage: harness.storage.clone(),
            }),
            populator,
            TaskTracker::new(),
        );

        let report = scheduler.tick(&TickClock::local_now()).await.unwrap().unwrap();

        assert_eq!(report.delivered, 2);
        for c in [&vanishing, &steady] {
            let stats = harness.storage.posting_stats(c.id, 1).await.unwrap();
            assert_eq!(stats.total_posts, 1);
            assert!(harness.campaign(c.id).await.unwrap().last_post_time.is_some());
        }
    }

    #[tokio::test]
    async fn guard_is_released_after_each_tick() {
        let harness = TestHarness::builder().build().await.unwrap();
        let scheduler = scheduler(&harness);

        let first = scheduler.tick(&TickClock::local_now()).await.unwrap();
        assert_eq!(first.unwrap().running, 0);
        assert!(scheduler.try_begin().is_some());
    }
}
