// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dealcast serve` command implementation.
//!
//! Opens storage, recovers campaigns stranded in `preparing`, then runs the
//! posting scheduler and the discovery cycle until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use dealcast_config::model::DealcastConfig;
use dealcast_core::types::CampaignStatus;
use dealcast_core::{DealcastError, NotificationSink, PostingTransport, StorageAdapter};
use dealcast_engine::discovery::{DiscoveryCycle, DiscoverySettings, RefillSettings};
use dealcast_engine::{PostingScheduler, Populator, shutdown};
use dealcast_telegram::TelegramTransport;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::wiring;

/// Runs the `dealcast serve` command.
pub async fn run_serve(config: DealcastConfig) -> Result<(), DealcastError> {
    info!(service = %config.service.name, "starting dealcast serve");

    #[cfg(feature = "prometheus")]
    let _exporter = install_metrics(&config)?;

    let storage = wiring::open_storage(&config).await?;
    let recovered = recover_stranded(storage.as_ref()).await?;
    if recovered > 0 {
        warn!(count = recovered, "reset campaigns left preparing by a previous run");
    }

    let search = wiring::search_provider(&config)?;
    let transport = Arc::new(TelegramTransport::new(&config.telegram)?);
    let notifier: Arc<dyn NotificationSink + Send + Sync> = Arc::new(transport.notifier());
    let transport: Arc<dyn PostingTransport + Send + Sync> = transport;

    let tracker = TaskTracker::new();
    let populator = Arc::new(Populator::new(
        storage.clone(),
        search.clone(),
        notifier,
        RefillSettings::from_config(&config),
    ));
    let scheduler = PostingScheduler::new(storage.clone(), transport, populator, tracker);
    let discovery = Arc::new(DiscoveryCycle::new(
        storage.clone(),
        search,
        DiscoverySettings::from_config(&config),
    ));

    let cancel = shutdown::install_signal_handler();

    let discovery_handle = {
        let discovery = discovery.clone();
        let cancel = cancel.clone();
        let interval = Duration::from_secs(config.discovery.interval_secs);
        tokio::spawn(async move { discovery.run_periodic(interval, cancel).await })
    };

    info!(
        tick_secs = config.scheduler.tick_interval_secs,
        discovery_secs = config.discovery.interval_secs,
        "dealcast running"
    );
    scheduler
        .run(Duration::from_secs(config.scheduler.tick_interval_secs), cancel)
        .await;

    if let Err(e) = discovery_handle.await {
        warn!(error = %e, "discovery task ended abnormally");
    }
    wiring::close_storage(&storage).await;
    info!("dealcast stopped");
    Ok(())
}

/// Move every `preparing` campaign to `stopped`.
///
/// Only safe at startup, before any population pass can hold the gate.
pub async fn recover_stranded(
    storage: &(dyn StorageAdapter + Send + Sync),
) -> Result<usize, DealcastError> {
    let stranded = storage
        .list_campaigns(&[CampaignStatus::Preparing])
        .await?;
    for campaign in &stranded {
        storage
            .set_status(campaign.id, CampaignStatus::Stopped)
            .await?;
        info!(campaign_id = campaign.id, name = %campaign.name, "campaign reset to stopped");
    }
    Ok(stranded.len())
}

#[cfg(feature = "prometheus")]
fn install_metrics(
    config: &DealcastConfig,
) -> Result<Option<dealcast_prometheus::PrometheusExporter>, DealcastError> {
    let Some(listen) = config.metrics.prometheus_listen.as_deref() else {
        return Ok(None);
    };
    let addr = listen.parse::<std::net::SocketAddr>().map_err(|e| {
        DealcastError::Config(format!("invalid metrics.prometheus_listen `{listen}`: {e}"))
    })?;
    let exporter = dealcast_prometheus::PrometheusExporter::install(Some(addr))?;
    dealcast_engine::recording::register_metrics();
    Ok(Some(exporter))
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins; otherwise targets starting with `dealcast` log at
/// `log_level` and everything else at `warn`.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dealcast={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealcast_test_utils::TestHarness;
    use dealcast_test_utils::fixtures::new_campaign;

    #[tokio::test]
    async fn stranded_campaigns_are_stopped() {
        let harness = TestHarness::builder().build().await.unwrap();
        let stranded = harness
            .storage
            .create_campaign(&new_campaign("stranded"))
            .await
            .unwrap();
        let running = harness.running_campaign(new_campaign("live")).await.unwrap();

        let recovered = recover_stranded(harness.storage.as_ref()).await.unwrap();

        assert_eq!(recovered, 1);
        assert_eq!(
            harness.campaign(stranded.id).await.unwrap().status,
            CampaignStatus::Stopped
        );
        assert_eq!(
            harness.campaign(running.id).await.unwrap().status,
            CampaignStatus::Running
        );
    }
}
