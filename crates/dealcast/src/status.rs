// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dealcast status` command implementation.
//!
//! Reads the database directly, so it works whether or not `serve` is running.

use dealcast_config::model::DealcastConfig;
use dealcast_core::types::{CampaignStatus, HealthStatus};
use dealcast_core::{DealcastError, PluginAdapter};
use dealcast_engine::{CampaignService, CampaignSummary};
use serde::Serialize;

use crate::wiring;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub storage: String,
    pub running: usize,
    pub stopped: usize,
    pub preparing: usize,
    pub queued_products: usize,
    pub campaigns: Vec<CampaignSummary>,
}

impl StatusResponse {
    fn new(database_path: String, storage: HealthStatus, campaigns: Vec<CampaignSummary>) -> Self {
        let count = |status: CampaignStatus| {
            campaigns
                .iter()
                .filter(|s| s.campaign.status == status)
                .count()
        };
        Self {
            database_path,
            storage: match storage {
                HealthStatus::Healthy => "healthy".to_string(),
                HealthStatus::Degraded(reason) => format!("degraded: {reason}"),
                HealthStatus::Unhealthy(reason) => format!("unhealthy: {reason}"),
            },
            running: count(CampaignStatus::Running),
            stopped: count(CampaignStatus::Stopped),
            preparing: count(CampaignStatus::Preparing),
            queued_products: campaigns.iter().map(|s| s.queue_size).sum(),
            campaigns,
        }
    }
}

/// Run the `dealcast status` command.
pub async fn run_status(config: &DealcastConfig, json: bool) -> Result<(), DealcastError> {
    let storage = wiring::open_storage(config).await?;
    let health = storage.health_check().await?;
    let campaigns = CampaignService::new(storage.clone()).list(&[]).await?;
    wiring::close_storage(&storage).await;

    let status = StatusResponse::new(config.storage.database_path.clone(), health, campaigns);
    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| DealcastError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        print!("{}", render_status(&status));
    }
    Ok(())
}

fn render_status(status: &StatusResponse) -> String {
    let mut out = format!(
        "database: {} ({})\ncampaigns: {} running, {} stopped, {} preparing\nqueued products: {}\n",
        status.database_path,
        status.storage,
        status.running,
        status.stopped,
        status.preparing,
        status.queued_products,
    );
    for summary in &status.campaigns {
        out.push_str(&crate::campaign::summary_line(summary));
        out.push('\n');
    }
    out
}
