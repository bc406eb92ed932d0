// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dealcast campaign` and `dealcast timing` subcommands.
//!
//! Handlers return the text to print so they can be tested without a terminal.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::NaiveTime;
use clap::Subcommand;
use dealcast_config::model::DealcastConfig;
use dealcast_core::DealcastError;
use dealcast_core::types::{
    CampaignId, CampaignStatus, NewCampaign, NewTiming, QualityFilters, TimingDay,
};
use dealcast_engine::discovery::RefillSettings;
use dealcast_engine::{
    CampaignService, CampaignSummary, Populator, TickClock, conflicting_channels,
};
use dealcast_storage::SqliteStorage;
use tokio_util::task::TaskTracker;

use crate::wiring;

#[derive(Subcommand, Debug)]
pub enum CampaignCommand {
    /// Create a campaign and fill its queue. It ends `stopped`, ready to start.
    Create {
        name: String,
        /// Target channel (`@username` or numeric chat id). Repeatable.
        #[arg(long = "channel", required = true, allow_hyphen_values = true)]
        channels: Vec<String>,
        /// Search category id. Repeatable.
        #[arg(long = "category", required = true)]
        categories: Vec<String>,
        /// Posts per hour; 0 posts on every tick inside a window.
        #[arg(long, default_value_t = 0)]
        frequency: u32,
        #[arg(long)]
        track_id: Option<String>,
        /// User id that receives population notifications.
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(long)]
        min_reviews: Option<i64>,
        /// Highest acceptable quality score; lower is better.
        #[arg(long)]
        max_score: Option<i64>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        fulfilled_only: bool,
    },
    /// List campaigns, optionally filtered by status.
    List {
        #[arg(long)]
        status: Vec<CampaignStatus>,
    },
    /// Start posting. Needs at least one timing.
    Start { id: CampaignId },
    /// Stop posting.
    Stop { id: CampaignId },
    /// Delete a campaign with its timings and queue.
    Delete { id: CampaignId },
    /// Running campaigns sharing a channel with this one right now.
    Conflicts { id: CampaignId },
    /// Posting statistics.
    Stats {
        id: CampaignId,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum TimingCommand {
    /// Add a posting window, or change the end of an existing one.
    Add {
        campaign_id: CampaignId,
        /// `daily`, `mon`..`sun`, or 0 (Monday) to 6 (Sunday).
        #[arg(long)]
        day: TimingDay,
        /// Window start, `HH:MM` or `HH:MM:SS`.
        #[arg(long, value_parser = parse_clock)]
        start: NaiveTime,
        /// Window end (exclusive).
        #[arg(long, value_parser = parse_clock)]
        end: NaiveTime,
    },
    /// Remove a posting window by id.
    Remove { timing_id: i64 },
    /// List a campaign's posting windows.
    List { campaign_id: CampaignId },
}

/// Parses `HH:MM:SS` or `HH:MM`.
pub fn parse_clock(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("`{s}` is not a time of day (expected HH:MM or HH:MM:SS)"))
}

/// One listing row.
pub fn summary_line(summary: &CampaignSummary) -> String {
    let c = &summary.campaign;
    let last_post = c
        .last_post_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{:>4}  {:<24} {:<9} queue={:<4} windows={} last_post={}",
        c.id,
        c.name,
        c.status.to_string(),
        summary.queue_size,
        if summary.has_timing { "yes" } else { "no" },
        last_post,
    )
}

pub async fn run_campaign(
    config: &DealcastConfig,
    command: CampaignCommand,
) -> Result<String, DealcastError> {
    let storage = wiring::open_storage(config).await?;
    let service = CampaignService::new(storage.clone());

    let result = match command {
        CampaignCommand::Create {
            name,
            channels,
            categories,
            frequency,
            track_id,
            owner,
            min_rating,
            min_reviews,
            max_score,
            min_price,
            fulfilled_only,
        } => {
            let new = NewCampaign {
                name,
                channels,
                categories,
                filters: QualityFilters {
                    min_rating,
                    min_review_count: min_reviews,
                    max_quality_score: max_score
                        .unwrap_or(QualityFilters::default().max_quality_score),
                    min_price,
                    fulfilled_only,
                },
                posting_frequency: frequency,
                track_id,
                created_by: owner,
            };
            create_and_wait(config, &storage, &service, new).await
        }
        CampaignCommand::List { status } => {
            let summaries = service.list(&status).await?;
            if summaries.is_empty() {
                Ok("no campaigns".to_string())
            } else {
                Ok(summaries
                    .iter()
                    .map(summary_line)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
        CampaignCommand::Start { id } => service
            .start(id)
            .await
            .map(|c| format!("campaign {} is {}", c.id, c.status)),
        CampaignCommand::Stop { id } => service
            .stop(id)
            .await
            .map(|c| format!("campaign {} is {}", c.id, c.status)),
        CampaignCommand::Delete { id } => service
            .delete(id)
            .await
            .map(|()| format!("campaign {id} deleted")),
        CampaignCommand::Conflicts { id } => {
            service.get(id).await?;
            let conflicts =
                conflicting_channels(storage.as_ref(), id, &TickClock::local_now()).await?;
            if conflicts.is_empty() {
                Ok(format!("no running campaign shares a channel with {id} right now"))
            } else {
                Ok(conflicts
                    .iter()
                    .map(|c| format!("{} ({}): {}", c.campaign_id, c.campaign_name, c.channels.join(", ")))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
        CampaignCommand::Stats { id, days } => service.stats(id, days).await.map(|stats| {
            let mut out = format!(
                "last {days} days: {} posts, {} distinct products",
                stats.total_posts, stats.distinct_products
            );
            for (channel, posts) in &stats.per_channel {
                let _ = write!(out, "\n  {channel}: {posts}");
            }
            out
        }),
    };

    wiring::close_storage(&storage).await;
    result
}

/// Create the campaign, wait for its initial population, and report the result.
async fn create_and_wait(
    config: &DealcastConfig,
    storage: &Arc<SqliteStorage>,
    service: &CampaignService,
    campaign: NewCampaign,
) -> Result<String, DealcastError> {
    // Resolved first so a missing search endpoint inserts nothing.
    let search = wiring::search_provider(config)?;
    let notifier = wiring::notifier(config)?;
    let populator = Arc::new(Populator::new(
        storage.clone(),
        search,
        notifier,
        RefillSettings::from_config(config),
    ));

    let tracker = TaskTracker::new();
    let created = populator
        .create_and_populate(service, campaign, &tracker)
        .await?;
    tracker.close();
    tracker.wait().await;

    let summary = service
        .list(&[])
        .await?
        .into_iter()
        .find(|s| s.campaign.id == created.id)
        .ok_or_else(|| DealcastError::campaign_not_found(created.id))?;
    Ok(format!(
        "created campaign {} with {} products queued (status {})",
        created.id, summary.queue_size, summary.campaign.status
    ))
}

pub async fn run_timing(
    config: &DealcastConfig,
    command: TimingCommand,
) -> Result<String, DealcastError> {
    let storage = wiring::open_storage(config).await?;
    let service = CampaignService::new(storage.clone());
    let result = match command {
        TimingCommand::Add {
            campaign_id,
            day,
            start,
            end,
        } => service
            .save_timing(NewTiming {
                campaign_id,
                day,
                start,
                end,
            })
            .await
            .map(|t| format!("timing {}: {} {}-{}", t.id, t.day, t.start, t.end)),
        TimingCommand::Remove { timing_id } => service
            .remove_timing(timing_id)
            .await
            .map(|()| format!("timing {timing_id} removed")),
        TimingCommand::List { campaign_id } => {
            service.get(campaign_id).await?;
            let timings = service.list_timings(campaign_id).await?;
            if timings.is_empty() {
                Ok(format!("campaign {campaign_id} has no posting windows"))
            } else {
                Ok(timings
                    .iter()
                    .map(|t| format!("{:>4}  {:<5} {}-{}", t.id, t.day.to_string(), t.start, t.end))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    };
    wiring::close_storage(&storage).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealcast_core::StorageAdapter;
    use dealcast_test_utils::TestHarness;
    use dealcast_test_utils::fixtures::{hms, new_campaign};

    #[test]
    fn clock_accepts_minutes_and_seconds() {
        assert_eq!(parse_clock("09:30").unwrap(), hms(9, 30, 0));
        assert_eq!(parse_clock("23:59:59").unwrap(), hms(23, 59, 59));
        assert!(parse_clock("25:00").is_err());
        assert!(parse_clock("noon").is_err());
    }

    #[tokio::test]
    async fn timing_add_and_list_go_through_the_lifecycle_rules() {
        let harness = TestHarness::builder().build().await.unwrap();
        let campaign = harness
            .storage
            .create_campaign(&new_campaign("windows"))
            .await
            .unwrap();

        let added = run_timing(
            &harness.config,
            TimingCommand::Add {
                campaign_id: campaign.id,
                day: TimingDay::Weekday(0),
                start: hms(9, 0, 0),
                end: hms(12, 0, 0),
            },
        )
        .await
        .unwrap();
        assert!(added.contains("mon 09:00:00-12:00:00"), "got: {added}");

        let err = run_timing(
            &harness.config,
            TimingCommand::Add {
                campaign_id: campaign.id,
                day: TimingDay::Daily,
                start: hms(12, 0, 0),
                end: hms(12, 0, 0),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DealcastError::Config(_)));

        let listed = run_timing(
            &harness.config,
            TimingCommand::List {
                campaign_id: campaign.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(listed.lines().count(), 1);
    }

    #[tokio::test]
    async fn start_requires_a_window() {
        let harness = TestHarness::builder().build().await.unwrap();
        let campaign = harness
            .storage
            .create_campaign(&new_campaign("no-window"))
            .await
            .unwrap();
        harness
            .storage
            .set_status(campaign.id, CampaignStatus::Stopped)
            .await
            .unwrap();

        let err = run_campaign(&harness.config, CampaignCommand::Start { id: campaign.id })
            .await
            .unwrap_err();
        assert!(matches!(err, DealcastError::Config(_)));
    }

    #[tokio::test]
    async fn list_prints_one_line_per_campaign() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.running_campaign(new_campaign("alpha")).await.unwrap();
        harness.running_campaign(new_campaign("beta")).await.unwrap();

        let out = run_campaign(&harness.config, CampaignCommand::List { status: vec![] })
            .await
            .unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("alpha"));
        assert!(out.contains("windows=yes"));
    }

    #[tokio::test]
    async fn create_without_search_endpoint_inserts_nothing() {
        let harness = TestHarness::builder().build().await.unwrap();
        let err = run_campaign(
            &harness.config,
            CampaignCommand::Create {
                name: "orphan".into(),
                channels: vec!["@deals".into()],
                categories: vec!["electronics".into()],
                frequency: 0,
                track_id: None,
                owner: None,
                min_rating: None,
                min_reviews: None,
                max_score: None,
                min_price: None,
                fulfilled_only: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DealcastError::Config(_)));
        assert!(harness.storage.list_campaigns(&[]).await.unwrap().is_empty());
    }
}
