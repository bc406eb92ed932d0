// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot `dealcast discover` and `dealcast cleanup` commands.

use dealcast_config::model::DealcastConfig;
use dealcast_core::{DealcastError, StorageAdapter};
use dealcast_engine::discovery::{DiscoveryCycle, DiscoveryReport, DiscoverySettings};

use crate::wiring;

/// Run a single discovery cycle, including retention cleanup.
pub async fn run_discover(config: &DealcastConfig) -> Result<String, DealcastError> {
    let search = wiring::search_provider(config)?;
    let storage = wiring::open_storage(config).await?;
    let cycle = DiscoveryCycle::new(
        storage.clone(),
        search,
        DiscoverySettings::from_config(config),
    );
    let report = cycle.run().await;
    wiring::close_storage(&storage).await;
    report.map(|r| render_report(&r))
}

/// Purge expired queue rows and posting-log entries without searching.
pub async fn run_cleanup(config: &DealcastConfig) -> Result<String, DealcastError> {
    let storage = wiring::open_storage(config).await?;
    let result = async {
        let purged = storage
            .cleanup_queue(config.queue.queued_ttl_days, config.queue.posted_ttl_days)
            .await?;
        let pruned = storage
            .prune_posting_log(config.dedup.posting_log_retention_days)
            .await?;
        Ok::<_, DealcastError>(format!(
            "removed {purged} queue rows and {pruned} posting log rows"
        ))
    }
    .await;
    wiring::close_storage(&storage).await;
    result
}

fn render_report(report: &DiscoveryReport) -> String {
    format!(
        "refilled {} campaigns ({} sufficient, {} in flight, {} without categories, {} failed)\n\
         fetched {}, admitted {} ({} displaced), skipped {} variants, rejected {}, excluded {}\n\
         removed {} queue rows and {} posting log rows",
        report.refilled,
        report.sufficient,
        report.skipped_in_flight,
        report.skipped_no_categories,
        report.failed,
        report.stats.fetched,
        report.stats.admitted(),
        report.stats.displaced,
        report.stats.variation_skipped,
        report.stats.rejected,
        report.stats.excluded,
        report.queue_rows_purged,
        report.log_rows_pruned,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealcast_test_utils::TestHarness;

    #[tokio::test]
    async fn cleanup_runs_on_an_empty_database() {
        let harness = TestHarness::builder().build().await.unwrap();
        let out = run_cleanup(&harness.config).await.unwrap();
        assert_eq!(out, "removed 0 queue rows and 0 posting log rows");
    }

    #[tokio::test]
    async fn discover_needs_a_search_endpoint() {
        let harness = TestHarness::builder().build().await.unwrap();
        let err = run_discover(&harness.config).await.unwrap_err();
        assert!(matches!(err, DealcastError::Config(_)));
    }

    #[test]
    fn report_leads_with_campaign_counts() {
        let report = DiscoveryReport {
            refilled: 2,
            failed: 1,
            ..Default::default()
        };
        let text = render_report(&report);
        assert!(text.starts_with("refilled 2 campaigns"));
        assert!(text.contains("1 failed"));
    }
}
