// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is a no-op.

use metrics::{describe_counter, describe_gauge};

use dealcast_core::types::AdmissionOutcome;

/// Register all Dealcast metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "dealcast_admissions_total",
        "Queue admission outcomes by kind"
    );
    describe_counter!(
        "dealcast_candidates_filtered_total",
        "Candidates dropped before admission, by reason"
    );
    describe_counter!("dealcast_posts_total", "Dequeued products by delivery result");
    describe_counter!(
        "dealcast_ticks_skipped_total",
        "Scheduler ticks skipped because the previous tick was still running"
    );
    describe_counter!(
        "dealcast_populations_total",
        "Population passes by outcome"
    );
    describe_counter!(
        "dealcast_rows_purged_total",
        "Rows removed by retention cleanup"
    );
    describe_counter!(
        "dealcast_channel_sends_total",
        "Per-channel sends attempted by the posting transport"
    );
    describe_gauge!("dealcast_running_campaigns","Campaigns seen running at the last tick");
}

pub fn record_admission(outcome: AdmissionOutcome) {
    metrics::counter!("dealcast_admissions_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record candidates dropped for `reason` (excluded, missing_score, over_threshold, error).
pub fn record_filtered(reason: &'static str, count: usize) {
    if count > 0 {
        metrics::counter!("dealcast_candidates_filtered_total", "reason" => reason)
            .increment(count as u64);
    }
}

pub fn record_post(delivered: bool) {
    let result = if delivered { "delivered" } else { "failed" };
    metrics::counter!("dealcast_posts_total", "result" => result).increment(1);
}

pub fn record_tick_skipped() {
    metrics::counter!("dealcast_ticks_skipped_total").increment(1);
}

pub fn record_population(outcome: &'static str) {
    metrics::counter!("dealcast_populations_total", "outcome" => outcome).increment(1);
}

pub fn record_purged(table: &'static str, rows: usize) {
    metrics::counter!("dealcast_rows_purged_total", "table" => table).increment(rows as u64);
}

pub fn set_running_campaigns(count: usize) {
    metrics::gauge!("dealcast_running_campaigns").set(count as f64);
}
