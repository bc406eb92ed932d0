// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repeat-suppression snapshot.

use std::collections::HashSet;

use dealcast_core::DealcastError;
use dealcast_core::types::CampaignId;
use rusqlite::params;

use super::days_ago;
use crate::database::{Database, map_tr_err};

/// Product ids that must not be admitted again: posted within the freshness
/// window or currently queued. Most recent first, capped at `limit`.
///
/// The result is a point-in-time snapshot; callers take it once per pass.
pub async fn excluded_product_ids(
    db: &Database,
    campaign_id: CampaignId,
    freshness_window_days: u32,
    limit: usize,
) -> Result<HashSet<String>, DealcastError> {
    let cutoff = days_ago(freshness_window_days);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<HashSet<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT product_id FROM (
                     SELECT product_id, post_time AS seen_at FROM posting_log
                     WHERE campaign_id = ?1 AND post_time >= ?2
                     UNION ALL
                     SELECT product_id, discovered_at AS seen_at FROM product_queue
                     WHERE campaign_id = ?1 AND status = 'queued'
                 )
                 GROUP BY product_id
                 ORDER BY MAX(seen_at) DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![campaign_id, cutoff, limit], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
