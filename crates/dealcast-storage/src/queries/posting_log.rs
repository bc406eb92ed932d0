// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only history of delivered posts.

use dealcast_core::DealcastError;
use dealcast_core::types::{CampaignId, PostingRecord, PostingStats};
use rusqlite::params;

use super::{days_ago, to_iso};
use crate::database::{Database, map_tr_err};

/// Append one delivered post (one row per channel).
pub async fn record_posting(db: &Database, record: &PostingRecord) -> Result<(), DealcastError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO posting_log (campaign_id, channel, product_id, final_link, post_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.campaign_id,
                    record.channel,
                    record.product_id,
                    record.final_link,
                    to_iso(record.posted_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete log rows older than the retention horizon.
pub async fn prune_posting_log(db: &Database, retention_days: u32) -> Result<usize, DealcastError> {
    let cutoff = days_ago(retention_days);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM posting_log WHERE post_time < ?1", params![cutoff])
        })
        .await
        .map_err(map_tr_err)
}

/// Post counts for the last `days` days.
pub async fn posting_stats(
    db: &Database,
    campaign_id: CampaignId,
    days: u32,
) -> Result<PostingStats, DealcastError> {
    let cutoff = days_ago(days);
    db.connection()
        .call(move |conn| -> Result<PostingStats, rusqlite::Error> {
            let (total_posts, distinct_products): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT product_id) FROM posting_log
                 WHERE campaign_id = ?1 AND post_time >= ?2",
                params![campaign_id, cutoff],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let mut stmt = conn.prepare(
                "SELECT channel, COUNT(*) AS posts FROM posting_log
                 WHERE campaign_id = ?1 AND post_time >= ?2
                 GROUP BY channel
                 ORDER BY posts DESC, channel ASC",
            )?;
            let per_channel: Vec<(String, i64)> = stmt
                .query_map(params![campaign_id, cutoff], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(PostingStats {
                total_posts,
                distinct_products,
                per_channel,
            })
        })
        .await
        .map_err(map_tr_err)
}
