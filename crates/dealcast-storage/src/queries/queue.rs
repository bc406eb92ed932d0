// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded per-campaign product queue with score-based displacement.
//!
//! Ordering everywhere is "lower quality score is better, unknown score is
//! worst", with insertion order breaking ties.

use dealcast_core::DealcastError;
use dealcast_core::types::{
    AdmissionOutcome, CampaignId, Candidate, ProductPayload, QueueStatus, QueuedProduct,
};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, Transaction, params};
use tracing::trace;

use super::{days_ago, decode_json, encode_json};
use crate::database::{Database, map_tr_err};

const QUEUE_COLUMNS: &str = "id, campaign_id, product_id, parent_id, quality_score, title, \
     price, currency, rating, review_count, images, link, features, status, discovered_at, \
     posted_at";

fn row_to_product(row: &Row<'_>) -> Result<QueuedProduct, rusqlite::Error> {
    let images: String = row.get(10)?;
    let features: String = row.get(12)?;
    let status: String = row.get(13)?;
    let status = status
        .parse::<QueueStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(13, Type::Text, Box::new(e)))?;

    Ok(QueuedProduct {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        product_id: row.get(2)?,
        parent_id: row.get(3)?,
        quality_score: row.get(4)?,
        payload: ProductPayload {
            title: row.get(5)?,
            price: row.get(6)?,
            currency: row.get(7)?,
            rating: row.get(8)?,
            review_count: row.get(9)?,
            images: decode_json(10, &images)?,
            link: row.get(11)?,
            features: decode_json(12, &features)?,
        },
        status,
        discovered_at: row.get(14)?,
        posted_at: row.get(15)?,
    })
}

fn insert_candidate(
    tx: &Transaction<'_>,
    campaign_id: CampaignId,
    candidate: &Candidate,
) -> Result<(), rusqlite::Error> {
    let payload = &candidate.payload;
    tx.execute(
        "INSERT INTO product_queue (campaign_id, product_id, parent_id, quality_score, title,
             price, currency, rating, review_count, images, link, features)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            campaign_id,
            candidate.product_id,
            candidate.parent_id,
            candidate.quality_score,
            payload.title,
            payload.price,
            payload.currency,
            payload.rating,
            payload.review_count,
            encode_json(&payload.images)?,
            payload.link,
            encode_json(&payload.features)?,
        ],
    )?;
    Ok(())
}

/// Offer a candidate to the campaign's queue.
///
/// Runs as a single transaction:
/// 1. A queued row with the same parent id means `VariationSkipped`.
/// 2. Below `capacity` the candidate is inserted (`Added`).
/// 3. At capacity the worst row (unknown score first, then highest score,
///    newest on ties) is evicted only if the candidate scores strictly better
///    (`Displaced`); otherwise nothing changes (`Rejected`).
pub async fn add_with_displacement(
    db: &Database,
    campaign_id: CampaignId,
    candidate: &Candidate,
    capacity: usize,
) -> Result<AdmissionOutcome, DealcastError> {
    let candidate = candidate.clone();
    db.connection()
        .call(move |conn| -> Result<AdmissionOutcome, rusqlite::Error> {
            let tx = conn.transaction()?;

            if let Some(parent) = &candidate.parent_id {
                let sibling_queued: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM product_queue
                     WHERE campaign_id = ?1 AND parent_id = ?2 AND status = 'queued')",
                    params![campaign_id, parent],
                    |row| row.get(0),
                )?;
                if sibling_queued {
                    return Ok(AdmissionOutcome::VariationSkipped);
                }
            }

            let size: i64 = tx.query_row(
                "SELECT COUNT(*) FROM product_queue WHERE campaign_id = ?1 AND status = 'queued'",
                params![campaign_id],
                |row| row.get(0),
            )?;

            let outcome = if usize::try_from(size).unwrap_or(usize::MAX) < capacity {
                insert_candidate(&tx, campaign_id, &candidate)?;
                AdmissionOutcome::Added
            } else {
                let worst: Option<(i64, Option<i64>)> = tx
                    .query_row(
                        "SELECT id, quality_score FROM product_queue
                         WHERE campaign_id = ?1 AND status = 'queued'
                         ORDER BY quality_score IS NULL DESC, quality_score DESC, id DESC
                         LIMIT 1",
                        params![campaign_id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                match worst {
                    Some((worst_id, worst_score)) if candidate.scores_better_than(worst_score) => {
                        tx.execute("DELETE FROM product_queue WHERE id = ?1", params![worst_id])?;
                        insert_candidate(&tx, campaign_id, &candidate)?;
                        trace!(campaign_id, evicted = worst_id, "displaced worst queued product");
                        AdmissionOutcome::Displaced
                    }
                    _ => AdmissionOutcome::Rejected,
                }
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}

/// The best queued product for a campaign, if any.
pub async fn get_next(
    db: &Database,
    campaign_id: CampaignId,
) -> Result<Option<QueuedProduct>, DealcastError> {
    db.connection()
        .call(move |conn| -> Result<Option<QueuedProduct>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {QUEUE_COLUMNS} FROM product_queue
                     WHERE campaign_id = ?1 AND status = 'queued'
                     ORDER BY quality_score IS NULL, quality_score ASC, id ASC
                     LIMIT 1"
                ),
                params![campaign_id],
                row_to_product,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Flip a queued row to `posted`. A row that is missing or already posted is `NotFound`.
pub async fn mark_posted(db: &Database, product_row_id: i64) -> Result<(), DealcastError> {
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE product_queue SET status = 'posted',
                 posted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'queued'",
                params![product_row_id],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealcastError::NotFound {
            entity: "queued product",
            id: product_row_id.to_string(),
        });
    }
    Ok(())
}

pub async fn queue_size(db: &Database, campaign_id: CampaignId) -> Result<usize, DealcastError> {
    let count = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM product_queue WHERE campaign_id = ?1 AND status = 'queued'",
                params![campaign_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Purge stale rows across all campaigns. Returns how many were deleted.
pub async fn cleanup_queue(
    db: &Database,
    queued_ttl_days: u32,
    posted_ttl_days: u32,
) -> Result<usize, DealcastError> {
    let queued_cutoff = days_ago(queued_ttl_days);
    let posted_cutoff = days_ago(posted_ttl_days);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM product_queue
                 WHERE (status = 'queued' AND discovered_at < ?1)
                    OR (status = 'posted' AND posted_at < ?2)",
                params![queued_cutoff, posted_cutoff],
            )
        })
        .await
        .map_err(map_tr_err)
}
