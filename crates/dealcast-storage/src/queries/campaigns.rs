// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign CRUD and status transitions.

use chrono::{DateTime, Utc};
use dealcast_core::DealcastError;
use dealcast_core::types::{Campaign, CampaignId, CampaignStatus, NewCampaign, QualityFilters};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params, params_from_iter};

use super::{decode_json, encode_json, parse_iso, to_iso};
use crate::database::{Database, map_tr_err};

const CAMPAIGN_COLUMNS: &str = "id, name, status, channels, categories, min_rating, \
     min_review_count, max_quality_score, min_price, fulfilled_only, posting_frequency, \
     track_id, created_by, last_post_time, created_at";

fn row_to_campaign(row: &Row<'_>) -> Result<Campaign, rusqlite::Error> {
    let status: String = row.get(2)?;
    let status = status
        .parse::<CampaignStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let channels: String = row.get(3)?;
    let categories: String = row.get(4)?;
    let last_post_time = row
        .get::<_, Option<String>>(13)?
        .map(|ts| parse_iso(13, &ts))
        .transpose()?;

    Ok(Campaign {
        id: row.get(0)?,
        name: row.get(1)?,
        status,
        channels: decode_json(3, &channels)?,
        categories: decode_json(4, &categories)?,
        filters: QualityFilters {
            min_rating: row.get(5)?,
            min_review_count: row.get(6)?,
            max_quality_score: row.get(7)?,
            min_price: row.get(8)?,
            fulfilled_only: row.get(9)?,
        },
        posting_frequency: row.get(10)?,
        track_id: row.get(11)?,
        created_by: row.get(12)?,
        last_post_time,
        created_at: row.get(14)?,
    })
}

fn select_by_id(
    conn: &rusqlite::Connection,
    id: CampaignId,
) -> Result<Option<Campaign>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"),
        params![id],
        row_to_campaign,
    )
    .optional()
}

/// Insert a campaign in `preparing` status.
///
/// Campaign names are unique; a taken name yields [`DealcastError::Conflict`].
pub async fn create_campaign(
    db: &Database,
    campaign: &NewCampaign,
) -> Result<Campaign, DealcastError> {
    let campaign = campaign.clone();
    let name = campaign.name.clone();
    let created = db
        .connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> {
            let channels = encode_json(&campaign.channels)?;
            let categories = encode_json(&campaign.categories)?;
            let inserted = conn.execute(
                "INSERT INTO campaigns (name, status, channels, categories, min_rating,
                     min_review_count, max_quality_score, min_price, fulfilled_only,
                     posting_frequency, track_id, created_by)
                 VALUES (?1, 'preparing', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    campaign.name,
                    channels,
                    categories,
                    campaign.filters.min_rating,
                    campaign.filters.min_review_count,
                    campaign.filters.max_quality_score,
                    campaign.filters.min_price,
                    campaign.filters.fulfilled_only,
                    campaign.posting_frequency,
                    campaign.track_id,
                    campaign.created_by,
                ],
            )?;
            if inserted == 0 {
                return Ok(None);
            }
            let id = conn.last_insert_rowid();
            select_by_id(conn, id)
        })
        .await
        .map_err(map_tr_err)?;

    created.ok_or_else(|| DealcastError::Conflict(format!("campaign name `{name}` is taken")))
}

/// Fetch a campaign by id.
pub async fn get_campaign(db: &Database, id: CampaignId) -> Result<Option<Campaign>, DealcastError> {
    db.connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> { select_by_id(conn, id) })
        .await
        .map_err(map_tr_err)
}

/// Fetch a campaign by its unique name.
pub async fn get_campaign_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Campaign>, DealcastError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Campaign>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE name = ?1"),
                params![name],
                row_to_campaign,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List campaigns in any of `statuses`, oldest first. An empty filter lists all.
pub async fn list_campaigns(
    db: &Database,
    statuses: &[CampaignStatus],
) -> Result<Vec<Campaign>, DealcastError> {
    let statuses: Vec<String> = statuses.iter().map(ToString::to_string).collect();
    db.connection()
        .call(move |conn| -> Result<Vec<Campaign>, rusqlite::Error> {
            let sql = if statuses.is_empty() {
                format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns ORDER BY id")
            } else {
                let placeholders = vec!["?"; statuses.len()].join(", ");
                format!(
                    "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE status IN ({placeholders}) ORDER BY id"
                )
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(statuses.iter()), row_to_campaign)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Unconditional status write.
pub async fn set_status(
    db: &Database,
    id: CampaignId,
    status: CampaignStatus,
) -> Result<(), DealcastError> {
    let status_str = status.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE campaigns SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status_str, id],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealcastError::campaign_not_found(id));
    }
    Ok(())
}

/// Status write guarded by the currently stored value. Returns whether it applied.
pub async fn compare_and_set_status(
    db: &Database,
    id: CampaignId,
    expected: CampaignStatus,
    new: CampaignStatus,
) -> Result<bool, DealcastError> {
    let expected = expected.to_string();
    let new = new.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE campaigns SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2 AND status = ?3",
                params![new, id, expected],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed == 1)
}

pub async fn set_last_post_time(
    db: &Database,
    id: CampaignId,
    at: DateTime<Utc>,
) -> Result<(), DealcastError> {
    let at = to_iso(at);
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE campaigns SET last_post_time = ?1 WHERE id = ?2",
                params![at, id],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if changed == 0 {
        return Err(DealcastError::campaign_not_found(id));
    }
    Ok(())
}

/// Delete a campaign. Timings and queue rows go with it via `ON DELETE CASCADE`.
pub async fn delete_campaign(db: &Database, id: CampaignId) -> Result<bool, DealcastError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(conn.execute("DELETE FROM campaigns WHERE id = ?1", params![id])? > 0)
        })
        .await
        .map_err(map_tr_err)
}
