// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Posting windows attached to campaigns.

use chrono::NaiveTime;
use dealcast_core::DealcastError;
use dealcast_core::types::{CampaignId, NewTiming, Timing, TimingDay};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};

const TIME_FORMAT: &str = "%H:%M:%S";

fn parse_time(idx: usize, value: &str) -> Result<NaiveTime, rusqlite::Error> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_timing(row: &Row<'_>) -> Result<Timing, rusqlite::Error> {
    let day: i64 = row.get(2)?;
    let start: String = row.get(3)?;
    let end: String = row.get(4)?;
    Ok(Timing {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        day: TimingDay::from_db(day).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(e))
        })?,
        start: parse_time(3, &start)?,
        end: parse_time(4, &end)?,
    })
}

/// Upsert a timing window keyed on `(campaign_id, day, start)`.
///
/// Saving an existing key only moves its end time.
pub async fn save_timing(db: &Database, timing: &NewTiming) -> Result<Timing, DealcastError> {
    let campaign_id = timing.campaign_id;
    let day = timing.day.to_db();
    let start = timing.start.format(TIME_FORMAT).to_string();
    let end = timing.end.format(TIME_FORMAT).to_string();

    let saved = db
        .connection()
        .call(move |conn| -> Result<Option<Timing>, rusqlite::Error> {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM campaigns WHERE id = ?1)",
                params![campaign_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(None);
            }
            conn.execute(
                "INSERT INTO campaign_timings (campaign_id, day_of_week, start_time, end_time)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(campaign_id, day_of_week, start_time)
                 DO UPDATE SET end_time = excluded.end_time",
                params![campaign_id, day, start, end],
            )?;
            conn.query_row(
                "SELECT id, campaign_id, day_of_week, start_time, end_time
                 FROM campaign_timings
                 WHERE campaign_id = ?1 AND day_of_week = ?2 AND start_time = ?3",
                params![campaign_id, day, start],
                row_to_timing,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    saved.ok_or_else(|| DealcastError::campaign_not_found(campaign_id))
}

/// All windows for a campaign, ordered by day then start time.
pub async fn list_timings(
    db: &Database,
    campaign_id: CampaignId,
) -> Result<Vec<Timing>, DealcastError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Timing>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, campaign_id, day_of_week, start_time, end_time
                 FROM campaign_timings
                 WHERE campaign_id = ?1
                 ORDER BY day_of_week, start_time",
            )?;
            let rows = stmt.query_map(params![campaign_id], row_to_timing)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn delete_timing(db: &Database, timing_id: i64) -> Result<bool, DealcastError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(conn.execute(
                "DELETE FROM campaign_timings WHERE id = ?1",
                params![timing_id],
            )? > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn has_timings(db: &Database, campaign_id: CampaignId) -> Result<bool, DealcastError> {
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM campaign_timings WHERE campaign_id = ?1)",
                params![campaign_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::campaigns::{create_campaign, delete_campaign};
    use dealcast_core::types::NewCampaign;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, CampaignId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let campaign = create_campaign(
            &db,
            &NewCampaign {
                name: "timed".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (db, campaign.id, dir)
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn save_upserts_on_day_and_start() {
        let (db, id, _dir) = setup_db().await;
        let first = save_timing(
            &db,
            &NewTiming {
                campaign_id: id,
                day: TimingDay::Weekday(0),
                start: hm(10, 0),
                end: hm(12, 0),
            },
        )
        .await
        .unwrap();
        let second = save_timing(
            &db,
            &NewTiming {
                campaign_id: id,
                day: TimingDay::Weekday(0),
                start: hm(10, 0),
                end: hm(14, 0),
            },
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.end, hm(14, 0));
        assert_eq!(list_timings(&db, id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn daily_sentinel_round_trips() {
        let (db, id, _dir) = setup_db().await;
        assert!(!has_timings(&db, id).await.unwrap());
        save_timing(
            &db,
            &NewTiming {
                campaign_id: id,
                day: TimingDay::Daily,
                start: hm(8, 30),
                end: hm(9, 0),
            },
        )
        .await
        .unwrap();

        let timings = list_timings(&db, id).await.unwrap();
        assert_eq!(timings[0].day, TimingDay::Daily);
        assert_eq!(timings[0].start, hm(8, 30));
        assert!(has_timings(&db, id).await.unwrap());
    }

    #[tokio::test]
    async fn saving_for_unknown_campaign_is_not_found() {
        let (db, _id, _dir) = setup_db().await;
        let err = save_timing(
            &db,
            &NewTiming {
                campaign_id: 4242,
                day: TimingDay::Daily,
                start: hm(1, 0),
                end: hm(2, 0),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DealcastError::NotFound { .. }));
    }

    #[tokio::test]
    async fn timings_cascade_with_campaign() {
        let (db, id, _dir) = setup_db().await;
        let t = save_timing(
            &db,
            &NewTiming {
                campaign_id: id,
                day: TimingDay::Weekday(4),
                start: hm(18, 0),
                end: hm(20, 0),
            },
        )
        .await
        .unwrap();
        assert!(delete_timing(&db, t.id).await.unwrap());
        assert!(!delete_timing(&db, t.id).await.unwrap());

        save_timing(
            &db,
            &NewTiming {
                campaign_id: id,
                day: TimingDay::Weekday(4),
                start: hm(18, 0),
                end: hm(20, 0),
            },
        )
        .await
        .unwrap();
        delete_campaign(&db, id).await.unwrap();
        assert!(list_timings(&db, id).await.unwrap().is_empty());
    }
}
