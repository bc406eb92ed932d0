// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for campaigns, timings, the product queue, and the posting log.

pub mod campaigns;
pub mod dedup;
pub mod posting_log;
pub mod queue;
pub mod timings;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use rusqlite::types::Type;

/// Format used for every timestamp column; matches `strftime('%Y-%m-%dT%H:%M:%fZ')`.
pub(crate) fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp `days` before now, for retention comparisons.
pub(crate) fn days_ago(days: u32) -> String {
    to_iso(Utc::now() - TimeDelta::days(i64::from(days)))
}

pub(crate) fn parse_iso(idx: usize, value: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    idx: usize,
    value: &str,
) -> Result<T, rusqlite::Error> {
    serde_json::from_str(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, rusqlite::Error> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}
