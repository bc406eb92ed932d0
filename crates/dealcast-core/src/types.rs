// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the storage layer, the engine, and the adapters.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::DealcastError;

/// Numeric campaign identifier (SQLite rowid).
pub type CampaignId = i64;

/// Default ceiling for the quality score (marketplace sales rank) a candidate may have.
pub const DEFAULT_MAX_QUALITY_SCORE: i64 = 10_000;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Search,
    Transport,
    Notifier,
    Observability,
}

/// Lifecycle status of a campaign.
///
/// `Preparing` doubles as the population lock: while a campaign is preparing,
/// it is neither scheduled nor picked up by another population pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Preparing,
    Running,
    Stopped,
}

/// Thresholds a product must satisfy to be worth promoting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFilters {
    pub min_rating: Option<f64>,
    pub min_review_count: Option<i64>,
    /// Highest acceptable quality score (lower scores are better).
    pub max_quality_score: i64,
    pub min_price: Option<f64>,
    /// Only accept marketplace-fulfilled offers.
    pub fulfilled_only: bool,
}

impl Default for QualityFilters {
    fn default() -> Self {
        Self {
            min_rating: None,
            min_review_count: None,
            max_quality_score: DEFAULT_MAX_QUALITY_SCORE,
            min_price: None,
            fulfilled_only: false,
        }
    }
}

/// A configured recurring promotion job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: CampaignStatus,
    /// Outbound channel identifiers (`@channel` usernames or numeric chat ids).
    pub channels: Vec<String>,
    /// Category / browse-node identifiers passed to the search provider.
    pub categories: Vec<String>,
    pub filters: QualityFilters,
    /// Posts per hour; 0 disables throttling.
    pub posting_frequency: u32,
    /// Optional tracking tag appended to outbound links.
    pub track_id: Option<String>,
    /// User who created the campaign, target of owner notifications.
    pub created_by: Option<String>,
    pub last_post_time: Option<DateTime<Utc>>,
    pub created_at: String,
}

/// Parameters for creating a campaign. New campaigns always start in `preparing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub channels: Vec<String>,
    pub categories: Vec<String>,
    pub filters: QualityFilters,
    pub posting_frequency: u32,
    pub track_id: Option<String>,
    pub created_by: Option<String>,
}

/// The day a timing window applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingDay {
    /// Every day of the week.
    Daily,
    /// A single weekday, 0 = Monday through 6 = Sunday.
    Weekday(u8),
}

impl TimingDay {
    /// Column value used for the daily sentinel.
    pub const DAILY_SENTINEL: i64 = -1;

    /// Builds a weekday timing, rejecting values outside 0..=6.
    pub fn weekday(day: u8) -> Result<Self, DealcastError> {
        if day <= 6 {
            Ok(Self::Weekday(day))
        } else {
            Err(DealcastError::Config(format!(
                "day of week must be between 0 (Monday) and 6 (Sunday), got {day}"
            )))
        }
    }

    /// Decodes the stored column value. Any negative value means daily.
    pub fn from_db(value: i64) -> Result<Self, DealcastError> {
        if value < 0 {
            return Ok(Self::Daily);
        }
        u8::try_from(value)
            .map_err(|_| DealcastError::Config(format!("invalid day of week {value}")))
            .and_then(Self::weekday)
    }

    pub fn to_db(self) -> i64 {
        match self {
            Self::Daily => Self::DAILY_SENTINEL,
            Self::Weekday(day) => i64::from(day),
        }
    }

    /// Whether this timing applies on the given weekday.
    pub fn matches(self, weekday: Weekday) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekday(day) => u32::from(day) == weekday.num_days_from_monday(),
        }
    }
}

impl fmt::Display for TimingDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Weekday(day) => {
                let name = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
                    .get(usize::from(*day))
                    .copied()
                    .unwrap_or("?");
                f.write_str(name)
            }
        }
    }
}

impl std::str::FromStr for TimingDay {
    type Err = DealcastError;

    /// Accepts `daily`, `*`, a digit 0-6, or a three-letter English day name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "daily" | "*" | "every" => Ok(Self::Daily),
            "mon" => Ok(Self::Weekday(0)),
            "tue" => Ok(Self::Weekday(1)),
            "wed" => Ok(Self::Weekday(2)),
            "thu" => Ok(Self::Weekday(3)),
            "fri" => Ok(Self::Weekday(4)),
            "sat" => Ok(Self::Weekday(5)),
            "sun" => Ok(Self::Weekday(6)),
            other => other
                .parse::<u8>()
                .map_err(|_| DealcastError::Config(format!("unrecognized day `{s}`")))
                .and_then(Self::weekday),
        }
    }
}

/// A half-open wall-clock window `[start, end)` during which a campaign may post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub id: i64,
    pub campaign_id: CampaignId,
    pub day: TimingDay,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Timing {
    /// True iff the window applies on `weekday` and `start <= time < end`.
    pub fn is_match(&self, weekday: Weekday, time: NaiveTime) -> bool {
        self.day.matches(weekday) && self.start <= time && time < self.end
    }
}

/// Parameters for saving a timing window. `(campaign_id, day, start)` is the upsert key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTiming {
    pub campaign_id: CampaignId,
    pub day: TimingDay,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Presentation data carried alongside a candidate product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub title: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Outbound (affiliate) link before tracking parameters are appended.
    pub link: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// A normalized product returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub product_id: String,
    pub parent_id: Option<String>,
    /// Lower is better; `None` means unknown and ranks worst.
    pub quality_score: Option<i64>,
    pub payload: ProductPayload,
}

impl Candidate {
    /// True if this candidate's score beats `other` under the queue ordering,
    /// where an unknown score is worse than any numeric score.
    pub fn scores_better_than(&self, other: Option<i64>) -> bool {
        match (self.quality_score, other) {
            (Some(mine), Some(theirs)) => mine < theirs,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Status of a row in the product queue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    Posted,
}

/// A vetted product stored in a campaign's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedProduct {
    pub id: i64,
    pub campaign_id: CampaignId,
    pub product_id: String,
    pub parent_id: Option<String>,
    pub quality_score: Option<i64>,
    pub payload: ProductPayload,
    pub status: QueueStatus,
    pub discovered_at: String,
    pub posted_at: Option<String>,
}

/// Result of offering a candidate to a bounded queue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// Inserted into a queue that had free capacity.
    Added,
    /// Inserted after evicting the current worst row.
    Displaced,
    /// Another variant of the same parent is already queued.
    VariationSkipped,
    /// The queue is full and the candidate is not better than its worst row.
    Rejected,
}

impl AdmissionOutcome {
    /// Whether the candidate ended up in the queue.
    pub fn admitted(self) -> bool {
        matches!(self, Self::Added | Self::Displaced)
    }
}

/// One delivered post, appended to the posting log per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingRecord {
    pub campaign_id: CampaignId,
    pub channel: String,
    pub product_id: String,
    pub final_link: String,
    pub posted_at: DateTime<Utc>,
}

/// What the posting transport managed to do with one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Channels that accepted the post.
    pub delivered_channels: Vec<String>,
    /// Link that was published, tracking parameters included.
    pub final_link: String,
}

impl DeliveryReport {
    /// Overall delivery success: at least one channel accepted the post.
    pub fn success(&self) -> bool {
        !self.delivered_channels.is_empty()
    }
}

/// Owner-facing population notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// Population finished and admitted `count` products (0 means the campaign was stopped).
    PopulationComplete {
        campaign_id: CampaignId,
        campaign_name: String,
        count: usize,
    },
    /// The search collaborator failed during an interactive population.
    PopulationFailed {
        campaign_id: CampaignId,
        campaign_name: String,
        reason: String,
    },
}

impl Notification {
    /// Human-readable message text.
    pub fn message(&self) -> String {
        match self {
            Self::PopulationComplete {
                campaign_name,
                count: 0,
                ..
            } => format!(
                "Campaign \"{campaign_name}\" found 0 products matching its filters and has been stopped. \
                 Relax the quality thresholds or change categories, then start it again."
            ),
            Self::PopulationComplete {
                campaign_name,
                count,
                ..
            } => format!("Campaign \"{campaign_name}\" is ready with {count} products queued."),
            Self::PopulationFailed {
                campaign_name,
                reason,
                ..
            } => format!("Product search for campaign \"{campaign_name}\" failed: {reason}"),
        }
    }
}

/// Posting-log aggregates for one campaign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingStats {
    pub total_posts: i64,
    pub distinct_products: i64,
    /// `(channel, posts)` pairs, busiest first.
    pub per_channel: Vec<(String, i64)>,
}
