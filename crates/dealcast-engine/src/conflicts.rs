// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel overlap between running campaigns.
//!
//! This is a read-only query for operators. The scheduler does not consult it.

use serde::Serialize;

use dealcast_core::types::{CampaignId, CampaignStatus};
use dealcast_core::{DealcastError, StorageAdapter};

use crate::timing::{TickClock, window_open};

/// Another running campaign posting to some of the same channels right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelConflict {
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    pub channels: Vec<String>,
}

/// Running campaigns, other than `campaign_id`, whose window is open at
/// `clock` and that share at least one channel with it.
pub async fn conflicting_channels(
    storage: &(dyn StorageAdapter + Send + Sync),
    campaign_id: CampaignId,
    clock: &TickClock,
) -> Result<Vec<ChannelConflict>, DealcastError> {
    let campaign = storage
        .get_campaign(campaign_id)
        .await?
        .ok_or_else(|| DealcastError::campaign_not_found(campaign_id))?;

    let mut conflicts = Vec::new();
    for other in storage.list_campaigns(&[CampaignStatus::Running]).await? {
        if other.id == campaign_id {
            continue;
        }
        let shared: Vec<String> = other
            .channels
            .iter()
            .filter(|c| campaign.channels.contains(c))
            .cloned()
            .collect();
        if shared.is_empty() {
            continue;
        }
        let timings = storage.list_timings(other.id).await?;
        if window_open(&timings, clock) {
            conflicts.push(ChannelConflict {
                campaign_id: other.id,
                campaign_name: other.name,
                channels: shared,
            });
        }
    }
    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use dealcast_core::types::{NewTiming, TimingDay};
    use dealcast_test_utils::TestHarness;
    use dealcast_test_utils::fixtures::{hms, new_campaign};

    #[tokio::test]
    async fn finds_running_campaigns_sharing_channels_in_open_windows() {
        let harness = TestHarness::builder().build().await.unwrap();
        let target = harness.running_campaign(new_campaign("target")).await.unwrap();
        let overlapping = harness.running_campaign(new_campaign("twin")).await.unwrap();

        let mut elsewhere = new_campaign("elsewhere");
        elsewhere.channels = vec!["@other".to_string()];
        harness.running_campaign(elsewhere).await.unwrap();

        // Shares the channel but only posts in the evening.
        let evening = harness
            .storage
            .create_campaign(&new_campaign("evening"))
            .await
            .unwrap();
        harness
            .storage
            .save_timing(&NewTiming {
                campaign_id: evening.id,
                day: TimingDay::Daily,
                start: hms(18, 0, 0),
                end: hms(22, 0, 0),
            })
            .await
            .unwrap();
        harness
            .storage
            .set_status(evening.id, CampaignStatus::Running)
            .await
            .unwrap();

        let noon = TickClock::from_datetime(
            Local.with_ymd_and_hms(2026, 6, 3, 12, 0, 0).single().unwrap(),
        );
        let conflicts = conflicting_channels(harness.storage.as_ref(), target.id, &noon)
            .await
            .unwrap();

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].campaign_id, overlapping.id);
        assert_eq!(conflicts[0].channels, vec!["@deals"]);
    }
}
