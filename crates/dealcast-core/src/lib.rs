// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dealcast campaign posting engine.
//!
//! This crate provides the domain types, the error type, and the adapter
//! traits through which the engine talks to storage, product search, the
//! posting transport, and the owner notification sink.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DealcastError;
pub use types::{AdapterType, CampaignId, CampaignStatus, HealthStatus};

// Re-export all adapter traits at crate root.
pub use traits::{
    NotificationSink, PluginAdapter, PostingTransport, SearchProvider, SearchRequest,
    StorageAdapter,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{NaiveTime, Weekday};

    use super::*;
    use crate::types::{
        AdmissionOutcome, Candidate, DeliveryReport, Notification, ProductPayload, Timing,
        TimingDay,
    };

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn candidate(score: Option<i64>) -> Candidate {
        Candidate {
            product_id: "B000TEST".into(),
            parent_id: None,
            quality_score: score,
            payload: ProductPayload::default(),
        }
    }

    #[test]
    fn dealcast_error_has_all_variants() {
        let _config = DealcastError::Config("test".into());
        let _storage = DealcastError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _search = DealcastError::Search {
            message: "test".into(),
            source: None,
        };
        let _delivery = DealcastError::Delivery {
            message: "test".into(),
            source: None,
        };
        let _notify = DealcastError::Notify {
            message: "test".into(),
            source: None,
        };
        let not_found = DealcastError::campaign_not_found(7);
        assert_eq!(not_found.to_string(), "campaign not found: 7");
        let _conflict = DealcastError::Conflict("dup".into());
        let _transition = DealcastError::InvalidTransition {
            from: "preparing".into(),
            to: "running".into(),
            reason: "population in progress".into(),
        };
        let _timeout = DealcastError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = DealcastError::Internal("test".into());
    }

    #[test]
    fn campaign_status_round_trips_as_snake_case() {
        for status in [
            CampaignStatus::Preparing,
            CampaignStatus::Running,
            CampaignStatus::Stopped,
        ] {
            let s = status.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(CampaignStatus::from_str(&s).unwrap(), status);
        }
        let json = serde_json::to_string(&CampaignStatus::Running).unwrap();
        assert_eq!(json, "\"running\"");
    }

    #[test]
    fn admission_outcome_strings() {
        assert_eq!(AdmissionOutcome::VariationSkipped.to_string(), "variation_skipped");
        assert!(AdmissionOutcome::Displaced.admitted());
        assert!(!AdmissionOutcome::Rejected.admitted());
    }

    #[test]
    fn timing_window_is_half_open() {
        let timing = Timing {
            id: 1,
            campaign_id: 1,
            day: TimingDay::Weekday(2),
            start: at(9, 0, 0),
            end: at(10, 0, 0),
        };
        assert!(timing.is_match(Weekday::Wed, at(9, 0, 0)));
        assert!(timing.is_match(Weekday::Wed, at(9, 59, 59)));
        assert!(!timing.is_match(Weekday::Wed, at(10, 0, 0)));
        assert!(!timing.is_match(Weekday::Tue, at(9, 30, 0)));
    }

    #[test]
    fn daily_timing_matches_every_weekday() {
        let timing = Timing {
            id: 1,
            campaign_id: 1,
            day: TimingDay::Daily,
            start: at(0, 0, 0),
            end: at(23, 59, 59),
        };
        for day in [Weekday::Mon, Weekday::Thu, Weekday::Sun] {
            assert!(timing.is_match(day, at(12, 0, 0)));
        }
    }

    #[test]
    fn timing_day_parsing_and_storage() {
        assert_eq!(TimingDay::from_str("daily").unwrap(), TimingDay::Daily);
        assert_eq!(TimingDay::from_str("Fri").unwrap(), TimingDay::Weekday(4));
        assert_eq!(TimingDay::from_str("6").unwrap(), TimingDay::Weekday(6));
        assert!(TimingDay::from_str("7").is_err());
        assert!(TimingDay::from_str("someday").is_err());

        assert_eq!(TimingDay::Daily.to_db(), -1);
        assert_eq!(TimingDay::from_db(-1).unwrap(), TimingDay::Daily);
        assert_eq!(TimingDay::from_db(3).unwrap(), TimingDay::Weekday(3));
        assert!(TimingDay::from_db(9).is_err());
    }

    #[test]
    fn unknown_score_never_beats_anything() {
        assert!(candidate(Some(100)).scores_better_than(Some(800)));
        assert!(!candidate(Some(900)).scores_better_than(Some(800)));
        assert!(!candidate(Some(800)).scores_better_than(Some(800)));
        assert!(candidate(Some(999_999)).scores_better_than(None));
        assert!(!candidate(None).scores_better_than(None));
        assert!(!candidate(None).scores_better_than(Some(1)));
    }

    #[test]
    fn delivery_report_success_requires_a_channel() {
        assert!(!DeliveryReport::default().success());
        let report = DeliveryReport {
            delivered_channels: vec!["@deals".into()],
            final_link: "https://example.com".into(),
        };
        assert!(report.success());
    }

    #[test]
    fn exhaustion_notification_mentions_stop() {
        let n = Notification::PopulationComplete {
            campaign_id: 1,
            campaign_name: "Kitchen".into(),
            count: 0,
        };
        assert!(n.message().contains("stopped"));
        let ready = Notification::PopulationComplete {
            campaign_id: 1,
            campaign_name: "Kitchen".into(),
            count: 12,
        };
        assert!(ready.message().contains("12 products"));
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_search_provider<T: SearchProvider>() {}
        fn _assert_posting_transport<T: PostingTransport>() {}
        fn _assert_notification_sink<T: NotificationSink>() {}
    }
}
