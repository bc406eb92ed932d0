// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Small builders for domain values used across tests.

use chrono::NaiveTime;

use dealcast_core::types::{Candidate, NewCampaign, ProductPayload};

/// A candidate with a plausible payload.
pub fn candidate(id: &str, parent: Option<&str>, score: Option<i64>) -> Candidate {
    Candidate {
        product_id: id.to_string(),
        parent_id: parent.map(str::to_string),
        quality_score: score,
        payload: ProductPayload {
            title: format!("Product {id}"),
            price: Some(24.99),
            currency: Some("EUR".to_string()),
            rating: Some(4.5),
            review_count: Some(120),
            images: vec![format!("https://img.example/{id}.jpg")],
            link: format!("https://shop.example/dp/{id}"),
            features: vec!["Fast shipping".to_string()],
        },
    }
}

/// Candidates with the given scores and ids `p0`, `p1`, ...
pub fn scored(scores: &[i64]) -> Vec<Candidate> {
    scores
        .iter()
        .enumerate()
        .map(|(i, s)| candidate(&format!("p{i}"), None, Some(*s)))
        .collect()
}

/// A campaign posting to one channel in one category, owned by user `"owner"`.
pub fn new_campaign(name: &str) -> NewCampaign {
    NewCampaign {
        name: name.to_string(),
        channels: vec!["@deals".to_string()],
        categories: vec!["electronics".to_string()],
        created_by: Some("owner".to_string()),
        ..Default::default()
    }
}

/// Wall-clock time from hours, minutes and seconds.
pub fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}
