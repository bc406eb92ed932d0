// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product search collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DealcastError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Candidate, QualityFilters};

/// One search call on behalf of a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub category_ids: Vec<String>,
    pub filters: QualityFilters,
    /// Product ids the provider may skip; a hint, the engine filters again.
    pub exclude_ids: Vec<String>,
    /// Maximum items requested per category.
    pub breadth: usize,
}

/// External product search (marketplace API, scraper, etc.).
///
/// Implementations normalize whatever shapes they receive into [`Candidate`]
/// values and must enforce their own request timeouts.
#[async_trait]
pub trait SearchProvider: PluginAdapter {
    /// Fetches candidates for the given categories and thresholds.
    async fn fetch_candidates(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Candidate>, DealcastError>;
}
