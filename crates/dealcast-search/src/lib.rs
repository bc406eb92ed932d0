// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP JSON product search provider for Dealcast.
//!
//! Implements [`SearchProvider`] against any endpoint that accepts a
//! [`SearchRequest`] body and answers with `{"candidates": [...]}`.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;
use dealcast_config::model::SearchConfig;
use dealcast_core::traits::{PluginAdapter, SearchProvider};
use dealcast_core::types::{AdapterType, Candidate, HealthStatus};
use dealcast_core::{DealcastError, SearchRequest};
use tracing::{debug, info};

use crate::client::SearchClient;

/// Search provider backed by [`SearchClient`].
pub struct HttpSearchProvider {
    client: SearchClient,
}

impl HttpSearchProvider {
    /// Requires `config.endpoint`; the API key is optional.
    pub fn new(config: &SearchConfig) -> Result<Self, DealcastError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                DealcastError::Config("search.endpoint is required for product discovery".into())
            })?;

        let client = SearchClient::new(
            endpoint.to_string(),
            config.api_key.as_deref(),
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(endpoint, "search provider initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for HttpSearchProvider {
    fn name(&self) -> &str {
        "http-search"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, DealcastError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DealcastError> {
        Ok(())
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn fetch_candidates(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Candidate>, DealcastError> {
        let candidates = self.client.search(request).await?;
        debug!(
            endpoint = self.client.endpoint(),
            categories = request.category_ids.len(),
            returned = candidates.len(),
            "search completed"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_endpoint() {
        let err = HttpSearchProvider::new(&SearchConfig::default()).err();
        assert!(matches!(err, Some(DealcastError::Config(_))));
    }

    #[test]
    fn new_rejects_blank_endpoint() {
        let config = SearchConfig {
            endpoint: Some("  ".into()),
            ..Default::default()
        };
        assert!(HttpSearchProvider::new(&config).is_err());
    }

    #[test]
    fn plugin_adapter_metadata() {
        let config = SearchConfig {
            endpoint: Some("http://127.0.0.1:9/search".into()),
            ..Default::default()
        };
        let provider = HttpSearchProvider::new(&config).unwrap();
        assert_eq!(provider.name(), "http-search");
        assert_eq!(provider.adapter_type(), AdapterType::Search);
    }
}
