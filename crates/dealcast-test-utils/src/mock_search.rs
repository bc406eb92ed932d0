// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock search provider for deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use dealcast_core::traits::{PluginAdapter, SearchProvider, SearchRequest};
use dealcast_core::types::{AdapterType, Candidate, HealthStatus};
use dealcast_core::DealcastError;

/// A search provider that replays scripted responses.
///
/// Responses are popped from a FIFO queue; an empty queue yields no
/// candidates. Every request is captured for assertions.
pub struct MockSearchProvider {
    responses: Arc<Mutex<VecDeque<Result<Vec<Candidate>, String>>>>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
    gate: Option<Gate>,
}

/// Holds a fetch open until the test releases it.
struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

/// Test-side handle for a gated [`MockSearchProvider`].
#[derive(Clone)]
pub struct GateHandle {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl GateHandle {
    /// Wait until a fetch is in flight.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the in-flight fetch return.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// Pre-load successful responses, returned in order.
    pub fn with_responses(responses: Vec<Vec<Candidate>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            ..Self::new()
        }
    }

    /// Make every fetch block until [`GateHandle::release`] is called.
    pub fn gated(mut self) -> (Self, GateHandle) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        self.gate = Some(Gate {
            entered: entered.clone(),
            release: release.clone(),
        });
        (self, GateHandle { entered, release })
    }

    pub async fn push_response(&self, candidates: Vec<Candidate>) {
        self.responses.lock().await.push_back(Ok(candidates));
    }

    /// Queue a failure for the next fetch.
    pub async fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .await
            .push_back(Err(message.to_string()));
    }

    /// All requests received so far.
    pub async fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSearchProvider {
    fn name(&self) -> &str {
        "mock-search"
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
impl SearchProvider for MockSearchProvider {
    async fn fetch_candidates(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<Candidate>, DealcastError> {
        self.requests.lock().await.push(request.clone());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match self.responses.lock().await.pop_front() {
            Some(Ok(candidates)) => Ok(candidates),
            Some(Err(message)) => Err(DealcastError::Search {
                message,
                source: None,
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::candidate;
    use dealcast_core::types::QualityFilters;

    fn request() -> SearchRequest {
        SearchRequest {
            category_ids: vec!["books".to_string()],
            filters: QualityFilters::default(),
            exclude_ids: Vec::new(),
            breadth: 100,
        }
    }

    #[tokio::test]
    async fn replays_scripted_responses_then_empty() {
        let search = MockSearchProvider::with_responses(vec![vec![candidate("a", None, Some(1))]]);
        search.push_error("quota exceeded").await;

        assert_eq!(search.fetch_candidates(&request()).await.unwrap().len(), 1);
        assert!(search.fetch_candidates(&request()).await.is_err());
        assert!(search.fetch_candidates(&request()).await.unwrap().is_empty());
        assert_eq!(search.call_count().await, 3);
    }

    #[tokio::test]
    async fn gate_holds_fetch_until_released() {
        let (search, gate) = MockSearchProvider::new().gated();
        let search = Arc::new(search);
        let task = {
            let search = search.clone();
            tokio::spawn(async move { search.fetch_candidates(&request()).await })
        };

        gate.entered().await;
        assert!(!task.is_finished());
        gate.release();
        assert!(task.await.unwrap().unwrap().is_empty());
    }
}
