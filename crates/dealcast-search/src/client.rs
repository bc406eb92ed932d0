// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the product search endpoint.
//!
//! Requests are a JSON-encoded [`SearchRequest`]; responses carry a
//! `candidates` array of normalized products.

use std::time::Duration;

use dealcast_core::{DealcastError, SearchRequest};
use dealcast_core::types::Candidate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, warn};

/// Body returned by the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Error body some deployments return alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
}

/// Thin JSON client with bearer auth and one retry on transient statuses.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl SearchClient {
    pub fn new(
        endpoint: String,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, DealcastError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    DealcastError::Config(format!("invalid search API key header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| DealcastError::Search {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Shortens the pause between attempts.
    #[cfg(test)]
    fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POSTs `request` and decodes the candidate list.
    ///
    /// On transient errors (429, 500, 503), retries once after a short delay.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Candidate>, DealcastError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying search request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(request)
                .send()
                .await
                .map_err(|e| DealcastError::Search {
                    message: format!("search request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "search response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| DealcastError::Search {
                    message: format!("failed to read search response: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let parsed: SearchResponse =
                    serde_json::from_str(&body).map_err(|e| DealcastError::Search {
                        message: format!("failed to parse search response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(parsed.candidates);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient search error, will retry");
                last_error = Some(DealcastError::Search {
                    message: format!("search endpoint returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("search endpoint returned {status}: {}", api_err.error),
                Err(_) => format!("search endpoint returned {status}: {body}"),
            };
            return Err(DealcastError::Search {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| DealcastError::Search {
            message: "search request failed after retries".into(),
            source: None,
        }))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealcast_core::types::QualityFilters;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> SearchClient {
        SearchClient::new(
            format!("{}/v1/candidates", server.uri()),
            Some("sk-test"),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_retry_delay(Duration::from_millis(10))
    }

    fn request() -> SearchRequest {
        SearchRequest {
            category_ids: vec!["electronics".into()],
            filters: QualityFilters::default(),
            exclude_ids: vec!["B000".into()],
            breadth: 100,
        }
    }

    fn candidate_json(id: &str, score: i64) -> serde_json::Value {
        serde_json::json!({
            "product_id": id,
            "parent_id": null,
            "quality_score": score,
            "payload": {
                "title": "USB-C hub",
                "price": 19.9,
                "currency": "EUR",
                "rating": 4.4,
                "review_count": 812,
                "link": format!("https://shop.example/dp/{id}")
            }
        })
    }

    #[tokio::test]
    async fn search_decodes_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/candidates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [candidate_json("B001", 120), candidate_json("B002", 300)]
            })))
            .mount(&server)
            .await;

        let found = test_client(&server).search(&request()).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].product_id, "B001");
        assert_eq!(found[1].quality_score, Some(300));
        assert!(found[0].payload.images.is_empty());
    }

    #[tokio::test]
    async fn search_sends_bearer_token_and_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/candidates"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "category_ids": ["electronics"],
                "exclude_ids": ["B000"],
                "breadth": 100
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let found = test_client(&server).search(&request()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn search_retries_once_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [candidate_json("B009", 50)]
            })))
            .mount(&server)
            .await;

        let found = test_client(&server).search(&request()).await.unwrap();
        assert_eq!(found[0].product_id, "B009");
    }

    #[tokio::test]
    async fn search_gives_up_after_second_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "index rebuilding"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server).search(&request()).await.unwrap_err();
        assert!(matches!(err, DealcastError::Search { .. }));
        assert!(err.to_string().contains("index rebuilding"), "got: {err}");
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad category"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server).search(&request()).await.unwrap_err();
        assert!(err.to_string().contains("bad category"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_a_search_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server).search(&request()).await.unwrap_err();
        assert!(matches!(err, DealcastError::Search { .. }));
    }
}
