// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The provider seen through the `SearchProvider` trait object the engine uses.

use std::sync::Arc;

use dealcast_config::model::SearchConfig;
use dealcast_core::types::QualityFilters;
use dealcast_core::{DealcastError, SearchProvider, SearchRequest};
use dealcast_search::HttpSearchProvider;
use dealcast_test_utils::fixtures::candidate;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, api_key: Option<&str>) -> Arc<dyn SearchProvider + Send + Sync> {
    let config = SearchConfig {
        endpoint: Some(format!("{}/search", server.uri())),
        api_key: api_key.map(str::to_string),
        timeout_secs: 5,
    };
    Arc::new(HttpSearchProvider::new(&config).unwrap())
}

fn request() -> SearchRequest {
    SearchRequest {
        category_ids: vec!["kitchen".into(), "garden".into()],
        filters: QualityFilters {
            min_rating: Some(4.0),
            ..Default::default()
        },
        exclude_ids: vec![],
        breadth: 30,
    }
}

#[tokio::test]
async fn candidates_round_trip_through_the_provider() {
    let server = MockServer::start().await;
    let served = vec![candidate("K1", Some("K"), Some(80)), candidate("G7", None, None)];
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "candidates": served.clone() })),
        )
        .mount(&server)
        .await;

    let found = provider(&server, Some("token-1"))
        .fetch_candidates(&request())
        .await
        .unwrap();
    assert_eq!(found, served);
}

#[tokio::test]
async fn missing_candidates_field_means_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let found = provider(&server, None)
        .fetch_candidates(&request())
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn server_errors_surface_as_search_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = provider(&server, None)
        .fetch_candidates(&request())
        .await
        .unwrap_err();
    assert!(matches!(err, DealcastError::Search { .. }));
}
