// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end `RpcTransport` behavior against a real (in-process) gRPC
//! server, rather than unit-testing the call wrappers in isolation.

use std::time::Duration;

use wv_test_support::rpc::weaviate::SearchResponse as MockSearchResponse;
use wv_test_support::{spawn, MockWeaviate};
use wv_transport::rpc::{BearerTokenSource, RpcTransport};
use wv_transport::weaviate::SearchRequest;

#[derive(Clone)]
struct StaticToken(Option<String>);

impl BearerTokenSource for StaticToken {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}

#[tokio::test]
async fn health_check_reports_serving_once_connected() {
    let handle = spawn(MockWeaviate::new()).await;

    let transport = RpcTransport::connect(
        handle.address.clone(),
        Duration::from_secs(1),
        Duration::from_secs(1),
        StaticToken(None),
    )
    .await
    .unwrap();

    assert!(transport.health_check().await.unwrap());

    handle.shutdown().await;
}

#[tokio::test]
async fn search_round_trips_a_queued_response() {
    let mock = MockWeaviate::new().push_search(MockSearchResponse {
        results: vec![],
        group_by_results: vec![],
        generative_grouped_result: Some("ok".to_string()),
        errors: vec![],
    });
    let handle = spawn(mock.clone()).await;

    let mut transport = RpcTransport::connect(
        handle.address.clone(),
        Duration::from_secs(1),
        Duration::from_secs(1),
        StaticToken(Some("tok".to_string())),
    )
    .await
    .unwrap();

    let response = transport
        .search(SearchRequest {
            collection: "Article".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(response.generative_grouped_result.as_deref(), Some("ok"));
    assert_eq!(mock.search_requests().len(), 1);
    assert_eq!(mock.search_requests()[0].collection, "Article");

    handle.shutdown().await;
}
