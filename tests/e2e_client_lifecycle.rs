// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end client lifecycle against in-process mocks for both planes:
//! connect (health probe + version probe + rpc health check), schema
//! create over the REST control plane, a batch insert over the RPC data
//! plane, and close — the scenario A/B path from SPEC_FULL §3 and §8,
//! driven through the real `Client` rather than any one crate in isolation.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wv_client::Client;
use wv_config::ClientConfig;
use wv_core::CollectionConfig;
use wv_test_support::fixtures::{named_objects, test_collection, test_collection_config};
use wv_test_support::rpc::weaviate::BatchObjectsReply;
use wv_test_support::{spawn, MockWeaviate};

#[tokio::test]
async fn connect_create_collection_insert_batch_close() {
    let rpc = spawn(MockWeaviate::new().push_batch(BatchObjectsReply {
        results: vec![],
        took: 0.01,
    }))
    .await;

    let http = MockServer::start().await;
    wv_test_support::http::mount_healthy(&http, "1.25.0").await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_collection()))
        .mount(&http)
        .await;

    let config = ClientConfig::new(http.uri(), rpc.address.clone());
    let client = Client::new(config, wv_auth::Credentials::ApiKey("test-key".into())).unwrap();
    client.connect().await.unwrap();

    let created = client
        .collections()
        .await
        .unwrap()
        .create("Test", test_collection_config())
        .await
        .unwrap();
    assert_eq!(created.name, "Test");
    assert_eq!(created.config, Some(test_collection_config()));

    let collection = client.collection("Test").await.unwrap();
    let result = collection.batch().insert_many(named_objects(3)).await.unwrap();
    assert_eq!(result.all_responses.len(), 3);
    assert!(!result.has_errors());
    assert_eq!(result.uuids.len(), 3);

    client.close().await.unwrap();
    rpc.shutdown().await;
}

#[tokio::test]
async fn connect_fails_when_server_reports_not_ready() {
    let http = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/live"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&http)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/ready"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&http)
        .await;

    let config = ClientConfig::new(http.uri(), "http://127.0.0.1:1");
    let client = Client::new(config, wv_auth::Credentials::ApiKey("test-key".into())).unwrap();
    let err = client.connect().await.unwrap_err();
    assert!(matches!(err, wv_error::Error::Connection { .. }));
}

#[tokio::test]
async fn schema_update_round_trips_through_collection_config_facade() {
    let rpc = spawn(MockWeaviate::new()).await;

    let http = MockServer::start().await;
    wv_test_support::http::mount_healthy(&http, "1.25.0").await;
    Mock::given(method("POST"))
        .and(path("/v1/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_collection()))
        .mount(&http)
        .await;
    let mut updated_config = test_collection_config();
    updated_config.replication_config.factor = Some(3);
    let mut updated = test_collection();
    updated.config = Some(updated_config.clone());
    Mock::given(method("PUT"))
        .and(path("/v1/schema/Test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated.clone()))
        .mount(&http)
        .await;

    let config = ClientConfig::new(http.uri(), rpc.address.clone());
    let client = Client::new(config, wv_auth::Credentials::ApiKey("test-key".into())).unwrap();
    client.connect().await.unwrap();

    client
        .collections()
        .await
        .unwrap()
        .create("Test", test_collection_config())
        .await
        .unwrap();

    let collection = client.collection("Test").await.unwrap();
    let result: CollectionConfig = {
        let response = collection.config().update(updated_config).await.unwrap();
        response.config.unwrap()
    };
    assert_eq!(result.replication_config.factor, Some(3));

    client.close().await.unwrap();
    rpc.shutdown().await;
}
