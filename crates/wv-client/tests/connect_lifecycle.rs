// SPDX-License-Identifier: MIT OR Apache-2.0
//! The full `connect()` → `close()` lifecycle against a real HTTP mock
//! server and a real (in-process) gRPC mock server, rather than stopping
//! short at the HTTP readiness probe like the in-crate unit tests do.

use wiremock::MockServer;
use wv_client::Client;
use wv_config::ClientConfig;
use wv_error::Error;
use wv_test_support::{http as http_fixtures, spawn, MockWeaviate};

#[tokio::test]
async fn connect_then_close_against_live_transports() {
    let http_server = MockServer::start().await;
    http_fixtures::mount_healthy(&http_server, "1.25.0").await;
    let rpc = spawn(MockWeaviate::new()).await;

    let config = ClientConfig::new(http_server.uri(), rpc.address.clone());
    let client = Client::new(config, wv_auth::Credentials::ApiKey("key".to_string())).unwrap();

    client.connect().await.unwrap();
    // Idempotent: a second connect while live is a no-op, not an error.
    client.connect().await.unwrap();

    let err = client.close().await;
    assert!(err.is_ok());

    // Any further domain call after close is rejected.
    let err = client.collections().await.unwrap_err();
    assert!(matches!(err, Error::ClosedClient));

    rpc.shutdown().await;
}
