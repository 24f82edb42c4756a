// SPDX-License-Identifier: MIT OR Apache-2.0
//! `wiremock` stub builders for the REST control plane (§6), shared across
//! integration tests instead of every crate re-typing the same `.well-known`
//! and `/v1/meta` boilerplate.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount the liveness and readiness probes as always-200, and `GET
/// /v1/meta` reporting `version`. Matches the sequence `wv_transport::
/// health::probe` drives at connect time.
pub async fn mount_healthy(server: &MockServer, version: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/live"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/.well-known/ready"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/meta"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "version": version })),
        )
        .mount(server)
        .await;
}

/// Mount a 404 for OIDC discovery, matching a server with no OIDC configured
/// (§4.2: "supplying credentials against a non-OIDC server fails fast").
pub async fn mount_no_oidc(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

/// Mount OIDC discovery returning a minimal, valid discovery document
/// pointing the token endpoint at `token_endpoint` (typically this same
/// mock server's `/token` path, stubbed separately with `mount_token`).
pub async fn mount_oidc_discovery(server: &MockServer, token_endpoint: &str) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_endpoint": token_endpoint,
        })))
        .mount(server)
        .await;
}

/// Mount `POST /token` returning a fixed access token, optionally with a
/// refresh token, expiring in `expires_in` seconds.
pub async fn mount_token(server: &MockServer, access_token: &str, expires_in: u64, refresh_token: Option<&str>) {
    let mut body = serde_json::json!({
        "access_token": access_token,
        "expires_in": expires_in,
    });
    if let Some(refresh) = refresh_token {
        body["refresh_token"] = serde_json::Value::String(refresh.to_string());
    }
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
