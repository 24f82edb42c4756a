// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connect-time readiness/liveness probing (§6: `.well-known/ready`,
//! `.well-known/live`, `GET /v1/meta`).

use crate::http::HttpTransport;
use std::collections::BTreeMap;
use wv_capability::ServerVersion;
use wv_error::Error;

/// The outcome of probing a server at connect time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HealthStatus {
    /// The server answered both probes and reported a parseable version.
    Ready,
    /// The server is reachable but not yet ready to serve traffic.
    NotReady,
    /// The server could not be reached at all.
    Unreachable {
        /// Human-readable reason, carried for diagnostics/logging.
        reason: String,
    },
}

/// Probe `.well-known/live`, `.well-known/ready`, and `GET /v1/meta` in
/// sequence, matching the order a connecting client cares about: is the
/// process alive, is it ready, and what version is it running.
pub async fn probe(http: &HttpTransport) -> HealthStatus {
    if http
        .get("/.well-known/live", &BTreeMap::new(), &[], &[200], "live")
        .await
        .is_err()
    {
        return HealthStatus::Unreachable {
            reason: "liveness probe failed".to_string(),
        };
    }

    if http
        .get("/.well-known/ready", &BTreeMap::new(), &[], &[200], "ready")
        .await
        .is_err()
    {
        return HealthStatus::NotReady;
    }

    HealthStatus::Ready
}

/// Fetch and parse the connected server's version from `GET /v1/meta`.
pub async fn server_version(http: &HttpTransport) -> Result<ServerVersion, Error> {
    #[derive(serde::Deserialize)]
    struct Meta {
        version: String,
    }

    let response = http
        .get("/meta", &BTreeMap::new(), &[], &[200], "meta")
        .await?;
    let meta: Meta = response.json()?;
    ServerVersion::parse(&meta.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wv_config::logging::{LogLevel, Logger};

    async fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(
            server.uri(),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Logger::with_level(LogLevel::Info),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ready_when_both_probes_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let http = transport(&server).await;
        assert_eq!(probe(&http).await, HealthStatus::Ready);
    }

    #[tokio::test]
    async fn not_ready_when_ready_probe_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let http = transport(&server).await;
        assert_eq!(probe(&http).await, HealthStatus::NotReady);
    }

    #[tokio::test]
    async fn unreachable_when_live_probe_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/live"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let http = transport(&server).await;
        assert!(matches!(
            probe(&http).await,
            HealthStatus::Unreachable { .. }
        ));
    }

    #[tokio::test]
    async fn parses_server_version_from_meta() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/meta"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "1.25.3"
            })))
            .mount(&server)
            .await;

        let http = transport(&server).await;
        let version = server_version(&http).await.unwrap();
        assert_eq!(version, ServerVersion::new(1, 25, 3));
    }
}
