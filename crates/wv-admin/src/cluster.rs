// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cluster-wide status passthrough (§6 `/v1/cluster/*`, `/v1/nodes`).
//!
//! Both endpoints return server-internal shapes this crate does not
//! interpret (§1 Non-goals: no storage/indexing internals); callers get the
//! raw JSON back.

use serde_json::Value;
use std::collections::BTreeMap;
use wv_error::Error;
use wv_transport::HttpTransport;

/// Thin executor over cluster-wide diagnostic endpoints.
#[derive(Clone)]
pub struct ClusterAdmin {
    transport: HttpTransport,
}

impl ClusterAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Fetch raft/cluster statistics, unparsed.
    pub async fn statistics(&self) -> Result<Value, Error> {
        let response = self
            .transport
            .get("/cluster/statistics", &BTreeMap::new(), &[], &[200], "cluster_statistics")
            .await?;
        response.json()
    }

    /// Fetch node status, optionally scoped to one collection, unparsed.
    pub async fn nodes(&self, collection: Option<&str>) -> Result<Value, Error> {
        let mut params = BTreeMap::new();
        if let Some(collection) = collection {
            params.insert("class".to_string(), collection.to_string());
        }
        let response = self.transport.get("/nodes", &params, &[], &[200], "cluster_nodes").await?;
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wv_config::logging::{LogLevel, Logger};

    async fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(
            server.uri(),
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(1),
            Logger::with_level(LogLevel::Info),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn statistics_passes_through_raw_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cluster/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "synchronized": true })))
            .mount(&server)
            .await;

        let admin = ClusterAdmin::new(transport_for(&server).await);
        let value = admin.statistics().await.unwrap();
        assert_eq!(value["synchronized"], serde_json::json!(true));
    }
}
