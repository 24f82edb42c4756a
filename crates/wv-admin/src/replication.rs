// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shard replication operation CRUD (§6 `/v1/replication/*`).
//!
//! Sharding state is returned as an opaque [`serde_json::Value`]: storage
//! and indexing internals are out of scope (§1 Non-goals).

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;
use wv_core::replicate::{ReplicateOperation, TransferType};
use wv_error::Error;
use wv_transport::HttpTransport;

#[derive(Serialize)]
struct ReplicateRequest<'a> {
    collection: &'a str,
    shard: &'a str,
    #[serde(rename = "sourceNode")]
    source_node: &'a str,
    #[serde(rename = "targetNode")]
    target_node: &'a str,
    #[serde(rename = "type")]
    transfer_type: TransferType,
}

/// Thin CRUD executor over shard replication operations.
#[derive(Clone)]
pub struct ReplicationAdmin {
    transport: HttpTransport,
}

impl ReplicationAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Register a new replica copy/move operation.
    pub async fn replicate(
        &self,
        collection: &str,
        shard: &str,
        source_node: &str,
        target_node: &str,
        transfer_type: TransferType,
    ) -> Result<ReplicateOperation, Error> {
        let body = ReplicateRequest { collection, shard, source_node, target_node, transfer_type };
        let response = self
            .transport
            .post("/replication/replicate", &body, &[], &[200], "replication_replicate")
            .await?;
        response.json()
    }

    /// Fetch one replication operation by id, or `None` if it does not exist.
    pub async fn get(&self, uuid: Uuid) -> Result<Option<ReplicateOperation>, Error> {
        let response = self
            .transport
            .get(
                &format!("/replication/replicate/{uuid}"),
                &BTreeMap::new(),
                &[],
                &[200, 404],
                "replication_get",
            )
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// List replication operations, optionally filtered to one collection.
    pub async fn list(&self, collection: Option<&str>) -> Result<Vec<ReplicateOperation>, Error> {
        let mut params = BTreeMap::new();
        if let Some(collection) = collection {
            params.insert("collection".to_string(), collection.to_string());
        }
        let response = self
            .transport
            .get("/replication/replicate", &params, &[], &[200], "replication_list")
            .await?;
        response.json()
    }

    /// Cancel a running replication operation.
    pub async fn cancel(&self, uuid: Uuid) -> Result<(), Error> {
        self.transport
            .send(
                Method::POST,
                &format!("/replication/replicate/{uuid}/cancel"),
                None,
                &BTreeMap::new(),
                &[],
                &[200, 204],
                "replication_cancel",
            )
            .await?;
        Ok(())
    }

    /// Delete a completed replication operation's record.
    pub async fn delete(&self, uuid: Uuid) -> Result<(), Error> {
        self.transport
            .send(
                Method::DELETE,
                &format!("/replication/replicate/{uuid}"),
                None,
                &BTreeMap::new(),
                &[],
                &[200, 204],
                "replication_delete",
            )
            .await?;
        Ok(())
    }

    /// Fetch the raw sharding state, optionally filtered to one collection.
    /// Returned opaque: shard/replica layout internals are not modeled here.
    pub async fn sharding_state(&self, collection: Option<&str>) -> Result<Value, Error> {
        let mut params = BTreeMap::new();
        if let Some(collection) = collection {
            params.insert("collection".to_string(), collection.to_string());
        }
        let response = self
            .transport
            .get("/replication/sharding-state", &params, &[], &[200], "replication_sharding_state")
            .await?;
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
    async fn get_missing_operation_is_none() {
        let server = MockServer::start().await;
        let uuid = Uuid::nil();
        Mock::given(method("GET"))
            .and(path(format!("/v1/replication/replicate/{uuid}")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let admin = ReplicationAdmin::new(transport_for(&server).await);
        assert!(admin.get(uuid).await.unwrap().is_none());
    }
}
