// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collection schema CRUD (§6 `/v1/schema*`).

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wv_core::collection::{normalize_collection_name, Collection, CollectionConfig};
use wv_core::property::Property;
use wv_error::Error;
use wv_transport::HttpTransport;

#[derive(Debug, Deserialize)]
struct SchemaListResponse {
    #[serde(default)]
    classes: Vec<Collection>,
}

/// One shard's replication/readiness status, as returned by
/// `GET /v1/schema/{name}/shards`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShardStatus {
    /// Shard name.
    pub name: String,
    /// Current status string (e.g. `READY`, `READONLY`).
    pub status: String,
}

/// Thin CRUD executor over schema management.
#[derive(Clone)]
pub struct SchemaAdmin {
    transport: HttpTransport,
}

impl SchemaAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// List every collection defined on the server.
    pub async fn list(&self) -> Result<Vec<Collection>, Error> {
        let response = self
            .transport
            .get("/schema", &BTreeMap::new(), &[], &[200], "schema_list")
            .await?;
        Ok(response.json::<SchemaListResponse>()?.classes)
    }

    /// Fetch one collection's config, or `None` if it does not exist (§7
    /// propagation policy).
    pub async fn get(&self, name: &str) -> Result<Option<Collection>, Error> {
        let name = normalize_collection_name(name);
        let response = self
            .transport
            .get(
                &format!("/schema/{name}"),
                &BTreeMap::new(),
                &[],
                &[200, 404],
                "schema_get",
            )
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Create a collection. The returned handle carries the name the
    /// server confirmed (§3: "`create` returns the handle only after the
    /// server confirms the name").
    pub async fn create(&self, name: &str, config: CollectionConfig) -> Result<Collection, Error> {
        let collection = Collection {
            name: normalize_collection_name(name),
            config: Some(config),
        };
        let response = self
            .transport
            .post("/schema", &collection, &[], &[200], "schema_create")
            .await?;
        response.json()
    }

    /// Update a collection's mutable config fields (`PUT /v1/schema/{name}`),
    /// used by the collection config facade's `update` (SPEC_FULL §4.10).
    pub async fn update(&self, name: &str, config: CollectionConfig) -> Result<Collection, Error> {
        let collection = Collection {
            name: normalize_collection_name(name),
            config: Some(config),
        };
        let response = self
            .transport
            .send(
                Method::PUT,
                &format!("/schema/{}", collection.name),
                Some(&serde_json::to_value(&collection).map_err(|e| {
                    Error::InvalidInput(format!("failed to encode collection config: {e}"))
                })?),
                &BTreeMap::new(),
                &[],
                &[200],
                "schema_update",
            )
            .await?;
        response.json()
    }

    /// Delete one collection.
    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        let name = normalize_collection_name(name);
        self.transport
            .send(
                Method::DELETE,
                &format!("/schema/{name}"),
                None,
                &BTreeMap::new(),
                &[],
                &[200],
                "schema_delete",
            )
            .await?;
        Ok(())
    }

    /// Delete many collections as parallel requests. Atomicity is
    /// per-collection, not across the set (§3): one failure does not
    /// prevent the others from completing.
    pub async fn delete_many(&self, names: &[String]) -> BTreeMap<String, Result<(), Error>> {
        let requests = names.iter().map(|name| async move {
            let result = self.delete(name).await;
            (name.clone(), result)
        });
        futures::future::join_all(requests).await.into_iter().collect()
    }

    /// Add a property to an existing collection.
    pub async fn add_property(&self, collection: &str, property: Property) -> Result<(), Error> {
        let name = normalize_collection_name(collection);
        self.transport
            .post(
                &format!("/schema/{name}/properties"),
                &property,
                &[],
                &[200],
                "schema_add_property",
            )
            .await?;
        Ok(())
    }

    /// Fetch shard status for a collection.
    pub async fn shards(&self, collection: &str) -> Result<Vec<ShardStatus>, Error> {
        let name = normalize_collection_name(collection);
        let response = self
            .transport
            .get(
                &format!("/schema/{name}/shards"),
                &BTreeMap::new(),
                &[],
                &[200],
                "schema_shards",
            )
            .await?;
        response.json()
    }

    /// Update one shard's status (e.g. `READY`/`READONLY`).
    pub async fn update_shard_status(
        &self,
        collection: &str,
        shard: &str,
        status: &str,
    ) -> Result<(), Error> {
        let name = normalize_collection_name(collection);
        let body = serde_json::json!({ "status": status });
        self.transport
            .send(
                Method::PUT,
                &format!("/schema/{name}/shards/{shard}"),
                Some(&body),
                &BTreeMap::new(),
                &[],
                &[200],
                "schema_update_shard_status",
            )
            .await?;
        Ok(())
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
    async fn missing_collection_describes_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Article"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let admin = SchemaAdmin::new(transport_for(&server).await);
        assert!(admin.get("article").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_normalizes_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Article",
                "config": null,
            })))
            .mount(&server)
            .await;

        let admin = SchemaAdmin::new(transport_for(&server).await);
        let collection = admin.create("article", CollectionConfig::default()).await.unwrap();
        assert_eq!(collection.name, "Article");
    }

    #[tokio::test]
    async fn delete_many_reports_per_collection_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/schema/Article"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/schema/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let admin = SchemaAdmin::new(transport_for(&server).await);
        let outcomes = admin
            .delete_many(&["Article".to_string(), "Missing".to_string()])
            .await;
        assert!(outcomes["Article"].is_ok());
        assert!(outcomes["Missing"].is_err());
    }
}
