// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-collection tenant CRUD (§3, §6 `/v1/schema/{Collection}/tenants*`).
//!
//! Updates larger than 100 are chunked client-side (§3 "Lifecycles":
//! "updates larger than 100 are chunked by the client").

use reqwest::Method;
use std::collections::BTreeMap;
use wv_core::collection::normalize_collection_name;
use wv_core::tenant::Tenant;
use wv_error::Error;
use wv_transport::HttpTransport;

const CHUNK_SIZE: usize = 100;

/// Thin CRUD executor over per-collection tenant management.
#[derive(Clone)]
pub struct TenantAdmin {
    transport: HttpTransport,
}

impl TenantAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Create tenants, chunking requests larger than 100.
    pub async fn create(&self, collection: &str, tenants: &[Tenant]) -> Result<(), Error> {
        let name = normalize_collection_name(collection);
        for chunk in tenants.chunks(CHUNK_SIZE) {
            self.transport
                .post(&format!("/schema/{name}/tenants"), &chunk, &[], &[200], "tenants_create")
                .await?;
        }
        Ok(())
    }

    /// Update tenants' activity status, chunking requests larger than 100.
    pub async fn update(&self, collection: &str, tenants: &[Tenant]) -> Result<(), Error> {
        let name = normalize_collection_name(collection);
        for chunk in tenants.chunks(CHUNK_SIZE) {
            let body = serde_json::to_value(chunk)
                .map_err(|e| Error::InvalidInput(format!("failed to serialize tenants: {e}")))?;
            self.transport
                .send(
                    Method::PUT,
                    &format!("/schema/{name}/tenants"),
                    Some(&body),
                    &BTreeMap::new(),
                    &[],
                    &[200],
                    "tenants_update",
                )
                .await?;
        }
        Ok(())
    }

    /// Remove tenants by name, chunking requests larger than 100.
    pub async fn remove(&self, collection: &str, names: &[String]) -> Result<(), Error> {
        let name = normalize_collection_name(collection);
        for chunk in names.chunks(CHUNK_SIZE) {
            let body = serde_json::to_value(chunk)
                .map_err(|e| Error::InvalidInput(format!("failed to serialize tenant names: {e}")))?;
            self.transport
                .send(
                    Method::DELETE,
                    &format!("/schema/{name}/tenants"),
                    Some(&body),
                    &BTreeMap::new(),
                    &[],
                    &[200],
                    "tenants_remove",
                )
                .await?;
        }
        Ok(())
    }

    /// Fetch one tenant by name, or `None` if it does not exist.
    pub async fn get(&self, collection: &str, tenant: &str) -> Result<Option<Tenant>, Error> {
        let name = normalize_collection_name(collection);
        let response = self
            .transport
            .get(
                &format!("/schema/{name}/tenants/{tenant}"),
                &BTreeMap::new(),
                &[],
                &[200, 404],
                "tenants_get",
            )
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// List every tenant under a collection.
    pub async fn list(&self, collection: &str) -> Result<Vec<Tenant>, Error> {
        let name = normalize_collection_name(collection);
        let response = self
            .transport
            .get(
                &format!("/schema/{name}/tenants"),
                &BTreeMap::new(),
                &[],
                &[200],
                "tenants_list",
            )
            .await?;
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wv_config::logging::{LogLevel, Logger};
    use wv_core::tenant::ActivityStatus;

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
    async fn create_chunks_over_100_tenants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/schema/Article/tenants"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let admin = TenantAdmin::new(transport_for(&server).await);
        let tenants: Vec<Tenant> = (0..150).map(|i| Tenant::active(format!("T{i}"))).collect();
        admin.create("article", &tenants).await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_tenant_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Article/tenants/T1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let admin = TenantAdmin::new(transport_for(&server).await);
        assert!(admin.get("Article", "T1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_decodes_tenants() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schema/Article/tenants"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "T1", "activity_status": "ACTIVE" },
            ])))
            .mount(&server)
            .await;

        let admin = TenantAdmin::new(transport_for(&server).await);
        let tenants = admin.list("Article").await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].activity_status, ActivityStatus::Active);
        let _ = body_json::<serde_json::Value>; // keep matcher helper import used across module
    }
}
