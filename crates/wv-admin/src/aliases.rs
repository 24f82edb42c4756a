// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collection alias CRUD (§6 `/v1/aliases*`).

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wv_error::Error;
use wv_transport::HttpTransport;

/// A collection alias: an alternate name resolving to a real collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alias {
    /// The alias name.
    pub alias: String,
    /// The collection the alias currently resolves to.
    pub collection: String,
}

#[derive(Debug, Deserialize)]
struct AliasListResponse {
    #[serde(default)]
    aliases: Vec<Alias>,
}

/// Thin CRUD executor over collection aliases.
#[derive(Clone)]
pub struct AliasAdmin {
    transport: HttpTransport,
}

impl AliasAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// List every alias defined on the server.
    pub async fn list(&self) -> Result<Vec<Alias>, Error> {
        let response = self
            .transport
            .get("/aliases", &BTreeMap::new(), &[], &[200], "aliases_list")
            .await?;
        Ok(response.json::<AliasListResponse>()?.aliases)
    }

    /// Fetch one alias by name, or `None` if it does not exist.
    pub async fn get(&self, alias: &str) -> Result<Option<Alias>, Error> {
        let response = self
            .transport
            .get(&format!("/aliases/{alias}"), &BTreeMap::new(), &[], &[200, 404], "aliases_get")
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Create a new alias pointing at a collection.
    pub async fn create(&self, alias: &str, collection: &str) -> Result<(), Error> {
        let body = Alias { alias: alias.to_string(), collection: collection.to_string() };
        self.transport.post("/aliases", &body, &[], &[200], "aliases_create").await?;
        Ok(())
    }

    /// Repoint an existing alias at a different collection.
    pub async fn update(&self, alias: &str, collection: &str) -> Result<(), Error> {
        let body = serde_json::json!({ "collection": collection });
        self.transport
            .send(Method::PUT, &format!("/aliases/{alias}"), Some(&body), &BTreeMap::new(), &[], &[200], "aliases_update")
            .await?;
        Ok(())
    }

    /// Delete an alias.
    pub async fn delete(&self, alias: &str) -> Result<(), Error> {
        self.transport
            .send(Method::DELETE, &format!("/aliases/{alias}"), None, &BTreeMap::new(), &[], &[200, 204], "aliases_delete")
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
    async fn get_missing_alias_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/aliases/Articles"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let admin = AliasAdmin::new(transport_for(&server).await);
        assert!(admin.get("Articles").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_decodes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/aliases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "aliases": [{ "alias": "Articles", "collection": "Article" }],
            })))
            .mount(&server)
            .await;

        let admin = AliasAdmin::new(transport_for(&server).await);
        let aliases = admin.list().await.unwrap();
        assert_eq!(aliases[0].collection, "Article");
    }
}
