// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-collection object CRUD and the reference sub-facade (§4.10, SPEC_FULL
//! §4.10 supplement: `exists()` and `reference.{add,replace,delete}`), over
//! `POST|GET|PUT|PATCH|DELETE|HEAD /v1/objects[/{Collection}/{uuid}]` (§6).
//!
//! This module owns the REST wire shape for a single object: the client's
//! `Object`/`Reference` types use representations chosen for ergonomics
//! (an untagged `PropertyValue` union, a tagged `Reference` enum) that
//! don't match the server's JSON on the wire, so encoding/decoding here is
//! manual, the same way `wv_client::submit::encode_object` hand-builds the
//! RPC wire shape instead of deriving it.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;
use wv_core::beacon::Beacon;
use wv_core::collection::{normalize_collection_name, ConsistencyLevel};
use wv_core::object::{Object, PropertyValue, Reference, VectorInput};
use wv_error::Error;
use wv_transport::HttpTransport;

use crate::consistency::consistency_level_str;

/// The REST wire shape for a single object, matching the server's
/// `/v1/objects` JSON representation.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    class: String,
    #[serde(default)]
    properties: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vectors: Option<BTreeMap<String, Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tenant: Option<String>,
}

/// A reference property's beacon(s), as embedded in `properties` on the
/// wire: `[{"beacon": "weaviate://localhost/..."}]`.
#[derive(Debug, Serialize, Deserialize)]
struct WireBeacon {
    beacon: String,
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value)
        .map_err(|e| Error::InvalidInput(format!("failed to encode request body: {e}")))
}

fn property_value_to_json(value: &PropertyValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn json_to_property_value(value: Value) -> PropertyValue {
    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(b),
        Value::Number(n) => n
            .as_i64()
            .map(PropertyValue::Int)
            .unwrap_or_else(|| PropertyValue::Number(n.as_f64().unwrap_or_default())),
        Value::String(s) => PropertyValue::Text(s),
        Value::Array(items) => {
            PropertyValue::Array(items.into_iter().map(json_to_property_value).collect())
        }
        Value::Object(map) => PropertyValue::Nested(
            map.into_iter()
                .map(|(k, v)| (k, json_to_property_value(v)))
                .collect(),
        ),
    }
}

/// A JSON array is a reference property's wire form when every element is
/// an object carrying (only) a `beacon` string — the one shape the client
/// never produces for an ordinary array property.
fn as_beacon_array(value: &Value) -> Option<Vec<&str>> {
    let items = value.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| item.as_object().filter(|o| o.len() == 1)?.get("beacon")?.as_str())
        .collect()
}

fn encode_object(collection: &str, object: &Object) -> WireObject {
    let mut properties = serde_json::Map::new();
    for (name, value) in &object.properties {
        properties.insert(name.clone(), property_value_to_json(value));
    }
    for (name, reference) in &object.references {
        let beacons: Vec<Value> = reference
            .to_beacons()
            .iter()
            .map(|b| serde_json::to_value(WireBeacon { beacon: b.to_uri() }).unwrap())
            .collect();
        properties.insert(name.clone(), Value::Array(beacons));
    }

    let (vector, vectors) = match &object.vector {
        None => (None, None),
        Some(VectorInput::Flat(values)) => (Some(values.clone()), None),
        Some(VectorInput::Named(named)) => (None, Some(named.clone())),
    };

    WireObject {
        id: object.uuid,
        class: normalize_collection_name(collection),
        properties,
        vector,
        vectors,
        tenant: object.tenant.clone(),
    }
}

fn decode_object(wire: WireObject) -> Result<Object, Error> {
    let mut properties = BTreeMap::new();
    let mut references = BTreeMap::new();
    for (name, value) in wire.properties {
        if let Some(beacons) = as_beacon_array(&value) {
            let parsed = beacons
                .iter()
                .map(|uri| Beacon::parse(uri))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| Error::InvalidInput(format!("malformed reference beacon: {e}")))?;
            let target_collection = parsed.iter().find_map(|b| b.collection.clone());
            let uuids = parsed.iter().map(|b| b.uuid).collect();
            let reference = match target_collection {
                Some(target_collection) => Reference::ToMultiTarget { uuids, target_collection },
                None => Reference::ToUuids(uuids),
            };
            references.insert(name, reference);
        } else {
            properties.insert(name, json_to_property_value(value));
        }
    }

    let vector = match (wire.vector, wire.vectors) {
        (Some(flat), _) => Some(VectorInput::Flat(flat)),
        (None, Some(named)) => Some(VectorInput::Named(named)),
        (None, None) => None,
    };

    Ok(Object {
        uuid: wire.id,
        properties,
        vector,
        references,
        metadata: None,
        tenant: wire.tenant,
    })
}

/// Per-call read/write parameters threaded through every data operation
/// (§5: tenant and consistency level "carried per call").
#[derive(Clone, Copy, Debug, Default)]
pub struct CallScope<'a> {
    /// Tenant, for multi-tenant collections.
    pub tenant: Option<&'a str>,
    /// Replica acknowledgment level.
    pub consistency_level: Option<ConsistencyLevel>,
}

impl<'a> CallScope<'a> {
    fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(tenant) = self.tenant {
            params.insert("tenant".to_string(), tenant.to_string());
        }
        if let Some(level) = self.consistency_level {
            params.insert("consistency_level".to_string(), consistency_level_str(level).to_string());
        }
        params
    }
}

/// Single-object CRUD over `/v1/objects` (§4.10 `data`).
#[derive(Clone)]
pub struct DataFacade {
    transport: HttpTransport,
    collection: String,
}

impl DataFacade {
    pub(crate) fn new(transport: HttpTransport, collection: impl Into<String>) -> Self {
        Self {
            transport,
            collection: collection.into(),
        }
    }

    /// Insert a single object, assigning a fresh UUID if the caller didn't
    /// supply one (§3) and returning the UUID the object was stored under.
    pub async fn insert(&self, object: Object, scope: CallScope<'_>) -> Result<Uuid, Error> {
        let mut wire = encode_object(&self.collection, &object);
        let uuid = wire.id.unwrap_or_else(Uuid::new_v4);
        wire.id = Some(uuid);

        self.transport
            .send(
                Method::POST,
                "/objects",
                Some(&to_json(&wire)?),
                &scope.params(),
                &[],
                &[200],
                "data_insert",
            )
            .await?;
        Ok(uuid)
    }

    /// Fetch one object by UUID, or `None` if it does not exist (§7
    /// propagation policy: 404 on `get_by_id` maps to `None`).
    pub async fn get_by_id(&self, uuid: Uuid, scope: CallScope<'_>) -> Result<Option<Object>, Error> {
        let mut params = scope.params();
        params.insert("include".to_string(), "vector".to_string());
        let name = normalize_collection_name(&self.collection);
        let response = self
            .transport
            .get(
                &format!("/objects/{name}/{uuid}"),
                &params,
                &[],
                &[200, 404],
                "get_by_id",
            )
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        decode_object(response.json()?).map(Some)
    }

    /// `HEAD /v1/objects/{Collection}/{uuid}` — whether an object exists,
    /// without fetching its body (SPEC_FULL §4.10 supplement). 404 maps to
    /// `false` (§7).
    pub async fn exists(&self, uuid: Uuid, scope: CallScope<'_>) -> Result<bool, Error> {
        let name = normalize_collection_name(&self.collection);
        let response = self
            .transport
            .send(
                Method::HEAD,
                &format!("/objects/{name}/{uuid}"),
                None,
                &scope.params(),
                &[],
                &[200, 404],
                "exists",
            )
            .await?;
        Ok(response.status == 200)
    }

    /// Replace an object's properties/vector wholesale (`PUT`).
    pub async fn replace(&self, uuid: Uuid, object: Object, scope: CallScope<'_>) -> Result<(), Error> {
        let mut wire = encode_object(&self.collection, &object);
        wire.id = Some(uuid);
        let name = normalize_collection_name(&self.collection);
        self.transport
            .send(
                Method::PUT,
                &format!("/objects/{name}/{uuid}"),
                Some(&to_json(&wire)?),
                &scope.params(),
                &[],
                &[200],
                "data_replace",
            )
            .await?;
        Ok(())
    }

    /// Merge-update an object's properties (`PATCH`).
    pub async fn update(&self, uuid: Uuid, object: Object, scope: CallScope<'_>) -> Result<(), Error> {
        let mut wire = encode_object(&self.collection, &object);
        wire.id = Some(uuid);
        let name = normalize_collection_name(&self.collection);
        self.transport
            .send(
                Method::PATCH,
                &format!("/objects/{name}/{uuid}"),
                Some(&to_json(&wire)?),
                &scope.params(),
                &[],
                &[204],
                "data_update",
            )
            .await?;
        Ok(())
    }

    /// Delete an object by UUID.
    pub async fn delete(&self, uuid: Uuid, scope: CallScope<'_>) -> Result<(), Error> {
        let name = normalize_collection_name(&self.collection);
        self.transport
            .send(
                Method::DELETE,
                &format!("/objects/{name}/{uuid}"),
                None,
                &scope.params(),
                &[],
                &[204],
                "data_delete",
            )
            .await?;
        Ok(())
    }

    /// The reference sub-facade (SPEC_FULL §4.10 supplement): `add`,
    /// `replace`, `delete` on a single reference property, by UUID and
    /// property path.
    #[must_use]
    pub fn reference(&self) -> ReferenceFacade {
        ReferenceFacade {
            transport: self.transport.clone(),
            collection: self.collection.clone(),
        }
    }
}

/// Reference property CRUD: `POST|PUT|DELETE /v1/objects/{Collection}/
/// {uuid}/references/{property}` (`original_source/weaviate/collection/
/// data.py`, dropped from the distilled data model).
#[derive(Clone)]
pub struct ReferenceFacade {
    transport: HttpTransport,
    collection: String,
}

impl ReferenceFacade {
    fn path(&self, uuid: Uuid, property: &str) -> String {
        let name = normalize_collection_name(&self.collection);
        format!("/objects/{name}/{uuid}/references/{property}")
    }

    /// Add one or more beacons to a reference property, preserving
    /// whatever targets already exist.
    pub async fn add(
        &self,
        uuid: Uuid,
        property: &str,
        target: Reference,
        scope: CallScope<'_>,
    ) -> Result<(), Error> {
        let beacons: Vec<WireBeacon> = target
            .to_beacons()
            .into_iter()
            .map(|b| WireBeacon { beacon: b.to_uri() })
            .collect();
        self.transport
            .send(
                Method::POST,
                &self.path(uuid, property),
                Some(&to_json(&beacons)?),
                &scope.params(),
                &[],
                &[200],
                "reference_add",
            )
            .await?;
        Ok(())
    }

    /// Replace a reference property's targets wholesale.
    pub async fn replace(
        &self,
        uuid: Uuid,
        property: &str,
        target: Reference,
        scope: CallScope<'_>,
    ) -> Result<(), Error> {
        let beacons: Vec<WireBeacon> = target
            .to_beacons()
            .into_iter()
            .map(|b| WireBeacon { beacon: b.to_uri() })
            .collect();
        self.transport
            .send(
                Method::PUT,
                &self.path(uuid, property),
                Some(&to_json(&beacons)?),
                &scope.params(),
                &[],
                &[200],
                "reference_replace",
            )
            .await?;
        Ok(())
    }

    /// Delete specific beacons from a reference property.
    pub async fn delete(
        &self,
        uuid: Uuid,
        property: &str,
        target: Reference,
        scope: CallScope<'_>,
    ) -> Result<(), Error> {
        let beacons: Vec<WireBeacon> = target
            .to_beacons()
            .into_iter()
            .map(|b| WireBeacon { beacon: b.to_uri() })
            .collect();
        self.transport
            .send(
                Method::DELETE,
                &self.path(uuid, property),
                Some(&to_json(&beacons)?),
                &scope.params(),
                &[],
                &[204],
                "reference_delete",
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
    async fn insert_without_uuid_mints_and_returns_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/objects"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let facade = DataFacade::new(transport_for(&server).await, "Article");
        let uuid = facade
            .insert(
                Object::new().with_property("name", PropertyValue::Text("hello".into())),
                CallScope::default(),
            )
            .await
            .unwrap();
        assert_ne!(uuid, Uuid::nil());
    }

    #[tokio::test]
    async fn get_by_id_missing_returns_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/objects/Article/00000000-0000-0000-0000-000000000001"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let facade = DataFacade::new(transport_for(&server).await, "Article");
        let uuid = "00000000-0000-0000-0000-000000000001".parse().unwrap();
        assert!(facade.get_by_id(uuid, CallScope::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_by_id_decodes_scalar_and_reference_properties() {
        let server = MockServer::start().await;
        let uuid = Uuid::new_v4();
        Mock::given(method("GET"))
            .and(path(format!("/v1/objects/Article/{uuid}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": uuid,
                "class": "Article",
                "properties": {
                    "name": "hello",
                    "hasCategory": [{"beacon": "weaviate://localhost/Category/00000000-0000-0000-0000-000000000002"}],
                },
            })))
            .mount(&server)
            .await;

        let facade = DataFacade::new(transport_for(&server).await, "Article");
        let object = facade.get_by_id(uuid, CallScope::default()).await.unwrap().unwrap();
        assert_eq!(object.properties.get("name"), Some(&PropertyValue::Text("hello".into())));
        assert!(matches!(
            object.references.get("hasCategory"),
            Some(Reference::ToMultiTarget { target_collection, .. }) if target_collection == "Category"
        ));
    }

    #[tokio::test]
    async fn exists_maps_404_to_false() {
        let server = MockServer::start().await;
        let uuid = Uuid::new_v4();
        Mock::given(method("HEAD"))
            .and(path(format!("/v1/objects/Article/{uuid}")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let facade = DataFacade::new(transport_for(&server).await, "Article");
        assert!(!facade.exists(uuid, CallScope::default()).await.unwrap());
    }
}
