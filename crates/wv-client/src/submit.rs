// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transport-level implementations of `wv_batch`'s submitter/node-stats
//! seams: objects over RPC `BatchObjects`, references over REST
//! `POST /v1/batch/references`, node stats over `GET /v1/nodes` (§4.8, §6).

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use wv_auth::TokenStateHandle;
use wv_batch::{
    NodeStatsReading, NodeStatsSource, ObjectBatchSubmitter, ObjectFlushOutcome,
    ReferenceBatchSubmitter, ReferenceFlushOutcome,
};
use wv_core::collection::ConsistencyLevel;
use wv_core::object::VectorInput;
use wv_core::{BatchObject, BatchReference};
use wv_error::Error;
use wv_transport::http::HttpTransport;
use wv_transport::rpc::weaviate::{
    BatchObject as RpcBatchObject, BatchObjectsRequest, Vectors as RpcVectors,
};
use wv_transport::rpc::RpcTransport;

use crate::consistency::consistency_level_str;

/// Drives the RPC data plane's `BatchObjects` call. Wrapped in a
/// [`Mutex`] because [`RpcTransport`]'s unary calls take `&mut self`.
pub struct RpcObjectSubmitter {
    transport: Mutex<RpcTransport<TokenStateHandle>>,
}

impl RpcObjectSubmitter {
    /// Wrap a connected RPC transport.
    #[must_use]
    pub fn new(transport: RpcTransport<TokenStateHandle>) -> Self {
        Self {
            transport: Mutex::new(transport),
        }
    }
}

fn encode_object(object: &BatchObject) -> Result<RpcBatchObject, Error> {
    let uuid = object
        .object
        .uuid
        .ok_or_else(|| Error::InvalidInput("batch object missing assigned uuid".to_string()))?;
    let properties = serde_json::to_vec(&object.object.properties)
        .map_err(|e| Error::InvalidInput(format!("failed to encode object properties: {e}")))?;
    let (vector_bytes, vectors) = match &object.object.vector {
        None => (Vec::new(), Vec::new()),
        Some(VectorInput::Flat(values)) => (values.clone(), Vec::new()),
        Some(VectorInput::Named(named)) => (
            Vec::new(),
            named
                .iter()
                .map(|(name, values)| RpcVectors {
                    name: name.clone(),
                    values: values.clone(),
                })
                .collect(),
        ),
    };
    Ok(RpcBatchObject {
        uuid: uuid.to_string(),
        collection: object.collection.clone(),
        properties,
        vector_bytes,
        vectors,
        tenant: object.object.tenant.clone(),
    })
}

#[async_trait::async_trait]
impl ObjectBatchSubmitter for RpcObjectSubmitter {
    async fn submit_objects(
        &self,
        objects: &[BatchObject],
        consistency_level: Option<ConsistencyLevel>,
    ) -> Result<ObjectFlushOutcome, Error> {
        let encoded = objects
            .iter()
            .map(encode_object)
            .collect::<Result<Vec<_>, _>>()?;
        let request = BatchObjectsRequest {
            objects: encoded,
            consistency_level: consistency_level.map(consistency_level_str).map(str::to_string),
        };

        let started = Instant::now();
        let reply = self
            .transport
            .lock()
            .await
            .batch_objects(request)
            .await?;
        let elapsed = started.elapsed();

        let mut per_item_errors = BTreeMap::new();
        for result in reply.results {
            if let Some(message) = result.error {
                let index = usize::try_from(result.index).unwrap_or(usize::MAX);
                per_item_errors.entry(index).or_insert_with(Vec::new).push(message);
            }
        }
        Ok(ObjectFlushOutcome {
            per_item_errors,
            elapsed,
        })
    }
}

/// Drives the REST control plane's `POST /v1/batch/references` call.
pub struct RestReferenceSubmitter {
    transport: HttpTransport,
}

impl RestReferenceSubmitter {
    /// Wrap an HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[derive(serde::Serialize)]
struct WireBatchReferencePayload {
    from: String,
    to: String,
    tenant: Option<String>,
}

#[derive(Deserialize)]
struct WireBatchReferenceResult {
    result: Option<WireBatchReferenceResultBody>,
}

#[derive(Deserialize)]
struct WireBatchReferenceResultBody {
    errors: Option<WireBatchReferenceErrors>,
}

#[derive(Deserialize)]
struct WireBatchReferenceErrors {
    error: Vec<WireBatchReferenceError>,
}

#[derive(Deserialize)]
struct WireBatchReferenceError {
    message: String,
}

fn encode_reference(reference: &BatchReference) -> Result<WireBatchReferencePayload, Error> {
    let from = format!(
        "weaviate://localhost/{}/{}/{}",
        reference.collection, reference.from_uuid, reference.from_property
    );
    let beacons = reference.to.to_beacons();
    let beacon = beacons
        .first()
        .ok_or_else(|| Error::InvalidInput("reference batch item has no target".to_string()))?;
    Ok(WireBatchReferencePayload {
        from,
        to: beacon.to_uri(),
        tenant: None,
    })
}

#[async_trait::async_trait]
impl ReferenceBatchSubmitter for RestReferenceSubmitter {
    async fn submit_references(
        &self,
        references: &[BatchReference],
        consistency_level: Option<ConsistencyLevel>,
    ) -> Result<ReferenceFlushOutcome, Error> {
        let payload = references
            .iter()
            .map(encode_reference)
            .collect::<Result<Vec<_>, _>>()?;

        let mut params = BTreeMap::new();
        if let Some(level) = consistency_level {
            params.insert("consistency_level".to_string(), consistency_level_str(level).to_string());
        }

        let started = Instant::now();
        let body = serde_json::to_value(&payload)
            .map_err(|e| Error::InvalidInput(format!("failed to encode reference batch: {e}")))?;
        let response = self
            .transport
            .send(
                reqwest::Method::POST,
                "/batch/references",
                Some(&body),
                &params,
                &[],
                &[200],
                "batch_references",
            )
            .await?;
        let elapsed = started.elapsed();

        let results: Vec<WireBatchReferenceResult> = response.json()?;
        let mut per_item_errors = BTreeMap::new();
        for (index, result) in results.into_iter().enumerate() {
            if let Some(errors) = result.result.and_then(|r| r.errors) {
                let messages = errors.error.into_iter().map(|e| e.message).collect();
                per_item_errors.insert(index, messages);
            }
        }
        Ok(ReferenceFlushOutcome {
            per_item_errors,
            elapsed,
        })
    }
}

#[derive(Deserialize)]
struct NodesStatusResponse {
    nodes: Vec<NodeStatusEntry>,
}

#[derive(Deserialize)]
struct NodeStatusEntry {
    #[serde(rename = "batchStats")]
    batch_stats: Option<BatchStats>,
}

#[derive(Deserialize)]
struct BatchStats {
    #[serde(rename = "ratePerSecond")]
    rate_per_second: Option<f64>,
    #[serde(rename = "queueLength")]
    queue_length: Option<u64>,
}

/// Reads node ingestion stats from `GET /v1/nodes`, the first node in the
/// response (§4.8 "Dynamic size controller").
pub struct RestNodeStatsSource {
    transport: HttpTransport,
}

impl RestNodeStatsSource {
    /// Wrap an HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl NodeStatsSource for RestNodeStatsSource {
    async fn node_stats(&self) -> Result<NodeStatsReading, Error> {
        let response = self
            .transport
            .get("/nodes", &BTreeMap::new(), &[], &[200], "node_stats")
            .await?;
        let parsed: NodesStatusResponse = response.json()?;
        let stats = parsed.nodes.first().and_then(|node| node.batch_stats.as_ref());
        match stats.and_then(|s| s.rate_per_second) {
            Some(rate) => Ok(NodeStatsReading::Full(wv_batch::NodeStats {
                rate_per_second: rate,
                queue_length: stats.and_then(|s| s.queue_length).unwrap_or(0),
            })),
            None => Ok(NodeStatsReading::MissingRate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_core::object::{Object, PropertyValue};

    #[test]
    fn encode_object_requires_assigned_uuid() {
        let item = BatchObject {
            index: 0,
            object: Object::new(),
            collection: "Article".into(),
        };
        let err = encode_object(&item).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn encode_object_carries_flat_vector() {
        let item = BatchObject {
            index: 0,
            object: Object::new()
                .with_uuid(uuid::Uuid::new_v4())
                .with_property("title", PropertyValue::Text("hi".into())),
            collection: "Article".into(),
        };
        let encoded = encode_object(&item).unwrap();
        assert_eq!(encoded.collection, "Article");
        assert!(encoded.vector_bytes.is_empty());
        assert!(encoded.vectors.is_empty());
    }
}
