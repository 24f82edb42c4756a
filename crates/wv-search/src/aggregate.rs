// SPDX-License-Identifier: MIT OR Apache-2.0
//! Aggregate request/response, soft-gated between the legacy GraphQL REST
//! path (pre-1.29) and the RPC `Aggregate` service (1.29+) (§4.3, §6,
//! scenario F).
//!
//! Both transports are driven by the same [`AggregateRequest`] and decode
//! into the same [`AggregateResponse`], so a caller never has to know
//! which wire format actually carried a given call — only
//! [`wv_capability::CapabilityGate::aggregate_transport`] picks that, and
//! it picks it once, before any I/O.

use serde_json::Value;
use std::collections::BTreeMap;
use wv_core::filter::Filter;
use wv_error::Error;
use wv_transport::rpc::weaviate;

/// An aggregation over a collection: an optional filter, an optional
/// group-by path, and an optional cap on how many objects are scanned.
#[derive(Clone, Debug, Default)]
pub struct AggregateRequest {
    /// Target collection name.
    pub collection: String,
    /// Tenant, for multi-tenant collections.
    pub tenant: Option<String>,
    /// Filter tree restricting the aggregated objects.
    pub filters: Option<Filter>,
    /// Property path(s) to group by. Empty means "aggregate the whole
    /// collection" (scenario F: `over_all`).
    pub group_by: Vec<String>,
    /// Maximum number of objects to scan before aggregating.
    pub object_limit: Option<i32>,
}

impl AggregateRequest {
    /// An unfiltered, ungrouped aggregation over the entire collection
    /// (scenario F).
    #[must_use]
    pub fn over_all(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Capability-free structural validation.
    pub fn validate(&self) -> Result<(), Error> {
        if self.collection.trim().is_empty() {
            return Err(Error::InvalidInput(
                "aggregate collection must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Encode this request as the RPC `AggregateRequest` message.
    #[must_use]
    pub fn to_rpc(&self) -> weaviate::AggregateRequest {
        weaviate::AggregateRequest {
            collection: self.collection.clone(),
            tenant: self.tenant.clone(),
            filters: self.filters.as_ref().map(wv_filter::rpc::encode),
            group_by: self.group_by.clone(),
            object_limit: self.object_limit,
        }
    }

    /// Encode this request as a GraphQL query body for the legacy
    /// `POST /v1/graphql` aggregate path.
    #[must_use]
    pub fn to_graphql(&self) -> String {
        let mut args = Vec::new();
        if let Some(tenant) = &self.tenant {
            args.push(format!("tenant: \"{tenant}\""));
        }
        if let Some(filter) = &self.filters {
            let where_json = wv_filter::rest::encode(filter);
            args.push(format!("where: {}", graphql_literal(&where_json)));
        }
        if let Some(limit) = self.object_limit {
            args.push(format!("objectLimit: {limit}"));
        }
        let args = if args.is_empty() {
            String::new()
        } else {
            format!("({})", args.join(", "))
        };

        let group_by_field = if self.group_by.is_empty() {
            String::new()
        } else {
            let path = self
                .group_by
                .iter()
                .map(|p| format!("\"{p}\""))
                .collect::<Vec<_>>()
                .join(", ");
            format!("groupedBy(path: [{path}]) {{ path value }}\n")
        };

        format!(
            "{{ Aggregate {{ {collection}{args} {{ meta {{ count }} {group_by_field} }} }} }}",
            collection = self.collection,
        )
    }
}

/// A single aggregation result, one per group (or the sole entry, for an
/// ungrouped aggregation).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateGroup {
    /// The group-by value(s) that produced this group, empty for an
    /// ungrouped aggregation.
    pub grouped_by: BTreeMap<String, Value>,
    /// Total number of objects aggregated into this group.
    pub total_count: Option<i64>,
    /// Per-property aggregation results, opaque JSON (the client does not
    /// interpret aggregation statistic internals per the data-model
    /// non-goals — only round-trips them).
    pub properties: serde_json::Map<String, Value>,
}

/// The decoded result of an aggregate call, transport-independent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateResponse {
    /// One entry per group; a single entry with an empty `grouped_by` for
    /// an ungrouped aggregation.
    pub groups: Vec<AggregateGroup>,
}

impl AggregateResponse {
    /// The total object count, for an ungrouped aggregation (the common
    /// `over_all` case). `None` if the response is empty or grouped into
    /// more than one group.
    #[must_use]
    pub fn total_count(&self) -> Option<i64> {
        match self.groups.as_slice() {
            [group] => group.total_count,
            _ => None,
        }
    }
}

/// Decode an [`weaviate::AggregateReply`]'s JSON-serialized `result` bytes
/// (RPC path, §6: `Aggregate(AggregateRequest) → AggregateReply`).
pub fn decode_rpc_reply(reply: &weaviate::AggregateReply) -> Result<AggregateResponse, Error> {
    let value: Value = serde_json::from_slice(&reply.result)
        .map_err(|e| Error::InvalidInput(format!("failed to parse aggregate reply: {e}")))?;
    decode_value(&value)
}

/// Decode the `POST /v1/graphql` response body for an `Aggregate { ... }`
/// query (legacy REST path, pre-1.29).
pub fn decode_graphql_response(collection: &str, body: &str) -> Result<AggregateResponse, Error> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::InvalidInput(format!("failed to parse graphql response: {e}")))?;

    if let Some(errors) = value.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            return Err(Error::Query(messages));
        }
    }

    let node = value
        .pointer(&format!("/data/Aggregate/{collection}"))
        .cloned()
        .unwrap_or(Value::Null);
    decode_value(&node)
}

fn decode_value(node: &Value) -> Result<AggregateResponse, Error> {
    match node {
        Value::Array(entries) => {
            let groups = entries.iter().map(decode_group).collect::<Result<_, _>>()?;
            Ok(AggregateResponse { groups })
        }
        Value::Null => Ok(AggregateResponse { groups: Vec::new() }),
        other => Ok(AggregateResponse {
            groups: vec![decode_group(other)?],
        }),
    }
}

fn decode_group(node: &Value) -> Result<AggregateGroup, Error> {
    let total_count = node
        .pointer("/meta/count")
        .or_else(|| node.get("total_count"))
        .and_then(Value::as_i64);

    let grouped_by = node
        .get("groupedBy")
        .or_else(|| node.get("grouped_by"))
        .and_then(Value::as_object)
        .map(|map| map.clone().into_iter().collect())
        .unwrap_or_default();

    let mut properties = match node.get("properties") {
        Some(Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };

    if properties.is_empty() {
        if let Value::Object(map) = node {
            for (key, value) in map {
                if matches!(key.as_str(), "meta" | "groupedBy" | "grouped_by" | "total_count") {
                    continue;
                }
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(AggregateGroup {
        grouped_by,
        total_count,
        properties,
    })
}

/// Render a `where`-filter JSON value as a GraphQL argument literal: bare
/// keys, double-quoted strings preserved, matching the shape the legacy
/// GraphQL endpoint expects for its `where` argument.
fn graphql_literal(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let fields = map
                .iter()
                .map(|(key, value)| format!("{key}: {}", graphql_literal(value)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{fields}}}")
        }
        Value::Array(items) => {
            let items = items.iter().map(graphql_literal).collect::<Vec<_>>().join(", ");
            format!("[{items}]")
        }
        Value::String(text) => format!("{text:?}"),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_core::filter::{FilterValue, Operator};
    use wv_core::object::PropertyValue;

    #[test]
    fn over_all_has_no_group_by_or_filter() {
        let request = AggregateRequest::over_all("Article");
        assert!(request.validate().is_ok());
        assert!(request.group_by.is_empty());
        assert!(request.filters.is_none());
    }

    #[test]
    fn rejects_empty_collection() {
        let request = AggregateRequest::over_all("");
        assert!(request.validate().is_err());
    }

    #[test]
    fn to_graphql_embeds_where_and_group_by() {
        let mut request = AggregateRequest::over_all("Article");
        request.filters = Some(Filter::property(
            "name",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Text("hello".into())),
        ));
        request.group_by = vec!["category".into()];
        let query = request.to_graphql();
        assert!(query.contains("Aggregate"));
        assert!(query.contains("where:"));
        assert!(query.contains("groupedBy"));
    }

    #[test]
    fn decodes_rpc_reply_total_count() {
        let reply = weaviate::AggregateReply {
            result: serde_json::to_vec(&serde_json::json!({
                "total_count": 42,
                "properties": {"name": {"count": 42}},
            }))
            .unwrap(),
        };
        let response = decode_rpc_reply(&reply).unwrap();
        assert_eq!(response.total_count(), Some(42));
        assert_eq!(response.groups.len(), 1);
    }

    #[test]
    fn decodes_graphql_response_over_all() {
        let body = serde_json::json!({
            "data": {
                "Aggregate": {
                    "Article": [{
                        "meta": {"count": 7},
                    }],
                },
            },
        })
        .to_string();
        let response = decode_graphql_response("Article", &body).unwrap();
        assert_eq!(response.total_count(), Some(7));
    }

    #[test]
    fn decodes_graphql_grouped_response() {
        let body = serde_json::json!({
            "data": {
                "Aggregate": {
                    "Article": [
                        {"groupedBy": {"path": ["category"], "value": "news"}, "meta": {"count": 3}},
                        {"groupedBy": {"path": ["category"], "value": "sports"}, "meta": {"count": 5}},
                    ],
                },
            },
        })
        .to_string();
        let response = decode_graphql_response("Article", &body).unwrap();
        assert_eq!(response.groups.len(), 2);
        assert_eq!(response.groups[0].total_count, Some(3));
        assert_eq!(response.groups[1].total_count, Some(5));
    }

    #[test]
    fn propagates_graphql_error_envelope() {
        let body = serde_json::json!({
            "errors": [{"message": "unknown collection"}],
        })
        .to_string();
        let err = decode_graphql_response("Missing", &body).unwrap_err();
        assert!(matches!(err, Error::Query(messages) if messages == vec!["unknown collection".to_string()]));
    }
}
