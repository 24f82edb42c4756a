// SPDX-License-Identifier: MIT OR Apache-2.0
//! Decoding a `SearchResponse` into typed objects (§4.7).
//!
//! Five steps, run per `SearchResult`: assemble the non-reference
//! property map, recursively decode nested `ref_props` into
//! [`ReferencedObject`]s, build [`MetadataReturn`] from only the fields
//! whose `*_present` sentinel is set, optionally re-decode through a
//! caller-supplied typed hint, and (at the response level) group by
//! `group_by`/`generative` output.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use uuid::Uuid;
use wv_core::datetime::parse_server_datetime;
use wv_core::object::{Object, PropertyValue, Reference, ReferencedObject, VectorInput};
use wv_core::MetadataReturn;
use wv_error::Error;
use wv_transport::rpc::weaviate;

/// Convert a decoded JSON value into the open-record [`PropertyValue`]
/// union (§9 "Dynamic typing of properties").
fn json_to_property_value(value: serde_json::Value) -> PropertyValue {
    match value {
        serde_json::Value::Null => PropertyValue::Null,
        serde_json::Value::Bool(b) => PropertyValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                PropertyValue::Int(i)
            } else {
                PropertyValue::Number(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => PropertyValue::Text(s),
        serde_json::Value::Array(items) => {
            PropertyValue::Array(items.into_iter().map(json_to_property_value).collect())
        }
        serde_json::Value::Object(map) => PropertyValue::Nested(
            map.into_iter()
                .map(|(k, v)| (k, json_to_property_value(v)))
                .collect(),
        ),
    }
}

/// Assemble the non-reference `properties` map from a `ResultProperties`
/// message (§4.7 step 1): the serialized-JSON `non_ref_properties` blob,
/// plus each typed array column, keyed by property name.
fn decode_properties(raw: &weaviate::ResultProperties) -> Result<BTreeMap<String, PropertyValue>, Error> {
    let mut properties = BTreeMap::new();

    if !raw.non_ref_properties.is_empty() {
        let value: serde_json::Value = serde_json::from_slice(&raw.non_ref_properties)
            .map_err(|e| Error::InvalidInput(format!("malformed non_ref_properties: {e}")))?;
        if let serde_json::Value::Object(map) = value {
            for (key, value) in map {
                properties.insert(key, json_to_property_value(value));
            }
        }
    }

    for column in &raw.text_array_properties {
        properties.insert(
            column.prop_name.clone(),
            PropertyValue::Array(column.values.iter().cloned().map(PropertyValue::Text).collect()),
        );
    }
    for column in &raw.int_array_properties {
        properties.insert(
            column.prop_name.clone(),
            PropertyValue::Array(column.values.iter().copied().map(PropertyValue::Int).collect()),
        );
    }
    for column in &raw.number_array_properties {
        properties.insert(
            column.prop_name.clone(),
            PropertyValue::Array(column.values.iter().copied().map(PropertyValue::Number).collect()),
        );
    }
    for column in &raw.boolean_array_properties {
        properties.insert(
            column.prop_name.clone(),
            PropertyValue::Array(column.values.iter().copied().map(PropertyValue::Bool).collect()),
        );
    }

    Ok(properties)
}

/// Recursively decode `ref_props` into `Reference::Resolved` entries
/// (§4.7 step 2, §9 "Back-references in schema": only realized because
/// the search explicitly asked for this traversal).
fn decode_references(
    raw: &[weaviate::RefPropertiesResult],
) -> Result<BTreeMap<String, Reference>, Error> {
    let mut references = BTreeMap::new();
    for entry in raw {
        let objects = entry
            .objects
            .iter()
            .map(decode_referenced_object)
            .collect::<Result<Vec<_>, _>>()?;
        references.insert(entry.prop_name.clone(), Reference::Resolved(objects));
    }
    Ok(references)
}

fn decode_referenced_object(result: &weaviate::SearchResult) -> Result<ReferencedObject, Error> {
    let properties = result
        .properties
        .as_ref()
        .map(decode_properties)
        .transpose()?
        .unwrap_or_default();
    let references = result
        .properties
        .as_ref()
        .map(|p| decode_references(&p.ref_props))
        .transpose()?
        .unwrap_or_default();
    let metadata = result.additional_properties.as_ref().map(decode_metadata).transpose()?;
    let uuid = metadata
        .as_ref()
        .and_then(|m: &MetadataReturn| m.uuid)
        .ok_or_else(|| Error::InvalidInput("referenced object missing uuid metadata".into()))?;
    Ok(ReferencedObject {
        uuid,
        properties,
        references,
        metadata,
    })
}

/// Build [`MetadataReturn`], copying only the fields whose `*_present`
/// sentinel is set (§4.7 step 3).
fn decode_metadata(raw: &weaviate::ResultAdditionalProps) -> Result<MetadataReturn, Error> {
    let mut metadata = MetadataReturn::empty();

    if raw.id_present {
        metadata.uuid = Some(
            Uuid::parse_str(&raw.id)
                .map_err(|e| Error::InvalidInput(format!("malformed result uuid {:?}: {e}", raw.id)))?,
        );
    }
    if raw.vector_present {
        metadata.vector = Some(if raw.vectors.is_empty() {
            VectorInput::Flat(raw.vector_bytes.clone())
        } else {
            VectorInput::Named(
                raw.vectors
                    .iter()
                    .map(|v| (v.name.clone(), v.values.clone()))
                    .collect(),
            )
        });
    }
    if raw.creation_time_unix_present {
        metadata.creation_time_unix = Some(
            parse_server_datetime(&raw.creation_time_unix)
                .map_err(|e| Error::InvalidInput(e.to_string()))?,
        );
    }
    if raw.last_update_time_unix_present {
        metadata.last_update_time_unix = Some(
            parse_server_datetime(&raw.last_update_time_unix)
                .map_err(|e| Error::InvalidInput(e.to_string()))?,
        );
    }
    if raw.distance_present {
        metadata.distance = Some(raw.distance);
    }
    if raw.certainty_present {
        metadata.certainty = Some(raw.certainty);
    }
    if raw.score_present {
        metadata.score = Some(raw.score);
    }
    if raw.explain_score_present {
        metadata.explain_score = Some(raw.explain_score.clone());
    }
    if raw.is_consistent_present {
        metadata.is_consistent = Some(raw.is_consistent);
    }
    if raw.generative_present {
        metadata.generative = Some(raw.generative.clone());
    }

    Ok(metadata)
}

/// Decode a single `SearchResult` into an [`Object`] (no UUID/tenant on
/// decode results — those live in `metadata`/the request, not on the
/// decoded value).
pub fn decode_object(result: &weaviate::SearchResult) -> Result<Object, Error> {
    let properties = result
        .properties
        .as_ref()
        .map(decode_properties)
        .transpose()?
        .unwrap_or_default();
    let references = result
        .properties
        .as_ref()
        .map(|p| decode_references(&p.ref_props))
        .transpose()?
        .unwrap_or_default();
    let metadata = result.additional_properties.as_ref().map(decode_metadata).transpose()?;

    Ok(Object {
        uuid: metadata.as_ref().and_then(|m| m.uuid),
        properties,
        vector: None,
        references,
        metadata,
        tenant: None,
    })
}

/// Re-decode an object's properties through a caller-supplied typed hint
/// (§4.7 step 4, §9 "Generics over properties and references"). UUID and
/// ISO-8601 strings convert to their typed forms via `T`'s own `Deserialize`
/// impl; when no hint is supplied, callers just read `Object::properties`.
pub fn decode_typed<T: DeserializeOwned>(
    properties: &BTreeMap<String, PropertyValue>,
) -> Result<T, Error> {
    let value = serde_json::to_value(properties)
        .map_err(|e| Error::InvalidInput(format!("failed to re-encode properties: {e}")))?;
    serde_json::from_value(value)
        .map_err(|e| Error::InvalidInput(format!("typed property decode failed: {e}")))
}

/// One named group from a `group_by` response (§4.6/§4.7 step 5).
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedGroup {
    /// Group name (the grouped property's value).
    pub name: String,
    /// Minimum vector distance among the group's members.
    pub min_distance: f32,
    /// Maximum vector distance among the group's members.
    pub max_distance: f32,
    /// Total objects placed in this group.
    pub number_of_objects: i32,
    /// The group's member objects.
    pub objects: Vec<Object>,
}

/// Per-object-set generative-search output attached to a decoded response
/// (§4.7 step 6).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerativeResult {
    /// The `grouped_task` result applied once to the whole result set.
    pub grouped: Option<String>,
}

/// A fully decoded `SearchResponse`: flat objects, or groups when
/// `group_by` was requested — never both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedResponse {
    /// Flat decoded objects, when the request had no `group_by` clause.
    pub objects: Vec<Object>,
    /// Named groups, when the request had a `group_by` clause.
    pub groups: BTreeMap<String, DecodedGroup>,
    /// Generative augmentation output, if requested.
    pub generative: GenerativeResult,
    /// Server-side error envelope strings, if the response carried any
    /// (§7 `QueryError`: decoded but carrying an error envelope).
    pub errors: Vec<String>,
}

/// Decode a complete `SearchResponse` (§4.7 steps 5-6).
pub fn decode_response(response: &weaviate::SearchResponse) -> Result<DecodedResponse, Error> {
    let mut decoded = DecodedResponse {
        generative: GenerativeResult {
            grouped: response.generative_grouped_result.clone(),
        },
        errors: response.errors.clone(),
        ..DecodedResponse::default()
    };

    if response.group_by_results.is_empty() {
        for result in &response.results {
            decoded.objects.push(decode_object(result)?);
        }
    } else {
        for group in &response.group_by_results {
            let objects = group
                .objects
                .iter()
                .map(decode_object)
                .collect::<Result<Vec<_>, _>>()?;
            decoded.groups.insert(
                group.name.clone(),
                DecodedGroup {
                    name: group.name.clone(),
                    min_distance: group.min_distance,
                    max_distance: group.max_distance,
                    number_of_objects: group.number_of_objects,
                    objects,
                },
            );
        }
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_transport::rpc::weaviate::{ResultAdditionalProps, ResultProperties, SearchResult};

    fn props_bytes(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn decodes_non_ref_properties_and_typed_arrays() {
        let result = SearchResult {
            properties: Some(ResultProperties {
                non_ref_properties: props_bytes(serde_json::json!({"name": "hello"})),
                text_array_properties: vec![weaviate::TextArrayProperties {
                    prop_name: "tags".into(),
                    values: vec!["a".into(), "b".into()],
                }],
                ..Default::default()
            }),
            additional_properties: None,
        };
        let object = decode_object(&result).unwrap();
        assert_eq!(
            object.properties.get("name"),
            Some(&PropertyValue::Text("hello".into()))
        );
        assert_eq!(
            object.properties.get("tags"),
            Some(&PropertyValue::Array(vec![
                PropertyValue::Text("a".into()),
                PropertyValue::Text("b".into())
            ]))
        );
    }

    #[test]
    fn metadata_only_copies_present_fields() {
        let uuid = Uuid::new_v4();
        let result = SearchResult {
            properties: None,
            additional_properties: Some(ResultAdditionalProps {
                id: uuid.to_string(),
                id_present: true,
                distance: 0.5,
                distance_present: true,
                certainty_present: false,
                ..Default::default()
            }),
        };
        let object = decode_object(&result).unwrap();
        let metadata = object.metadata.unwrap();
        assert_eq!(metadata.uuid, Some(uuid));
        assert_eq!(metadata.distance, Some(0.5));
        assert_eq!(metadata.certainty, None);
    }

    #[test]
    fn group_by_response_groups_and_counts() {
        let response = weaviate::SearchResponse {
            results: Vec::new(),
            group_by_results: vec![weaviate::GroupByResult {
                name: "red".into(),
                min_distance: 0.1,
                max_distance: 0.3,
                number_of_objects: 2,
                objects: vec![
                    SearchResult {
                        properties: None,
                        additional_properties: None,
                    },
                    SearchResult {
                        properties: None,
                        additional_properties: None,
                    },
                ],
            }],
            generative_grouped_result: Some("summary".into()),
            errors: Vec::new(),
        };
        let decoded = decode_response(&response).unwrap();
        assert!(decoded.objects.is_empty());
        let group = decoded.groups.get("red").unwrap();
        assert_eq!(group.number_of_objects, 2);
        assert_eq!(decoded.generative.grouped.as_deref(), Some("summary"));
    }

    #[derive(serde::Deserialize, PartialEq, Debug)]
    struct TypedArticle {
        name: String,
    }

    #[test]
    fn typed_hint_decodes_into_caller_struct() {
        let mut properties = BTreeMap::new();
        properties.insert("name".to_string(), PropertyValue::Text("hello".into()));
        let typed: TypedArticle = decode_typed(&properties).unwrap();
        assert_eq!(typed, TypedArticle { name: "hello".into() });
    }
}
