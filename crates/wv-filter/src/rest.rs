// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filter-AST → legacy REST/GraphQL JSON encoder (§4.5).
//!
//! Same tree as the RPC encoder, emitted as `{ operator, path, valueX }`.
//! Reference traversal is rejected on servers below the capability
//! cut-off — callers check [`reject_unsupported_reference_traversal`]
//! before calling [`encode`].

use chrono::SecondsFormat;
use serde_json::{json, Value};
use wv_capability::{CapabilityGate, FILTER_REFERENCE_TRAVERSAL};
use wv_core::filter::{Filter, FilterTarget, FilterValue, GeoRange, Operator, ReferenceTarget};
use wv_core::object::PropertyValue;
use wv_error::Error;

/// Reject filters that traverse a reference property when the connected
/// server predates reference-traversal support (§4.5: "rejected with an
/// input error").
pub fn reject_unsupported_reference_traversal(
    filter: &Filter,
    gate: &CapabilityGate,
) -> Result<(), Error> {
    if filter.uses_reference_traversal() {
        gate.require(FILTER_REFERENCE_TRAVERSAL)?;
    }
    Ok(())
}

/// Encode a [`Filter`] tree as the legacy REST/GraphQL `where` JSON shape.
#[must_use]
pub fn encode(filter: &Filter) -> Value {
    match filter {
        Filter::And(children) => combinator("And", children),
        Filter::Or(children) => combinator("Or", children),
        Filter::Value {
            target,
            operator,
            value,
        } => leaf(target, *operator, value),
    }
}

fn combinator(operator: &str, children: &[Filter]) -> Value {
    json!({
        "operator": operator,
        "operands": children.iter().map(encode).collect::<Vec<_>>(),
    })
}

fn leaf(target: &FilterTarget, operator: Operator, value: &FilterValue) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("operator".to_string(), json!(operator_name(operator)));
    object.insert("path".to_string(), json!(encode_path(target)));
    for (key, val) in value_fields(value) {
        object.insert(key, val);
    }
    Value::Object(object)
}

fn operator_name(operator: Operator) -> &'static str {
    match operator {
        Operator::Equal => "Equal",
        Operator::NotEqual => "NotEqual",
        Operator::LessThan => "LessThan",
        Operator::LessThanEqual => "LessThanEqual",
        Operator::GreaterThan => "GreaterThan",
        Operator::GreaterThanEqual => "GreaterThanEqual",
        Operator::Like => "Like",
        Operator::IsNull => "IsNull",
        Operator::ContainsAny => "ContainsAny",
        Operator::ContainsAll => "ContainsAll",
        Operator::WithinGeoRange => "WithinGeoRange",
    }
}

fn encode_path(target: &FilterTarget) -> Vec<String> {
    match target {
        FilterTarget::Property(name) => vec![name.clone()],
        FilterTarget::Reference(ReferenceTarget { link, inner, .. }) => {
            let mut path = vec![link.clone()];
            path.extend(encode_path(inner));
            path
        }
    }
}

fn value_fields(value: &FilterValue) -> Vec<(String, Value)> {
    match value {
        FilterValue::None => Vec::new(),
        FilterValue::Geo(GeoRange {
            latitude,
            longitude,
            distance_meters,
        }) => vec![(
            "valueGeoRange".to_string(),
            json!({
                "geoCoordinates": { "latitude": latitude, "longitude": longitude },
                "distance": { "max": distance_meters },
            }),
        )],
        FilterValue::Scalar(scalar) => vec![scalar_field(scalar)],
        FilterValue::List(values) => vec![array_field(values)],
    }
}

fn scalar_field(value: &PropertyValue) -> (String, Value) {
    match value {
        PropertyValue::Text(text) => ("valueText".to_string(), json!(text)),
        PropertyValue::Int(n) => ("valueInt".to_string(), json!(n)),
        PropertyValue::Number(n) => ("valueNumber".to_string(), json!(n)),
        PropertyValue::Bool(b) => ("valueBoolean".to_string(), json!(b)),
        PropertyValue::Date(date) => (
            "valueDate".to_string(),
            json!(date.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        ),
        PropertyValue::Uuid(uuid) => ("valueText".to_string(), json!(uuid.to_string())),
        PropertyValue::Blob(base64) => ("valueText".to_string(), json!(base64)),
        PropertyValue::Geo { latitude, longitude } => (
            "valueGeoCoordinates".to_string(),
            json!({ "latitude": latitude, "longitude": longitude }),
        ),
        PropertyValue::Phone { country_code, number } => (
            "valuePhoneNumber".to_string(),
            json!({ "countryCode": country_code, "number": number }),
        ),
        PropertyValue::Array(items) => array_field(items),
        PropertyValue::Nested(_) | PropertyValue::Null => ("valueText".to_string(), Value::Null),
    }
}

fn array_field(values: &[PropertyValue]) -> (String, Value) {
    if values.is_empty() {
        return ("valueTextArray".to_string(), json!([]));
    }
    match &values[0] {
        PropertyValue::Int(_) => (
            "valueIntArray".to_string(),
            json!(values
                .iter()
                .filter_map(|v| match v {
                    PropertyValue::Int(n) => Some(*n),
                    _ => None,
                })
                .collect::<Vec<_>>()),
        ),
        PropertyValue::Number(_) => (
            "valueNumberArray".to_string(),
            json!(values
                .iter()
                .filter_map(|v| match v {
                    PropertyValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect::<Vec<_>>()),
        ),
        PropertyValue::Bool(_) => (
            "valueBooleanArray".to_string(),
            json!(values
                .iter()
                .filter_map(|v| match v {
                    PropertyValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>()),
        ),
        _ => (
            "valueTextArray".to_string(),
            json!(values
                .iter()
                .map(|v| match v {
                    PropertyValue::Text(text) => text.clone(),
                    PropertyValue::Uuid(uuid) => uuid.to_string(),
                    other => serde_json::to_string(other).unwrap_or_default(),
                })
                .collect::<Vec<_>>()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_capability::ServerVersion;

    #[test]
    fn encodes_plain_equality_leaf() {
        let filter = Filter::property(
            "title",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Text("Foo".into())),
        );
        let encoded = encode(&filter);
        assert_eq!(encoded["operator"], "Equal");
        assert_eq!(encoded["path"], json!(["title"]));
        assert_eq!(encoded["valueText"], "Foo");
    }

    #[test]
    fn encodes_and_combinator() {
        let a = Filter::property(
            "a",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Int(1)),
        );
        let b = Filter::property(
            "b",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Int(2)),
        );
        let encoded = encode(&Filter::And(vec![a, b]));
        assert_eq!(encoded["operator"], "And");
        assert_eq!(encoded["operands"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn reference_traversal_rejected_on_old_server() {
        let filter = Filter::Value {
            target: FilterTarget::Reference(ReferenceTarget {
                link: "hasAuthor".into(),
                target_collection: None,
                inner: Box::new(FilterTarget::Property("name".into())),
            }),
            operator: Operator::Equal,
            value: FilterValue::Scalar(PropertyValue::Text("Jane".into())),
        };
        let gate = CapabilityGate::new(ServerVersion::new(1, 20, 0));
        assert!(reject_unsupported_reference_traversal(&filter, &gate).is_err());

        let newer_gate = CapabilityGate::new(ServerVersion::new(1, 23, 0));
        assert!(reject_unsupported_reference_traversal(&filter, &newer_gate).is_ok());
    }

    #[test]
    fn plain_filters_never_require_the_gate() {
        let filter = Filter::property(
            "name",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Text("x".into())),
        );
        let gate = CapabilityGate::new(ServerVersion::new(1, 0, 0));
        assert!(reject_unsupported_reference_traversal(&filter, &gate).is_ok());
    }
}
