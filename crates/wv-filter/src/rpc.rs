// SPDX-License-Identifier: MIT OR Apache-2.0
//! Filter-AST → RPC `Filters` message encoder (§4.5).

use chrono::SecondsFormat;
use wv_core::filter::{Filter, FilterTarget, FilterValue, GeoRange, Operator, ReferenceTarget};
use wv_core::object::PropertyValue;
use wv_transport::rpc::weaviate::{
    filters::Target, FilterOperator, FilterReferenceMultiTarget, FilterReferenceSingleTarget,
    Filters, GeoCoordinatesFilter,
};

/// Encode a [`Filter`] tree as the RPC `Filters` message.
#[must_use]
pub fn encode(filter: &Filter) -> Filters {
    match filter {
        Filter::And(children) => combinator(FilterOperator::OperatorAnd, children),
        Filter::Or(children) => combinator(FilterOperator::OperatorOr, children),
        Filter::Value {
            target,
            operator,
            value,
        } => leaf(target, *operator, value),
    }
}

fn combinator(operator: FilterOperator, children: &[Filter]) -> Filters {
    Filters {
        operator: operator as i32,
        filters: children.iter().map(encode).collect(),
        on: Vec::new(),
        target: None,
        value_text: None,
        value_text_array: Vec::new(),
        value_int: None,
        value_int_array: Vec::new(),
        value_number: None,
        value_number_array: Vec::new(),
        value_boolean: None,
        value_boolean_array: Vec::new(),
        value_geo: None,
    }
}

fn leaf(target: &FilterTarget, operator: Operator, value: &FilterValue) -> Filters {
    let (on, rpc_target) = encode_target(target);
    let mut message = Filters {
        operator: encode_operator(operator) as i32,
        filters: Vec::new(),
        on,
        target: rpc_target,
        value_text: None,
        value_text_array: Vec::new(),
        value_int: None,
        value_int_array: Vec::new(),
        value_number: None,
        value_number_array: Vec::new(),
        value_boolean: None,
        value_boolean_array: Vec::new(),
        value_geo: None,
    };
    apply_value(&mut message, value);
    message
}

fn encode_operator(operator: Operator) -> FilterOperator {
    match operator {
        Operator::Equal => FilterOperator::OperatorEqual,
        Operator::NotEqual => FilterOperator::OperatorNotEqual,
        Operator::LessThan => FilterOperator::OperatorLessThan,
        Operator::LessThanEqual => FilterOperator::OperatorLessThanEqual,
        Operator::GreaterThan => FilterOperator::OperatorGreaterThan,
        Operator::GreaterThanEqual => FilterOperator::OperatorGreaterThanEqual,
        Operator::Like => FilterOperator::OperatorLike,
        Operator::IsNull => FilterOperator::OperatorIsNull,
        Operator::ContainsAny => FilterOperator::OperatorContainsAny,
        Operator::ContainsAll => FilterOperator::OperatorContainsAll,
        Operator::WithinGeoRange => FilterOperator::OperatorWithinGeoRange,
    }
}

/// Flatten a (possibly reference-traversing) target into the RPC `on` path
/// plus, for the outermost reference hop, the `target` oneof that
/// disambiguates a single- vs. multi-target reference property.
fn encode_target(target: &FilterTarget) -> (Vec<String>, Option<Target>) {
    match target {
        FilterTarget::Property(name) => (vec![name.clone()], None),
        FilterTarget::Reference(ReferenceTarget {
            link,
            target_collection,
            inner,
        }) => {
            let mut path = vec![link.clone()];
            let (inner_path, _) = encode_target(inner);
            path.extend(inner_path);
            let rpc_target = Some(match target_collection {
                Some(collection) => Target::MultiTarget(FilterReferenceMultiTarget {
                    on: link.clone(),
                    target_collection: collection.clone(),
                }),
                None => Target::SingleTarget(FilterReferenceSingleTarget { on: link.clone() }),
            });
            (path, rpc_target)
        }
    }
}

fn apply_value(message: &mut Filters, value: &FilterValue) {
    match value {
        FilterValue::None => {}
        FilterValue::Geo(GeoRange {
            latitude,
            longitude,
            distance_meters,
        }) => {
            message.value_geo = Some(GeoCoordinatesFilter {
                latitude: *latitude,
                longitude: *longitude,
                distance: *distance_meters,
            });
        }
        FilterValue::Scalar(scalar) => apply_scalar(message, scalar),
        FilterValue::List(values) => apply_list(message, values),
    }
}

fn apply_scalar(message: &mut Filters, value: &PropertyValue) {
    match value {
        PropertyValue::Text(text) => message.value_text = Some(text.clone()),
        PropertyValue::Int(n) => message.value_int = Some(*n),
        PropertyValue::Number(n) => message.value_number = Some(*n),
        PropertyValue::Bool(b) => message.value_boolean = Some(*b),
        PropertyValue::Date(date) => {
            message.value_text = Some(date.to_rfc3339_opts(SecondsFormat::Nanos, true));
        }
        PropertyValue::Uuid(uuid) => message.value_text = Some(uuid.to_string()),
        PropertyValue::Blob(base64) => message.value_text = Some(base64.clone()),
        PropertyValue::Geo { .. } | PropertyValue::Phone { .. } => {
            message.value_text = Some(scalar_to_json_string(value));
        }
        PropertyValue::Array(items) => apply_list(message, items),
        PropertyValue::Nested(_) | PropertyValue::Null => {}
    }
}

fn apply_list(message: &mut Filters, values: &[PropertyValue]) {
    if values.is_empty() {
        return;
    }
    match &values[0] {
        PropertyValue::Int(_) => {
            message.value_int_array = values
                .iter()
                .filter_map(|v| match v {
                    PropertyValue::Int(n) => Some(*n),
                    _ => None,
                })
                .collect();
        }
        PropertyValue::Number(_) => {
            message.value_number_array = values
                .iter()
                .filter_map(|v| match v {
                    PropertyValue::Number(n) => Some(*n),
                    _ => None,
                })
                .collect();
        }
        PropertyValue::Bool(_) => {
            message.value_boolean_array = values
                .iter()
                .filter_map(|v| match v {
                    PropertyValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
        }
        _ => {
            message.value_text_array = values.iter().map(scalar_to_text).collect();
        }
    }
}

fn scalar_to_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Text(text) => text.clone(),
        PropertyValue::Uuid(uuid) => uuid.to_string(),
        PropertyValue::Date(date) => date.to_rfc3339_opts(SecondsFormat::Nanos, true),
        PropertyValue::Blob(base64) => base64.clone(),
        other => scalar_to_json_string(other),
    }
}

fn scalar_to_json_string(value: &PropertyValue) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_core::filter::FilterValue;

    #[test]
    fn encodes_plain_equality_leaf() {
        let filter = Filter::property(
            "title",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Text("Foo".into())),
        );
        let encoded = encode(&filter);
        assert_eq!(encoded.on, vec!["title".to_string()]);
        assert_eq!(encoded.value_text.as_deref(), Some("Foo"));
        assert_eq!(encoded.operator, FilterOperator::OperatorEqual as i32);
    }

    #[test]
    fn encodes_and_combinator_recursively() {
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
        assert_eq!(encoded.operator, FilterOperator::OperatorAnd as i32);
        assert_eq!(encoded.filters.len(), 2);
    }

    #[test]
    fn encodes_single_target_reference_traversal() {
        let filter = Filter::Value {
            target: FilterTarget::Reference(ReferenceTarget {
                link: "hasAuthor".into(),
                target_collection: None,
                inner: Box::new(FilterTarget::Property("name".into())),
            }),
            operator: Operator::Equal,
            value: FilterValue::Scalar(PropertyValue::Text("Jane".into())),
        };
        let encoded = encode(&filter);
        assert_eq!(encoded.on, vec!["hasAuthor".to_string(), "name".to_string()]);
        assert!(matches!(encoded.target, Some(Target::SingleTarget(_))));
    }

    #[test]
    fn encodes_multi_target_reference_traversal() {
        let filter = Filter::Value {
            target: FilterTarget::Reference(ReferenceTarget {
                link: "hasAuthor".into(),
                target_collection: Some("Author".into()),
                inner: Box::new(FilterTarget::Property("name".into())),
            }),
            operator: Operator::Equal,
            value: FilterValue::Scalar(PropertyValue::Text("Jane".into())),
        };
        let encoded = encode(&filter);
        match encoded.target {
            Some(Target::MultiTarget(multi)) => assert_eq!(multi.target_collection, "Author"),
            _ => panic!("expected multi-target"),
        }
    }

    #[test]
    fn encodes_int_array_for_contains_any() {
        let filter = Filter::property(
            "rating",
            Operator::ContainsAny,
            FilterValue::List(vec![PropertyValue::Int(1), PropertyValue::Int(2)]),
        );
        let encoded = encode(&filter);
        assert_eq!(encoded.value_int_array, vec![1, 2]);
    }
}
