// SPDX-License-Identifier: MIT OR Apache-2.0
//! The filter AST — language-neutral, transport-agnostic (§3, §4.5).
//!
//! Encoding this tree onto the wire (RPC `Filters` message or REST JSON)
//! lives in `wv-filter`; this module only defines the tree and the value
//! type a leaf carries.

use crate::object::PropertyValue;
use serde::{Deserialize, Serialize};

/// A comparison operator for a filter leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// SQL-style wildcard text match.
    Like,
    /// Whether the property is (or is not) null.
    IsNull,
    /// True if the property's array value contains any of the given values.
    ContainsAny,
    /// True if the property's array value contains all of the given values.
    ContainsAll,
    /// True if a geo-coordinate property falls within a radius.
    WithinGeoRange,
}

/// What a filter leaf's `target` names: a plain property path, or a
/// reference traversal into a linked collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterTarget {
    /// A plain property name (or dotted path into a nested object).
    Property(String),
    /// A reference-traversal target: follow `link`, then filter `inner` on
    /// the linked object.
    Reference(ReferenceTarget),
}

/// A reference-traversal filter target (`link` names the reference
/// property; `target_collection` disambiguates multi-target references).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTarget {
    /// Name of the reference property to traverse.
    pub link: String,
    /// Target collection to disambiguate a multi-target reference, when
    /// the reference property can point at more than one collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_collection: Option<String>,
    /// The property (or nested reference) to filter on within the linked
    /// object.
    pub inner: Box<FilterTarget>,
}

/// A radius-bounded geo-coordinate for `within_geo_range`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoRange {
    /// Center latitude in degrees.
    pub latitude: f32,
    /// Center longitude in degrees.
    pub longitude: f32,
    /// Radius in meters.
    pub distance_meters: f32,
}

/// A value carried by a filter leaf. Distinct from [`PropertyValue`] in
/// that it additionally allows [`GeoRange`] (a filter-only shape) and
/// excludes [`PropertyValue::Null`]/[`PropertyValue::Nested`] (meaningless
/// in a comparison).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A single scalar/array property value.
    Scalar(PropertyValue),
    /// A homogeneous list of scalar values, for `contains_any`/`contains_all`.
    List(Vec<PropertyValue>),
    /// A geo radius, for `within_geo_range`.
    Geo(GeoRange),
    /// No value — valid only for `is_null`.
    None,
}

/// The filter tree: boolean combinators over leaves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Conjunction of sub-filters.
    And(Vec<Filter>),
    /// Disjunction of sub-filters.
    Or(Vec<Filter>),
    /// A single leaf comparison.
    Value {
        /// What property (or reference traversal) this leaf compares.
        target: FilterTarget,
        /// The comparison operator.
        operator: Operator,
        /// The comparison value.
        value: FilterValue,
    },
}

impl Filter {
    /// Construct a leaf filter over a plain property.
    #[must_use]
    pub fn property(name: impl Into<String>, operator: Operator, value: FilterValue) -> Self {
        Filter::Value {
            target: FilterTarget::Property(name.into()),
            operator,
            value,
        }
    }

    /// Returns `true` if this filter (or any sub-filter) traverses a
    /// reference — used to gate reference traversal against the
    /// capability table (§4.5: rejected on servers below the cut-off).
    #[must_use]
    pub fn uses_reference_traversal(&self) -> bool {
        match self {
            Filter::And(children) | Filter::Or(children) => {
                children.iter().any(Filter::uses_reference_traversal)
            }
            Filter::Value { target, .. } => matches!(target, FilterTarget::Reference(_)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_reference_traversal() {
        let leaf = Filter::Value {
            target: FilterTarget::Reference(ReferenceTarget {
                link: "hasAuthor".into(),
                target_collection: None,
                inner: Box::new(FilterTarget::Property("name".into())),
            }),
            operator: Operator::Equal,
            value: FilterValue::Scalar(PropertyValue::Text("Jane".into())),
        };
        assert!(leaf.uses_reference_traversal());

        let plain = Filter::property(
            "name",
            Operator::Equal,
            FilterValue::Scalar(PropertyValue::Text("Jane".into())),
        );
        assert!(!plain.uses_reference_traversal());

        let combined = Filter::And(vec![plain.clone(), leaf.clone()]);
        assert!(combined.uses_reference_traversal());
    }
}
