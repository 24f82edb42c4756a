// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Property` schema entries and their `DataType`.

use serde::{Deserialize, Serialize};

/// The scalar tag of a property's data type, before considering the
/// array/reference wrapping in [`DataType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    /// Free-text string.
    Text,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Number,
    /// Boolean.
    Bool,
    /// RFC-3339 timestamp.
    Date,
    /// UUID.
    Uuid,
    /// Opaque base64-encoded binary blob.
    Blob,
    /// Geographic coordinate (latitude/longitude).
    Geo,
    /// Phone number (country code + number).
    Phone,
}

/// The full data type of a property: a scalar, an array of a scalar, a
/// nested object schema, or a reference to one or more target collections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataType {
    /// A single scalar value.
    Scalar(ScalarType),
    /// An array of the given scalar type.
    Array(ScalarType),
    /// A nested object with its own property schema (`object`/`object[]`).
    Nested {
        /// Whether this is a nested-object array rather than a single object.
        is_array: bool,
        /// The nested property schema.
        properties: Vec<Property>,
    },
    /// A reference to exactly one target collection (single-target).
    ReferenceSingle {
        /// Name of the target collection.
        target_collection: String,
    },
    /// A reference that may point at any of several target collections
    /// (multi-target), disambiguated per-value.
    ReferenceMulti {
        /// Names of the permitted target collections.
        target_collections: Vec<String>,
    },
}

/// A single property definition in a collection's schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name, unique within the collection.
    pub name: String,
    /// The property's data type.
    pub data_type: DataType,
    /// Whether the property is indexed for filtering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_filterable: Option<bool>,
    /// Whether the property is indexed for BM25/keyword search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_searchable: Option<bool>,
    /// Tokenization strategy for text properties (`word`, `field`, `lowercase`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenization: Option<String>,
    /// Human-readable description, used by generative/vectorizer prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Per-property vectorizer configuration, opaque to the client (the
    /// client transports it, never interprets it — see the Non-goals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectorizer_config: Option<serde_json::Value>,
}

impl Property {
    /// Construct a plain scalar property with no indexing overrides.
    #[must_use]
    pub fn new(name: impl Into<String>, scalar: ScalarType) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Scalar(scalar),
            index_filterable: None,
            index_searchable: None,
            tokenization: None,
            description: None,
            vectorizer_config: None,
        }
    }

    /// Construct a single-target reference property.
    #[must_use]
    pub fn reference_single(name: impl Into<String>, target_collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::ReferenceSingle {
                target_collection: target_collection.into(),
            },
            index_filterable: None,
            index_searchable: None,
            tokenization: None,
            description: None,
            vectorizer_config: None,
        }
    }

    /// Construct a multi-target reference property.
    #[must_use]
    pub fn reference_multi<I, S>(name: impl Into<String>, target_collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            data_type: DataType::ReferenceMulti {
                target_collections: target_collections.into_iter().map(Into::into).collect(),
            },
            index_filterable: None,
            index_searchable: None,
            tokenization: None,
            description: None,
            vectorizer_config: None,
        }
    }

    /// Returns `true` if this property's data type is a reference (single
    /// or multi-target).
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(
            self.data_type,
            DataType::ReferenceSingle { .. } | DataType::ReferenceMulti { .. }
        )
    }
}
