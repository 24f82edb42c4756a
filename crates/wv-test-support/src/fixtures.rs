// SPDX-License-Identifier: MIT OR Apache-2.0
//! Small data-model fixtures reused across unit and integration tests, so
//! every crate doesn't hand-roll the same "one text property, one object"
//! scaffolding.

use std::collections::BTreeMap;
use uuid::Uuid;
use wv_core::{Collection, CollectionConfig, DataType, Object, Property, PropertyValue, ScalarType};

/// A `Test` collection with a single filterable/searchable `name: text`
/// property and no vectorizer configured — the shape used by spec.md §8
/// scenario A ("Create→insert→get").
#[must_use]
pub fn test_collection_config() -> CollectionConfig {
    CollectionConfig {
        properties: vec![Property {
            name: "name".to_string(),
            data_type: DataType::Scalar(ScalarType::Text),
            index_filterable: Some(true),
            index_searchable: Some(true),
            tokenization: None,
            description: None,
            vectorizer_config: None,
        }],
        ..CollectionConfig::default()
    }
}

/// A handle for the `Test` collection carrying [`test_collection_config`].
#[must_use]
pub fn test_collection() -> Collection {
    Collection {
        name: "Test".to_string(),
        config: Some(test_collection_config()),
    }
}

/// An object with a single `name` text property, optionally with an
/// explicit UUID.
#[must_use]
pub fn named_object(name: &str, uuid: Option<Uuid>) -> Object {
    let mut object = Object::new().with_property("name", PropertyValue::Text(name.to_string()));
    if let Some(uuid) = uuid {
        object = object.with_uuid(uuid);
    }
    object
}

/// `n` named objects, `{name: "obj-<i>"}` for `i` in `0..n`.
#[must_use]
pub fn named_objects(n: usize) -> Vec<Object> {
    (0..n).map(|i| named_object(&format!("obj-{i}"), None)).collect()
}

/// A flat property map with a single text entry, for call sites that need
/// a bare `BTreeMap` rather than a full [`Object`].
#[must_use]
pub fn property_map(name: &str, value: &str) -> BTreeMap<String, PropertyValue> {
    let mut map = BTreeMap::new();
    map.insert(name.to_string(), PropertyValue::Text(value.to_string()));
    map
}
