// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Object`, the open-record `PropertyValue` union, and `Reference` targets.

use crate::beacon::Beacon;
use crate::metadata::MetadataReturn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A dynamically-typed property value, used whenever the caller has not
/// supplied a typed data-model hint (§4.7 step 4, §9 "Dynamic typing of
/// properties").
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// UTF-8 text.
    Text(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Timestamp.
    Date(DateTime<Utc>),
    /// UUID.
    Uuid(Uuid),
    /// Base64-encoded binary blob.
    Blob(String),
    /// Geographic coordinate.
    Geo {
        /// Latitude in degrees.
        latitude: f32,
        /// Longitude in degrees.
        longitude: f32,
    },
    /// Phone number.
    Phone {
        /// Country code, e.g. `"49"`.
        country_code: Option<String>,
        /// The number as supplied.
        number: String,
    },
    /// A homogeneous array of values.
    Array(Vec<PropertyValue>),
    /// A nested object record (`object`/`object[]` properties).
    Nested(BTreeMap<String, PropertyValue>),
    /// `null`.
    Null,
}

/// A reference property's value: either implicit single-target UUIDs or
/// explicit multi-target UUIDs naming their collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reference {
    /// Implicit single-target reference: a list of target UUIDs, with the
    /// target collection inferred from the schema.
    ToUuids(Vec<Uuid>),
    /// Explicit multi-target reference: UUIDs plus the collection they
    /// target.
    ToMultiTarget {
        /// Target object UUIDs.
        uuids: Vec<Uuid>,
        /// Name of the target collection.
        target_collection: String,
    },
    /// Already-resolved nested objects, as returned by a search that asked
    /// for reference traversal (§4.7 step 2). Never sent by the client —
    /// only produced by result decoding.
    Resolved(Vec<ReferencedObject>),
}

impl Reference {
    /// Convert this reference's targets into wire beacons.
    #[must_use]
    pub fn to_beacons(&self) -> Vec<Beacon> {
        match self {
            Reference::ToUuids(uuids) => {
                uuids.iter().copied().map(Beacon::single_target).collect()
            }
            Reference::ToMultiTarget {
                uuids,
                target_collection,
            } => uuids
                .iter()
                .map(|u| Beacon::multi_target(target_collection.clone(), *u))
                .collect(),
            Reference::Resolved(objects) => objects
                .iter()
                .map(|o| Beacon::single_target(o.uuid))
                .collect(),
        }
    }
}

/// An object reached via reference traversal during a search, carrying its
/// own metadata and potentially further nested references (§9 "Back-
/// references in schema": never eager-loaded beyond what was requested).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferencedObject {
    /// UUID of the referenced object.
    pub uuid: Uuid,
    /// Decoded properties of the referenced object.
    pub properties: BTreeMap<String, PropertyValue>,
    /// References requested on the referenced object, if any.
    #[serde(default)]
    pub references: BTreeMap<String, Reference>,
    /// Metadata attached to the referenced object, if requested.
    #[serde(default)]
    pub metadata: Option<MetadataReturn>,
}

/// A single stored (or about-to-be-stored) object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// Object identity. `None` on insert means the client will generate a
    /// fresh v4 UUID and report it back as the success value (§3).
    pub uuid: Option<Uuid>,
    /// Open record of scalar/array/nested property values.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    /// The object's vector(s): a flat vector, or named vectors keyed by
    /// name (for collections using multiple vector spaces).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorInput>,
    /// Reference properties, keyed by property name.
    #[serde(default)]
    pub references: BTreeMap<String, Reference>,
    /// Metadata populated on decode; always `None` on objects constructed
    /// by the caller for insertion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataReturn>,
    /// Tenant this object belongs to, when the collection is multi-tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

/// A vector payload: either a single flat vector or a map of named vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VectorInput {
    /// A single unnamed vector.
    Flat(Vec<f32>),
    /// Named vectors, keyed by vector name.
    Named(BTreeMap<String, Vec<f32>>),
}

impl Object {
    /// Construct an object with no properties, references, vector, or
    /// explicit UUID (the server/client will mint one on insert).
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: None,
            properties: BTreeMap::new(),
            vector: None,
            references: BTreeMap::new(),
            metadata: None,
            tenant: None,
        }
    }

    /// Set a property value, builder-style.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Set a reference value, builder-style.
    #[must_use]
    pub fn with_reference(mut self, name: impl Into<String>, reference: Reference) -> Self {
        self.references.insert(name.into(), reference);
        self
    }

    /// Set the explicit UUID, builder-style.
    #[must_use]
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// Set the tenant, builder-style.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_to_uuids_becomes_single_target_beacons() {
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();
        let reference = Reference::ToUuids(vec![u1, u2]);
        let beacons = reference.to_beacons();
        assert_eq!(beacons.len(), 2);
        assert!(beacons.iter().all(|b| b.collection.is_none()));
    }

    #[test]
    fn reference_multi_target_carries_collection() {
        let u1 = Uuid::new_v4();
        let reference = Reference::ToMultiTarget {
            uuids: vec![u1],
            target_collection: "Article".into(),
        };
        let beacons = reference.to_beacons();
        assert_eq!(beacons[0].collection.as_deref(), Some("Article"));
    }

    #[test]
    fn builder_methods_compose() {
        let uuid = Uuid::new_v4();
        let obj = Object::new()
            .with_uuid(uuid)
            .with_property("name", PropertyValue::Text("hello".into()))
            .with_tenant("T1");
        assert_eq!(obj.uuid, Some(uuid));
        assert_eq!(
            obj.properties.get("name"),
            Some(&PropertyValue::Text("hello".into()))
        );
        assert_eq!(obj.tenant.as_deref(), Some("T1"));
    }
}
