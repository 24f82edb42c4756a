// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Collection` handle and its config snapshot (§3, SPEC_FULL §3
//! supplement for vectorizer/replication/multi-tenancy/generative/reranker
//! config).

use crate::property::Property;
use serde::{Deserialize, Serialize};

/// Replica write/read acknowledgment level, carried per call (§5).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsistencyLevel {
    /// A single replica must acknowledge.
    One,
    /// A quorum of replicas must acknowledge.
    Quorum,
    /// All replicas must acknowledge.
    All,
}

/// Replication settings for a collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Number of replicas to maintain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<u32>,
    /// Whether replica writes are acknowledged asynchronously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_enabled: Option<bool>,
}

/// Multi-tenancy settings for a collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiTenancyConfig {
    /// Whether multi-tenancy is enabled for this collection.
    pub enabled: bool,
    /// Whether tenants are created automatically on first write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_tenant_creation: Option<bool>,
    /// Whether inactive tenants are activated automatically on access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_tenant_activation: Option<bool>,
}

/// A collection's server-confirmed configuration snapshot. The client
/// never mutates this in place — every change is a round trip through
/// `config.update()` followed by a fresh `describe()` (§3).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Property schema.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Opaque vectorizer configuration (collection-level). The client
    /// transports this without interpreting it (Non-goals: no vector
    /// indexing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectorizer_config: Option<serde_json::Value>,
    /// Opaque inverted-index configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverted_index_config: Option<serde_json::Value>,
    /// Replication settings.
    #[serde(default)]
    pub replication_config: ReplicationConfig,
    /// Multi-tenancy settings.
    #[serde(default)]
    pub multi_tenancy_config: MultiTenancyConfig,
    /// Opaque generative-module configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generative_config: Option<serde_json::Value>,
    /// Opaque reranker-module configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reranker_config: Option<serde_json::Value>,
}

/// Capitalize the first letter of a collection name, matching the
/// server's naming convention (§3: "always capitalized first letter").
#[must_use]
pub fn normalize_collection_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// A lightweight, server-owned collection handle (§3: "the client holds a
/// lightweight handle"). Holds a config snapshot fetched at construction
/// or the last `describe()`/`update()` round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Normalized (capitalized) collection name.
    pub name: String,
    /// Last-known config snapshot, if one has been fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CollectionConfig>,
}

impl Collection {
    /// Construct a handle for the given name, normalizing its casing.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: normalize_collection_name(name.as_ref()),
            config: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_first_letter() {
        assert_eq!(normalize_collection_name("article"), "Article");
        assert_eq!(normalize_collection_name("Article"), "Article");
        assert_eq!(normalize_collection_name(""), "");
        assert_eq!(normalize_collection_name("a"), "A");
    }

    #[test]
    fn handle_starts_with_no_config() {
        let collection = Collection::new("article");
        assert_eq!(collection.name, "Article");
        assert!(collection.config.is_none());
    }
}
