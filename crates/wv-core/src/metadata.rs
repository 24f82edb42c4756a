// SPDX-License-Identifier: MIT OR Apache-2.0
//! `MetadataReturn` — every field independently optional (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-object metadata returned alongside search/fetch results. `None`
/// means "not returned by the server or not requested" — never "absent on
/// the object".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataReturn {
    /// Object UUID, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    /// The object's vector(s), when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<crate::object::VectorInput>,
    /// Creation timestamp, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time_unix: Option<DateTime<Utc>>,
    /// Last-update timestamp, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time_unix: Option<DateTime<Utc>>,
    /// Vector distance to the query, for vector/hybrid searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    /// Certainty score derived from distance, for vector searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certainty: Option<f32>,
    /// BM25/hybrid relevance score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    /// Human-readable score explanation, when `explain_score` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain_score: Option<String>,
    /// Replica consistency flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_consistent: Option<bool>,
    /// Per-object generative-search output, when generative augmentation
    /// was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generative: Option<String>,
}

impl MetadataReturn {
    /// An empty `MetadataReturn` with every field `None`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}
