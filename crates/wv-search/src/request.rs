// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `SearchRequest` builder (§4.6).
//!
//! At most one probe may be set per request; everything else is
//! orthogonal. Validation runs before any I/O, either capability-free
//! ([`SearchRequest::validate`]) or gated against a connected server
//! ([`SearchRequest::validate_against`]).

use std::collections::BTreeMap;
use uuid::Uuid;
use wv_capability::{CapabilityGate, MULTI_TARGET_VECTOR_JOIN, NAMED_VECTORS};
use wv_core::filter::Filter;
use wv_error::Error;
use wv_transport::rpc::weaviate;

/// A vector query value: flat or named (§4.6: named vectors are
/// version-gated).
#[derive(Clone, Debug, PartialEq)]
pub enum VectorQuery {
    /// A single unnamed vector.
    Flat(Vec<f32>),
    /// Named vectors, keyed by vector space name.
    Named(BTreeMap<String, Vec<f32>>),
}

/// `near_vector` probe.
#[derive(Clone, Debug, Default)]
pub struct NearVectorProbe {
    /// The query vector(s).
    pub vector: Option<VectorQuery>,
    /// Minimum certainty threshold.
    pub certainty: Option<f32>,
    /// Maximum distance threshold.
    pub distance: Option<f32>,
}

/// `near_object` probe: search by an existing object's vector.
#[derive(Clone, Copy, Debug)]
pub struct NearObjectProbe {
    /// UUID of the reference object.
    pub id: Uuid,
    /// Minimum certainty threshold.
    pub certainty: Option<f32>,
    /// Maximum distance threshold.
    pub distance: Option<f32>,
}

/// A `move_to`/`move_away` clause steering a `near_text` probe.
#[derive(Clone, Debug, Default)]
pub struct MoveClause {
    /// Strength of the move, in `[0.0, 1.0]`.
    pub force: f32,
    /// Concepts to move toward/away from.
    pub concepts: Vec<String>,
    /// Object UUIDs to move toward/away from.
    pub uuids: Vec<Uuid>,
}

impl MoveClause {
    fn is_empty(&self) -> bool {
        self.concepts.is_empty() && self.uuids.is_empty()
    }
}

/// `near_text` probe.
#[derive(Clone, Debug, Default)]
pub struct NearTextProbe {
    /// Query concepts.
    pub query: Vec<String>,
    /// Minimum certainty threshold.
    pub certainty: Option<f32>,
    /// Maximum distance threshold.
    pub distance: Option<f32>,
    /// Steer the query vector toward these concepts/objects.
    pub move_to: Option<MoveClause>,
    /// Steer the query vector away from these concepts/objects.
    pub move_away: Option<MoveClause>,
}

/// The media modality a `near_media` probe searches by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Image similarity search.
    Image,
    /// Audio similarity search.
    Audio,
    /// Video similarity search.
    Video,
    /// Thumbnail similarity search.
    Thumbnail,
    /// IMU sensor-trace similarity search.
    Imu,
    /// Depth-map similarity search.
    Depth,
}

/// `near_media` probe (image/audio/video/thumbnail/imu/depth).
#[derive(Clone, Debug)]
pub struct NearMediaProbe {
    /// Which media modality this probe searches by.
    pub kind: MediaKind,
    /// Raw media bytes.
    pub media: Vec<u8>,
    /// Minimum certainty threshold.
    pub certainty: Option<f32>,
    /// Maximum distance threshold.
    pub distance: Option<f32>,
}

/// `hybrid` fusion probe.
#[derive(Clone, Debug)]
pub struct HybridProbe {
    /// Keyword query text.
    pub query: String,
    /// Fusion weight between keyword (0.0) and vector (1.0) scoring.
    pub alpha: f32,
    /// Optional explicit query vector; when absent, the server vectorizes
    /// `query` itself.
    pub vector: Option<Vec<f32>>,
    /// Fusion algorithm name (server-defined, e.g. `"rankedFusion"`).
    pub fusion_type: String,
    /// Named vector to search against, for multi-vector-space collections.
    pub target_vector: Option<String>,
    /// Restrict keyword scoring to these properties.
    pub properties: Vec<String>,
}

/// `bm25` keyword probe.
#[derive(Clone, Debug)]
pub struct Bm25Probe {
    /// Keyword query text.
    pub query: String,
    /// Restrict scoring to these properties; empty means all text
    /// properties.
    pub properties: Vec<String>,
}

/// The single search probe a request may carry (§4.6: mutually exclusive).
#[derive(Clone, Debug)]
pub enum Probe {
    /// Hybrid keyword+vector fusion.
    Hybrid(HybridProbe),
    /// Keyword-only BM25.
    Bm25(Bm25Probe),
    /// Vector similarity.
    NearVector(NearVectorProbe),
    /// Similarity to an existing object.
    NearObject(NearObjectProbe),
    /// Concept-text similarity.
    NearText(NearTextProbe),
    /// Media similarity.
    NearMedia(NearMediaProbe),
}

/// A single sort clause.
#[derive(Clone, Debug)]
pub struct SortClause {
    /// Property path to sort by.
    pub path: String,
    /// `true` for ascending order.
    pub ascending: bool,
}

/// Result grouping.
#[derive(Clone, Debug)]
pub struct GroupByClause {
    /// Property path(s) identifying the group.
    pub path: Vec<String>,
    /// Maximum number of groups to return.
    pub number_of_groups: i32,
    /// Maximum objects per group.
    pub objects_per_group: i32,
}

/// Generative augmentation request.
#[derive(Clone, Debug, Default)]
pub struct GenerativeClause {
    /// Prompt applied independently to every result object.
    pub single_prompt: Option<String>,
    /// Prompt applied once to the whole result set.
    pub grouped_task: Option<String>,
    /// Properties fed into `grouped_task`'s context.
    pub grouped_properties: Vec<String>,
}

/// A single named-vector target, or a join of several (version-gated).
#[derive(Clone, Debug)]
pub enum TargetVector {
    /// Search against one named vector space.
    Single(String),
    /// Search against several named vector spaces, merged by
    /// `combination` (e.g. `"sum"`, `"average"`). Requires
    /// [`MULTI_TARGET_VECTOR_JOIN`].
    Join {
        /// Vector space names to join.
        names: Vec<String>,
        /// Join/combination strategy.
        combination: String,
    },
}

/// Which metadata fields to request alongside each result.
#[derive(Clone, Copy, Debug, Default)]
pub struct MetadataFlags {
    /// Include the object UUID.
    pub uuid: bool,
    /// Include the object's vector(s).
    pub vector: bool,
    /// Include creation timestamp.
    pub creation_time_unix: bool,
    /// Include last-update timestamp.
    pub last_update_time_unix: bool,
    /// Include vector distance.
    pub distance: bool,
    /// Include vector certainty.
    pub certainty: bool,
    /// Include keyword/hybrid score.
    pub score: bool,
    /// Include score explanation.
    pub explain_score: bool,
    /// Include replication consistency flag.
    pub is_consistent: bool,
}

impl MetadataFlags {
    /// Every metadata field except `vector` (§4.6: the default when the
    /// caller specifies neither `return_metadata` nor `return_properties`).
    #[must_use]
    pub fn all_except_vector() -> Self {
        Self {
            uuid: true,
            vector: false,
            creation_time_unix: true,
            last_update_time_unix: true,
            distance: true,
            certainty: true,
            score: true,
            explain_score: true,
            is_consistent: true,
        }
    }
}

/// A reference-traversal return request: follow `reference_property`, then
/// decode `properties`/`metadata` from the linked object.
#[derive(Clone, Debug)]
pub struct ReturnReference {
    /// Name of the reference property to traverse.
    pub reference_property: String,
    /// Disambiguates a multi-target reference property.
    pub target_collection: Option<String>,
    /// Properties to return from the linked object.
    pub properties: ReturnProperties,
    /// Metadata to return from the linked object.
    pub metadata: MetadataFlags,
}

/// Which properties (plain and/or reference-traversed) to return.
#[derive(Clone, Debug, Default)]
pub struct ReturnProperties {
    /// Plain (non-reference) property names.
    pub non_reference: Vec<String>,
    /// Reference-traversal requests, possibly nested.
    pub references: Vec<ReturnReference>,
    /// Request every non-reference property (mutually informative with
    /// `non_reference` being empty, but not enforced — the server wins).
    pub return_all_non_reference: bool,
}

/// A single search request (§4.6).
#[derive(Clone, Debug, Default)]
pub struct SearchRequest {
    /// Target collection name.
    pub collection: String,
    /// Read consistency level, for replicated collections.
    pub consistency_level: Option<String>,
    /// Tenant, for multi-tenant collections.
    pub tenant: Option<String>,
    /// Filter tree restricting matched objects.
    pub filters: Option<Filter>,
    /// The single similarity/keyword probe, if any.
    pub probe: Option<Probe>,
    /// Maximum objects to return.
    pub limit: Option<i32>,
    /// Offset into the result set.
    pub offset: Option<i32>,
    /// Cursor: resume after this object UUID. Incompatible with any probe.
    pub after: Option<Uuid>,
    /// Autocut threshold; `Some(0)` disables autocut.
    pub autocut: Option<i32>,
    /// Sort clauses, applied in order.
    pub sort: Vec<SortClause>,
    /// Result grouping.
    pub group_by: Option<GroupByClause>,
    /// Generative augmentation.
    pub generative: Option<GenerativeClause>,
    /// Named-vector target(s) to search against.
    pub target_vector: Option<TargetVector>,
    /// Metadata fields to return.
    pub metadata: Option<MetadataFlags>,
    /// Properties to return.
    pub properties: Option<ReturnProperties>,
}

impl SearchRequest {
    /// Construct an otherwise-empty request for `collection`.
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Capability-free structural validation (§4.6 edge cases).
    pub fn validate(&self) -> Result<(), Error> {
        if self.collection.trim().is_empty() {
            return Err(Error::InvalidInput("search collection must not be empty".into()));
        }
        if self.after.is_some() && self.probe.is_some() {
            return Err(Error::InvalidInput(
                "`after` cursor is incompatible with a vector/keyword probe".into(),
            ));
        }
        if let Some(Probe::NearText(probe)) = &self.probe {
            for clause in [&probe.move_to, &probe.move_away].into_iter().flatten() {
                if clause.is_empty() {
                    return Err(Error::InvalidInput(
                        "near_text move_to/move_away requires at least one concept or object uuid"
                            .into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Capability-gated validation: rejects named-vector and multi-target
    /// joins the connected server doesn't support, and reference-traversal
    /// `return_properties` the server can't serve.
    pub fn validate_against(&self, gate: &CapabilityGate) -> Result<(), Error> {
        self.validate()?;

        if let Some(Probe::NearVector(NearVectorProbe {
            vector: Some(VectorQuery::Named(_)),
            ..
        })) = &self.probe
        {
            gate.require(NAMED_VECTORS)?;
        }

        if let Some(TargetVector::Join { .. }) = &self.target_vector {
            gate.require(MULTI_TARGET_VECTOR_JOIN)?;
        }

        if let Some(filter) = &self.filters {
            wv_filter::reject_unsupported_reference_traversal(filter, gate)?;
        }

        Ok(())
    }

    /// Encode this request as the RPC `SearchRequest` message.
    #[must_use]
    pub fn to_rpc(&self) -> weaviate::SearchRequest {
        let metadata = self
            .metadata
            .unwrap_or_else(MetadataFlags::all_except_vector);
        let properties = self.properties.clone();

        weaviate::SearchRequest {
            collection: self.collection.clone(),
            consistency_level: self.consistency_level.clone(),
            tenant: self.tenant.clone(),
            filters: self.filters.as_ref().map(wv_filter::rpc::encode),
            hybrid_search: match &self.probe {
                Some(Probe::Hybrid(p)) => Some(encode_hybrid(p)),
                _ => None,
            },
            bm25_search: match &self.probe {
                Some(Probe::Bm25(p)) => Some(weaviate::Bm25 {
                    query: p.query.clone(),
                    properties: p.properties.clone(),
                }),
                _ => None,
            },
            near_vector: match &self.probe {
                Some(Probe::NearVector(p)) => Some(encode_near_vector(p)),
                _ => None,
            },
            near_object: match &self.probe {
                Some(Probe::NearObject(p)) => Some(weaviate::NearObject {
                    id: p.id.to_string(),
                    certainty: p.certainty,
                    distance: p.distance,
                }),
                _ => None,
            },
            near_text: match &self.probe {
                Some(Probe::NearText(p)) => Some(encode_near_text(p)),
                _ => None,
            },
            near_media: match &self.probe {
                Some(Probe::NearMedia(p)) => Some(weaviate::NearMediaSearch {
                    kind: encode_media_kind(p.kind) as i32,
                    media: p.media.clone(),
                    certainty: p.certainty,
                    distance: p.distance,
                }),
                _ => None,
            },
            limit: self.limit,
            offset: self.offset,
            after: self.after.map(|u| u.to_string()),
            autocut: self.autocut,
            sort_by: self
                .sort
                .iter()
                .map(|s| weaviate::SortBy {
                    path: s.path.clone(),
                    ascending: s.ascending,
                })
                .collect(),
            group_by: self.group_by.as_ref().map(|g| weaviate::GroupBy {
                path: g.path.clone(),
                number_of_groups: g.number_of_groups,
                objects_per_group: g.objects_per_group,
            }),
            generative: self.generative.as_ref().map(|g| weaviate::GenerativeSearch {
                single_response_prompt: g.single_prompt.clone(),
                grouped_task: g.grouped_task.clone(),
                grouped_properties: g.grouped_properties.clone(),
            }),
            target_vectors: self.target_vector.as_ref().map(encode_target_vector),
            metadata: Some(encode_metadata_flags(metadata)),
            properties: Some(match &properties {
                Some(properties) => encode_return_properties(properties),
                None => weaviate::PropertiesRequest {
                    non_ref_properties: Vec::new(),
                    ref_properties: Vec::new(),
                    return_all_nonref_properties: true,
                },
            }),
        }
    }
}

fn encode_hybrid(probe: &HybridProbe) -> weaviate::Hybrid {
    weaviate::Hybrid {
        query: probe.query.clone(),
        alpha: probe.alpha,
        vector_bytes: probe.vector.clone().unwrap_or_default(),
        fusion_type: probe.fusion_type.clone(),
        target_vector: probe.target_vector.clone(),
        properties: probe.properties.clone(),
    }
}

fn encode_near_vector(probe: &NearVectorProbe) -> weaviate::NearVector {
    let (vector_bytes, vector_per_name) = match &probe.vector {
        Some(VectorQuery::Flat(values)) => (values.clone(), Vec::new()),
        Some(VectorQuery::Named(named)) => (
            Vec::new(),
            named
                .iter()
                .map(|(name, values)| weaviate::Vectors {
                    name: name.clone(),
                    values: values.clone(),
                })
                .collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };
    weaviate::NearVector {
        vector_bytes,
        vector_per_name,
        certainty: probe.certainty,
        distance: probe.distance,
    }
}

fn encode_move(clause: &MoveClause) -> weaviate::Move {
    weaviate::Move {
        force: clause.force,
        concepts: clause.concepts.clone(),
        uuids: clause.uuids.iter().map(Uuid::to_string).collect(),
    }
}

fn encode_near_text(probe: &NearTextProbe) -> weaviate::NearTextSearch {
    weaviate::NearTextSearch {
        query: probe.query.clone(),
        certainty: probe.certainty,
        distance: probe.distance,
        move_to: probe.move_to.as_ref().map(encode_move),
        move_away: probe.move_away.as_ref().map(encode_move),
    }
}

fn encode_media_kind(kind: MediaKind) -> weaviate::MediaKind {
    match kind {
        MediaKind::Image => weaviate::MediaKind::MediaKindImage,
        MediaKind::Audio => weaviate::MediaKind::MediaKindAudio,
        MediaKind::Video => weaviate::MediaKind::MediaKindVideo,
        MediaKind::Thumbnail => weaviate::MediaKind::MediaKindThumbnail,
        MediaKind::Imu => weaviate::MediaKind::MediaKindImu,
        MediaKind::Depth => weaviate::MediaKind::MediaKindDepth,
    }
}

fn encode_target_vector(target: &TargetVector) -> weaviate::TargetVectorJoin {
    match target {
        TargetVector::Single(name) => weaviate::TargetVectorJoin {
            names: vec![name.clone()],
            combination: String::new(),
        },
        TargetVector::Join { names, combination } => weaviate::TargetVectorJoin {
            names: names.clone(),
            combination: combination.clone(),
        },
    }
}

fn encode_metadata_flags(flags: MetadataFlags) -> weaviate::MetadataRequest {
    weaviate::MetadataRequest {
        uuid: flags.uuid,
        vector: flags.vector,
        creation_time_unix: flags.creation_time_unix,
        last_update_time_unix: flags.last_update_time_unix,
        distance: flags.distance,
        certainty: flags.certainty,
        score: flags.score,
        explain_score: flags.explain_score,
        is_consistent: flags.is_consistent,
    }
}

fn encode_return_properties(properties: &ReturnProperties) -> weaviate::PropertiesRequest {
    weaviate::PropertiesRequest {
        non_ref_properties: properties.non_reference.clone(),
        ref_properties: properties.references.iter().map(encode_return_reference).collect(),
        return_all_nonref_properties: properties.return_all_non_reference,
    }
}

fn encode_return_reference(reference: &ReturnReference) -> weaviate::RefPropertiesRequest {
    weaviate::RefPropertiesRequest {
        reference_property: reference.reference_property.clone(),
        target_collection: reference.target_collection.clone(),
        properties: Some(encode_return_properties(&reference.properties)),
        metadata: Some(encode_metadata_flags(reference.metadata)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wv_capability::ServerVersion;

    #[test]
    fn rejects_empty_collection() {
        let request = SearchRequest::new("");
        assert!(request.validate().is_err());
    }

    #[test]
    fn rejects_after_cursor_combined_with_probe() {
        let mut request = SearchRequest::new("Article");
        request.after = Some(Uuid::nil());
        request.probe = Some(Probe::Bm25(Bm25Probe {
            query: "x".into(),
            properties: vec![],
        }));
        assert!(request.validate().is_err());
    }

    #[test]
    fn rejects_near_text_move_with_no_concepts_or_uuids() {
        let mut request = SearchRequest::new("Article");
        request.probe = Some(Probe::NearText(NearTextProbe {
            query: vec!["foo".into()],
            move_to: Some(MoveClause::default()),
            ..Default::default()
        }));
        assert!(request.validate().is_err());
    }

    #[test]
    fn accepts_near_text_move_with_concepts() {
        let mut request = SearchRequest::new("Article");
        request.probe = Some(Probe::NearText(NearTextProbe {
            query: vec!["foo".into()],
            move_to: Some(MoveClause {
                concepts: vec!["science".into()],
                ..Default::default()
            }),
            ..Default::default()
        }));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn named_vector_requires_capability_gate() {
        let mut request = SearchRequest::new("Article");
        let mut named = BTreeMap::new();
        named.insert("clip".to_string(), vec![0.1, 0.2]);
        request.probe = Some(Probe::NearVector(NearVectorProbe {
            vector: Some(VectorQuery::Named(named)),
            ..Default::default()
        }));

        let old_gate = CapabilityGate::new(ServerVersion::new(1, 20, 0));
        assert!(request.validate_against(&old_gate).is_err());

        let new_gate = CapabilityGate::new(ServerVersion::new(1, 24, 0));
        assert!(request.validate_against(&new_gate).is_ok());
    }

    #[test]
    fn multi_target_join_requires_capability_gate() {
        let mut request = SearchRequest::new("Article");
        request.target_vector = Some(TargetVector::Join {
            names: vec!["a".into(), "b".into()],
            combination: "sum".into(),
        });

        let old_gate = CapabilityGate::new(ServerVersion::new(1, 24, 0));
        assert!(request.validate_against(&old_gate).is_err());

        let new_gate = CapabilityGate::new(ServerVersion::new(1, 26, 0));
        assert!(request.validate_against(&new_gate).is_ok());
    }

    #[test]
    fn to_rpc_encodes_collection_and_default_metadata() {
        let request = SearchRequest::new("Article");
        let rpc = request.to_rpc();
        assert_eq!(rpc.collection, "Article");
        let metadata = rpc.metadata.unwrap();
        assert!(metadata.uuid);
        assert!(!metadata.vector);
    }
}
