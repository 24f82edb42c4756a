// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The `SearchRequest` builder (§4.6) and result decoding (§4.7).
//!
//! `wv-filter` encodes the filter tree this crate embeds; `wv-transport`
//! carries the encoded request and returns the raw RPC response this
//! crate decodes into [`wv_core::Object`]s.

/// The `SearchRequest` builder and its probes/clauses.
pub mod request;
/// Decoding a `SearchResponse` into typed objects, groups, and generative
/// output (§4.7).
pub mod decode;
/// Aggregate request/response, soft-gated between GraphQL REST (pre-1.29)
/// and the RPC `Aggregate` service (1.29+) (§4.3, scenario F).
pub mod aggregate;

pub use decode::{decode_response, DecodedGroup, DecodedResponse, GenerativeResult};
pub use request::{
    Bm25Probe, GenerativeClause, GroupByClause, HybridProbe, MediaKind, MetadataFlags, MoveClause,
    NearMediaProbe, NearObjectProbe, NearTextProbe, NearVectorProbe, Probe, ReturnProperties,
    ReturnReference, SearchRequest, SortClause, TargetVector, VectorQuery,
};
