// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fluent search surface (§4.6, §4.10 `query`).
//!
//! [`wv_search::request::SearchRequest`] is a plain data holder with no
//! chaining methods of its own (by design — it's shared with capability
//! gating and RPC encoding, which want a dumb struct). This module is
//! where the ergonomic `near_vector`/`near_text`/.../`fetch_objects`
//! surface lives, setting that struct's fields directly.

use std::collections::VecDeque;

use wv_auth::TokenStateHandle;
use wv_capability::CapabilityGate;
use wv_core::collection::ConsistencyLevel;
use wv_core::object::Object;
use wv_core::Filter;
use wv_error::Error;
use wv_search::decode::decode_response;
use wv_search::request::{
    Bm25Probe, GenerativeClause, GroupByClause, HybridProbe, MetadataFlags, NearMediaProbe,
    NearObjectProbe, NearTextProbe, NearVectorProbe, Probe, ReturnProperties, SearchRequest,
    SortClause, TargetVector,
};
use wv_search::DecodedResponse;
use wv_transport::rpc::RpcTransport;

use crate::consistency::consistency_level_str;

/// A page size used by [`QueryBuilder::fetch_objects_iterator`], matching
/// the cursor-paging default named in §4.10.
const ITERATOR_PAGE_SIZE: i32 = 100;

/// A fluent, per-call search request, scoped to one collection (and,
/// optionally, one tenant/consistency level — see
/// [`crate::collection::CollectionHandle::with_tenant`]).
pub struct QueryBuilder {
    rpc: RpcTransport<TokenStateHandle>,
    gate: CapabilityGate,
    request: SearchRequest,
}

impl QueryBuilder {
    pub(crate) fn new(
        rpc: RpcTransport<TokenStateHandle>,
        gate: CapabilityGate,
        collection: impl Into<String>,
        tenant: Option<String>,
        consistency_level: Option<ConsistencyLevel>,
    ) -> Self {
        let mut request = SearchRequest::new(collection);
        request.tenant = tenant;
        request.consistency_level = consistency_level.map(|level| consistency_level_str(level).to_string());
        Self { rpc, gate, request }
    }

    /// Maximum objects to return.
    #[must_use]
    pub fn limit(mut self, limit: i32) -> Self {
        self.request.limit = Some(limit);
        self
    }

    /// Offset into the result set.
    #[must_use]
    pub fn offset(mut self, offset: i32) -> Self {
        self.request.offset = Some(offset);
        self
    }

    /// Resume after this object's UUID. Incompatible with any probe.
    #[must_use]
    pub fn after(mut self, uuid: uuid::Uuid) -> Self {
        self.request.after = Some(uuid);
        self
    }

    /// Enable autocut with the given threshold.
    #[must_use]
    pub fn autocut(mut self, threshold: i32) -> Self {
        self.request.autocut = Some(threshold);
        self
    }

    /// Restrict matched objects with a filter tree.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.request.filters = Some(filter);
        self
    }

    /// Sort the result set.
    #[must_use]
    pub fn sort(mut self, sort: Vec<SortClause>) -> Self {
        self.request.sort = sort;
        self
    }

    /// Group results.
    #[must_use]
    pub fn group_by(mut self, group_by: GroupByClause) -> Self {
        self.request.group_by = Some(group_by);
        self
    }

    /// Request generative augmentation.
    #[must_use]
    pub fn generative(mut self, generative: GenerativeClause) -> Self {
        self.request.generative = Some(generative);
        self
    }

    /// Search against a specific named vector space (or join of several).
    #[must_use]
    pub fn target_vector(mut self, target: TargetVector) -> Self {
        self.request.target_vector = Some(target);
        self
    }

    /// Override which metadata fields come back (default: everything but
    /// the vector itself — see [`MetadataFlags::all_except_vector`]).
    #[must_use]
    pub fn return_metadata(mut self, metadata: MetadataFlags) -> Self {
        self.request.metadata = Some(metadata);
        self
    }

    /// Override which properties (plain and/or reference-traversed) come
    /// back.
    #[must_use]
    pub fn return_properties(mut self, properties: ReturnProperties) -> Self {
        self.request.properties = Some(properties);
        self
    }

    /// Vector similarity search.
    #[must_use]
    pub fn near_vector(mut self, probe: NearVectorProbe) -> Self {
        self.request.probe = Some(Probe::NearVector(probe));
        self
    }

    /// Similarity to an existing object's vector.
    #[must_use]
    pub fn near_object(mut self, probe: NearObjectProbe) -> Self {
        self.request.probe = Some(Probe::NearObject(probe));
        self
    }

    /// Concept-text similarity search.
    #[must_use]
    pub fn near_text(mut self, probe: NearTextProbe) -> Self {
        self.request.probe = Some(Probe::NearText(probe));
        self
    }

    /// Media similarity search.
    #[must_use]
    pub fn near_media(mut self, probe: NearMediaProbe) -> Self {
        self.request.probe = Some(Probe::NearMedia(probe));
        self
    }

    /// Keyword-only BM25 search.
    #[must_use]
    pub fn bm25(mut self, probe: Bm25Probe) -> Self {
        self.request.probe = Some(Probe::Bm25(probe));
        self
    }

    /// Hybrid keyword+vector fusion search.
    #[must_use]
    pub fn hybrid(mut self, probe: HybridProbe) -> Self {
        self.request.probe = Some(Probe::Hybrid(probe));
        self
    }

    /// Run this request once over the RPC data plane and decode the
    /// result (§4.7).
    pub async fn fetch_objects(mut self) -> Result<DecodedResponse, Error> {
        self.request.validate()?;
        self.request.validate_against(&self.gate)?;
        let rpc_request = self.request.to_rpc();
        let response = self.rpc.search(rpc_request).await?;
        decode_response(&response)
    }

    /// Page through every object matching this request's filters (no
    /// probe may be set — an `after` cursor and a probe are mutually
    /// exclusive, §4.6), 100 objects at a time, until a page comes back
    /// empty (§4.10 `fetch_objects_iterator`).
    #[must_use]
    pub fn fetch_objects_iterator(self) -> ObjectIterator {
        ObjectIterator::new(self)
    }
}

/// A cursor-paged iterator over `fetch_objects`, yielding one decoded
/// object at a time and transparently fetching the next page of
/// [`ITERATOR_PAGE_SIZE`] once the buffered page is drained.
pub struct ObjectIterator {
    rpc: RpcTransport<TokenStateHandle>,
    gate: CapabilityGate,
    request: SearchRequest,
    buffer: VecDeque<Object>,
    exhausted: bool,
}

impl ObjectIterator {
    fn new(builder: QueryBuilder) -> Self {
        let mut request = builder.request;
        request.limit = Some(ITERATOR_PAGE_SIZE);
        Self {
            rpc: builder.rpc,
            gate: builder.gate,
            request,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Fetch the next decoded object, paging as needed, or `None` once
    /// the search has been paged through to its end.
    pub async fn next(&mut self) -> Option<Result<Object, Error>> {
        if let Some(object) = self.buffer.pop_front() {
            return Some(Ok(object));
        }
        if self.exhausted {
            return None;
        }

        if let Err(err) = self.request.validate().and_then(|()| self.request.validate_against(&self.gate)) {
            self.exhausted = true;
            return Some(Err(err));
        }

        let rpc_request = self.request.to_rpc();
        let response = match self.rpc.search(rpc_request).await {
            Ok(response) => response,
            Err(err) => {
                self.exhausted = true;
                return Some(Err(err));
            }
        };
        let decoded = match decode_response(&response) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.exhausted = true;
                return Some(Err(err));
            }
        };
        if decoded.objects.is_empty() {
            self.exhausted = true;
            return None;
        }

        match decoded.objects.last().and_then(|object| object.uuid) {
            Some(uuid) => self.request.after = Some(uuid),
            None => self.exhausted = true,
        }
        self.buffer.extend(decoded.objects);
        self.buffer.pop_front().map(Ok)
    }
}
