// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-collection aggregate facade (§4.3, §4.10 `aggregate`, scenario F).
//!
//! The same [`AggregateRequest`] drives both wire formats; only
//! [`CapabilityGate::aggregate_transport`] decides, once, which transport
//! actually carries a given call — GraphQL REST pre-1.29, RPC from 1.29.

use wv_auth::TokenStateHandle;
use wv_capability::{CapabilityGate, Transport};
use wv_core::Filter;
use wv_error::Error;
use wv_search::aggregate::{decode_graphql_response, decode_rpc_reply, AggregateRequest, AggregateResponse};
use wv_transport::rpc::RpcTransport;
use wv_transport::HttpTransport;

/// A fluent, per-call aggregation, scoped to one collection.
pub struct AggregateBuilder {
    http: HttpTransport,
    rpc: RpcTransport<TokenStateHandle>,
    gate: CapabilityGate,
    request: AggregateRequest,
}

impl AggregateBuilder {
    pub(crate) fn new(
        http: HttpTransport,
        rpc: RpcTransport<TokenStateHandle>,
        gate: CapabilityGate,
        collection: impl Into<String>,
        tenant: Option<String>,
    ) -> Self {
        let mut request = AggregateRequest::over_all(collection);
        request.tenant = tenant;
        Self { http, rpc, gate, request }
    }

    /// Restrict the aggregated objects with a filter tree.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.request.filters = Some(filter);
        self
    }

    /// Group by one or more property paths.
    #[must_use]
    pub fn group_by(mut self, paths: Vec<String>) -> Self {
        self.request.group_by = paths;
        self
    }

    /// Cap the number of objects scanned before aggregating.
    #[must_use]
    pub fn object_limit(mut self, limit: i32) -> Self {
        self.request.object_limit = Some(limit);
        self
    }

    /// Run the aggregation, picking the wire format the connected
    /// server's capability gate selects.
    pub async fn execute(mut self) -> Result<AggregateResponse, Error> {
        self.request.validate()?;
        match self.gate.aggregate_transport() {
            Transport::Rpc => {
                let reply = self.rpc.aggregate(self.request.to_rpc()).await?;
                decode_rpc_reply(&reply)
            }
            Transport::RestLegacy => {
                let query = self.request.to_graphql();
                let body = serde_json::json!({ "query": query });
                let response = self
                    .http
                    .post("/graphql", &body, &[], &[200], "aggregate_graphql")
                    .await?;
                decode_graphql_response(&self.request.collection, &response.body)
            }
        }
    }
}
