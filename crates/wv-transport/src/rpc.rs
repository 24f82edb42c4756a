// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binary/streaming RPC data-plane transport (§4.1, §6).
//!
//! Wraps the generated [`weaviate::v1`] client plus a `tonic-health` probe
//! behind a single channel that attaches bearer-token metadata to every
//! call. Unlike [`crate::http`], the RPC plane carries search, batch
//! ingestion, tenant listing, and (on newer servers) aggregation.

use std::time::Duration;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use wv_error::Error;

pub mod weaviate {
    //! Generated protobuf/tonic bindings for `package weaviate.v1`.
    tonic::include_proto!("weaviate.v1");
}

use weaviate::weaviate_client::WeaviateClient;
use weaviate::{
    AggregateReply, AggregateRequest, BatchObjectsReply, BatchObjectsRequest, SearchRequest,
    SearchResponse, TenantsGetReply, TenantsGetRequest,
};

/// A token source consulted before every unary call, so a refreshed OIDC
/// access token is always attached without the caller threading it
/// through each method (§4.2, §8 item 8).
pub trait BearerTokenSource: Send + Sync {
    /// Return the current bearer token, if the client is authenticated.
    fn current_token(&self) -> Option<String>;
}

/// A token source that never attaches a token (anonymous access).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAuth;

impl BearerTokenSource for NoAuth {
    fn current_token(&self) -> Option<String> {
        None
    }
}

/// The RPC channel: a connected [`Channel`], the generated stub, and a
/// handle to the current bearer token.
#[derive(Clone)]
pub struct RpcTransport<T: BearerTokenSource + Clone> {
    channel: Channel,
    client: WeaviateClient<Channel>,
    tokens: T,
}

impl<T: BearerTokenSource + Clone> RpcTransport<T> {
    /// Connect to `address` (e.g. `http://localhost:50051`) with the given
    /// connect/read timeouts, attaching `tokens` to every call.
    pub async fn connect(
        address: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
        tokens: T,
    ) -> Result<Self, Error> {
        let endpoint = Endpoint::from_shared(address.into())
            .map_err(|e| Error::connection("rpc endpoint", e))?
            .connect_timeout(connect_timeout)
            .timeout(read_timeout);
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| Error::connection("rpc connect", e))?;
        Ok(Self {
            channel: channel.clone(),
            client: WeaviateClient::new(channel),
            tokens,
        })
    }

    /// Probe `/grpc.health.v1.Health/Check` for the `weaviate.v1.Weaviate`
    /// service. Used once at connect time; a non-`SERVING` status fails the
    /// connection attempt (§6).
    pub async fn health_check(&self) -> Result<bool, Error> {
        let mut client = tonic_health::pb::health_client::HealthClient::new(self.channel.clone());
        let request = Request::new(tonic_health::pb::HealthCheckRequest {
            service: "weaviate.v1.Weaviate".to_string(),
        });
        let response = client
            .check(request)
            .await
            .map_err(|status| Self::translate_status("rpc_health_check", status))?;
        Ok(response.into_inner().status()
            == tonic_health::pb::health_check_response::ServingStatus::Serving)
    }

    fn authorize<R>(&self, message: R, label: &str) -> Result<Request<R>, Error> {
        let mut request = Request::new(message);
        if let Some(token) = self.tokens.current_token() {
            let value = format!("Bearer {token}");
            let value = MetadataValue::try_from(value.as_str())
                .map_err(|e| Error::Authentication(format!("invalid bearer token: {e}")))?;
            request.metadata_mut().insert("authorization", value);
        }
        let _ = label;
        Ok(request)
    }

    fn translate_status(label: &str, status: Status) -> Error {
        Error::Rpc {
            label: label.to_string(),
            code: status.code() as i32,
            message: status.message().to_string(),
        }
    }

    /// Execute a vector/hybrid/keyword search over the RPC plane (§4.6, §4.7).
    pub async fn search(&mut self, request: SearchRequest) -> Result<SearchResponse, Error> {
        let request = self.authorize(request, "search")?;
        self.client
            .search(request)
            .await
            .map(|response| response.into_inner())
            .map_err(|status| Self::translate_status("search", status))
    }

    /// Submit a batch of objects for ingestion over the RPC plane (§4.8).
    pub async fn batch_objects(
        &mut self,
        request: BatchObjectsRequest,
    ) -> Result<BatchObjectsReply, Error> {
        let request = self.authorize(request, "batch_objects")?;
        self.client
            .batch_objects(request)
            .await
            .map(|response| response.into_inner())
            .map_err(|status| Self::translate_status("batch_objects", status))
    }

    /// List tenants and their activity status for a collection (§4.3 scenario,
    /// tenant admin surfaces in §6).
    pub async fn tenants_get(
        &mut self,
        request: TenantsGetRequest,
    ) -> Result<TenantsGetReply, Error> {
        let request = self.authorize(request, "tenants_get")?;
        self.client
            .tenants_get(request)
            .await
            .map(|response| response.into_inner())
            .map_err(|status| Self::translate_status("tenants_get", status))
    }

    /// Run an aggregation over the RPC plane (used when
    /// [`wv_capability::CapabilityGate::aggregate_transport`] selects
    /// [`wv_capability::Transport::Rpc`]).
    pub async fn aggregate(&mut self, request: AggregateRequest) -> Result<AggregateReply, Error> {
        let request = self.authorize(request, "aggregate")?;
        self.client
            .aggregate(request)
            .await
            .map(|response| response.into_inner())
            .map_err(|status| Self::translate_status("aggregate", status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct StaticToken(Option<String>);

    impl BearerTokenSource for StaticToken {
        fn current_token(&self) -> Option<String> {
            self.0.clone()
        }
    }

    #[test]
    fn no_auth_attaches_no_header() {
        let source = NoAuth;
        assert_eq!(source.current_token(), None);
    }

    #[test]
    fn static_token_source_reports_its_token() {
        let source = StaticToken(Some("abc123".to_string()));
        assert_eq!(source.current_token(), Some("abc123".to_string()));
    }
}
