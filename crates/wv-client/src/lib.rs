// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The client root: connection lifecycle and the top-level facade
//! accessors (§3 "Lifecycles", §4.1–§4.5, §4.10).
//!
//! A [`Client`] starts inert. [`Client::connect`] sequences everything a
//! call needs before it can run: an optional embedded-server start, token
//! acquisition, the HTTP control-plane transport, a readiness/liveness
//! probe, a version probe feeding the capability gate, and the RPC
//! data-plane channel. [`Client::close`] unwinds the same machinery in the
//! opposite order. Every per-domain accessor (`collections`, `cluster`,
//! `collection`, ...) clones the live transports into a freshly
//! constructed facade rather than holding a lock across the call.

/// Per-collection aggregate facade (§4.3, scenario F).
pub mod aggregate;
/// Per-collection batch facade (§4.8).
pub mod batch;
/// Per-collection facade: data, batch, query, aggregate, tenants, config,
/// backup (§4.10).
pub mod collection;
/// Wire encoding for [`wv_core::collection::ConsistencyLevel`].
pub mod consistency;
/// Per-collection object CRUD and reference sub-facade (§4.10).
pub mod data;
/// The embedded-server collaborator interface (§9).
pub mod embedded;
/// Fluent search surface over [`wv_search::request::SearchRequest`] (§4.6).
pub mod query;
/// Synchronous mirror of the async surface (§4.4, §9).
pub mod sync;
/// Transport-level batch submitters/node-stats source (§4.8, §6).
pub mod submit;

use std::sync::Arc;
use tokio::sync::RwLock;

use wv_admin::{
    AliasAdmin, BackupAdmin, ClusterAdmin, GroupAdmin, ReplicationAdmin, RoleAdmin, SchemaAdmin,
    TenantAdmin, UserAdmin,
};
use wv_auth::{Credentials, RefreshHandle, TokenState, TokenStateHandle};
use wv_capability::CapabilityGate;
use wv_config::logging::Logger;
use wv_config::ClientConfig;
use wv_error::Error;
use wv_transport::rpc::RpcTransport;
use wv_transport::{health, HealthStatus, HttpTransport};

use collection::CollectionHandle;
use embedded::EmbeddedServer;

/// Everything a connected client needs to drive a call: the two
/// transports, the capability gate derived from the server's reported
/// version, the current token state, and the refresh task (if one was
/// started for this credential shape).
struct LiveState {
    http: HttpTransport,
    rpc: RpcTransport<TokenStateHandle>,
    gate: CapabilityGate,
    #[allow(dead_code)]
    tokens: TokenState,
    refresh: Option<RefreshHandle>,
}

/// The client's connection lifecycle (§3 "Lifecycles": "inert until
/// `connect`, then live until `close`").
enum ConnectionState {
    /// Constructed but never connected.
    Inert,
    /// Connected and ready to serve calls.
    Live(LiveState),
    /// `close` has run; the client will not reconnect.
    Closed,
}

/// The Weaviate client root.
///
/// Starts [`ConnectionState::Inert`]; [`Client::connect`] brings it to
/// [`ConnectionState::Live`], and every domain accessor
/// (`collections`/`cluster`/`collection`/...) fails with
/// [`Error::ClosedClient`] or [`Error::InvalidInput`] until then.
pub struct Client {
    config: ClientConfig,
    credentials: Credentials,
    embedded: Option<Arc<dyn EmbeddedServer>>,
    logger: Logger,
    state: RwLock<ConnectionState>,
}

impl Client {
    /// Construct a client from validated configuration and credentials.
    /// Does not connect; call [`Client::connect`] before issuing any
    /// domain calls.
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, Error> {
        config
            .validate()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self {
            config,
            credentials,
            embedded: None,
            logger: Logger::from_env(),
            state: RwLock::new(ConnectionState::Inert),
        })
    }

    /// Attach an embedded-server collaborator, started by `connect` and
    /// stopped by `close` (§9 "Embedded server collaborator").
    #[must_use]
    pub fn with_embedded(mut self, embedded: Arc<dyn EmbeddedServer>) -> Self {
        self.embedded = Some(embedded);
        self
    }

    /// Connect: start the embedded server (if any), acquire a token,
    /// stand up both transports, probe readiness and version, and build
    /// the capability gate. Idempotent — a second call while already
    /// live is a no-op.
    pub async fn connect(&self) -> Result<(), Error> {
        {
            let state = self.state.read().await;
            match &*state {
                ConnectionState::Live(_) => return Ok(()),
                ConnectionState::Closed => return Err(Error::ClosedClient),
                ConnectionState::Inert => {}
            }
        }

        if let Some(embedded) = &self.embedded {
            embedded.start().await?;
        }

        let auth_client = reqwest::Client::builder()
            .connect_timeout(self.config.timeouts.connect)
            .timeout(self.config.timeouts.read)
            .build()
            .map_err(|e| Error::connection("auth http client build", e))?;
        let (tokens, refresh) =
            wv_auth::start(auth_client, &self.config.http_base_url, self.credentials.clone())
                .await?;

        let http = HttpTransport::new(
            self.config.http_base_url.clone(),
            self.config.timeouts.connect,
            self.config.timeouts.read,
            self.logger,
        )?
        .with_token_source(Arc::new(TokenStateHandle::from(&tokens)));

        match health::probe(&http).await {
            HealthStatus::Ready => {}
            HealthStatus::NotReady => {
                return Err(Error::connection(
                    "connect",
                    NotReadyError("server reported not ready".to_string()),
                ))
            }
            HealthStatus::Unreachable { reason } => {
                return Err(Error::connection("connect", NotReadyError(reason)))
            }
        }

        let version = health::server_version(&http).await?;
        let gate = CapabilityGate::new(version);

        let rpc = RpcTransport::connect(
            self.config.rpc_address.clone(),
            self.config.timeouts.connect,
            self.config.timeouts.read,
            TokenStateHandle::from(&tokens),
        )
        .await?;
        if !rpc.health_check().await? {
            return Err(Error::connection(
                "connect",
                NotReadyError("rpc health check did not report serving".to_string()),
            ));
        }

        let mut state = self.state.write().await;
        if matches!(&*state, ConnectionState::Live(_)) {
            // Another caller connected while we were racing; keep theirs.
            if let Some(handle) = refresh {
                handle.shutdown().await;
            }
            return Ok(());
        }
        *state = ConnectionState::Live(LiveState {
            http,
            rpc,
            gate,
            tokens,
            refresh,
        });
        Ok(())
    }

    /// Close the client: stop the refresh scheduler (if running), drop
    /// both transports, and stop the embedded server (if any), in that
    /// order (§9). Idempotent.
    pub async fn close(&self) -> Result<(), Error> {
        let previous = {
            let mut state = self.state.write().await;
            std::mem::replace(&mut *state, ConnectionState::Closed)
        };
        if let ConnectionState::Live(live) = previous {
            if let Some(handle) = live.refresh {
                handle.shutdown().await;
            }
        }
        if let Some(embedded) = &self.embedded {
            embedded.stop().await?;
        }
        Ok(())
    }

    async fn live_http(&self) -> Result<HttpTransport, Error> {
        match &*self.state.read().await {
            ConnectionState::Live(live) => Ok(live.http.clone()),
            ConnectionState::Closed => Err(Error::ClosedClient),
            ConnectionState::Inert => {
                Err(Error::InvalidInput("client is not connected".to_string()))
            }
        }
    }

    async fn live_rpc(&self) -> Result<RpcTransport<TokenStateHandle>, Error> {
        match &*self.state.read().await {
            ConnectionState::Live(live) => Ok(live.rpc.clone()),
            ConnectionState::Closed => Err(Error::ClosedClient),
            ConnectionState::Inert => {
                Err(Error::InvalidInput("client is not connected".to_string()))
            }
        }
    }

    async fn live_gate(&self) -> Result<CapabilityGate, Error> {
        match &*self.state.read().await {
            ConnectionState::Live(live) => Ok(live.gate),
            ConnectionState::Closed => Err(Error::ClosedClient),
            ConnectionState::Inert => {
                Err(Error::InvalidInput("client is not connected".to_string()))
            }
        }
    }

    /// Schema CRUD over every collection (`config` without a bound
    /// collection — use [`Client::collection`] for a scoped handle).
    pub async fn collections(&self) -> Result<SchemaAdmin, Error> {
        Ok(SchemaAdmin::new(self.live_http().await?))
    }

    /// Cluster-wide status passthrough.
    pub async fn cluster(&self) -> Result<ClusterAdmin, Error> {
        Ok(ClusterAdmin::new(self.live_http().await?))
    }

    /// RBAC user management.
    pub async fn users(&self) -> Result<UserAdmin, Error> {
        Ok(UserAdmin::new(self.live_http().await?))
    }

    /// RBAC role management.
    pub async fn roles(&self) -> Result<RoleAdmin, Error> {
        Ok(RoleAdmin::new(self.live_http().await?))
    }

    /// RBAC OIDC-group role bindings.
    pub async fn groups(&self) -> Result<GroupAdmin, Error> {
        Ok(GroupAdmin::new(self.live_http().await?))
    }

    /// Shard replication operation CRUD.
    pub async fn replication(&self) -> Result<ReplicationAdmin, Error> {
        Ok(ReplicationAdmin::new(self.live_http().await?))
    }

    /// Cluster-wide backup create/status/restore/cancel.
    pub async fn backup(&self) -> Result<BackupAdmin, Error> {
        Ok(BackupAdmin::new(self.live_http().await?))
    }

    /// Collection alias CRUD.
    pub async fn aliases(&self) -> Result<AliasAdmin, Error> {
        Ok(AliasAdmin::new(self.live_http().await?))
    }

    /// A handle scoped to one collection, exposing `data`, `batch`,
    /// `query`, `aggregate`, `tenants`, `config`, and `backup` (§4.10).
    pub async fn collection(&self, name: impl Into<String>) -> Result<CollectionHandle, Error> {
        let http = self.live_http().await?;
        let rpc = self.live_rpc().await?;
        let gate = self.live_gate().await?;
        Ok(CollectionHandle::new(http, rpc, gate, name))
    }
}

#[derive(Debug)]
struct NotReadyError(String);

impl std::fmt::Display for NotReadyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotReadyError {}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig::new(server.uri(), "http://127.0.0.1:1")
    }

    #[tokio::test]
    async fn connect_fails_fast_when_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = Client::new(config_for(&server), Credentials::ApiKey("key".into())).unwrap();
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn accessors_fail_before_connect() {
        let server = MockServer::start().await;
        let client = Client::new(config_for(&server), Credentials::ApiKey("key".into())).unwrap();
        let err = client.collections().await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn close_before_connect_is_a_no_op() {
        let server = MockServer::start().await;
        let client = Client::new(config_for(&server), Credentials::ApiKey("key".into())).unwrap();
        client.close().await.unwrap();
        let err = client.collections().await.unwrap_err();
        assert!(matches!(err, Error::ClosedClient));
    }

    #[test]
    fn rejects_invalid_config_up_front() {
        let config = ClientConfig::new("not-a-url", "localhost:50051");
        let err = Client::new(config, Credentials::ApiKey("key".into())).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
