// SPDX-License-Identifier: MIT OR Apache-2.0
//! An in-process mock of the `weaviate.v1.Weaviate` gRPC service plus its
//! health endpoint, for integration tests that exercise `wv-transport`'s
//! RPC plane (and anything built on it — `wv-batch`, `wv-search`,
//! `wv-client`) without a real server.
//!
//! Responses are programmed per-call as a FIFO queue; a call past the end
//! of the queue gets the last entry repeated (or an empty default), which
//! matches how the teacher's `wiremock` stubs behave for HTTP.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tonic::{Request, Response, Status};
use tonic_health::server::HealthReporter;

pub mod weaviate {
    //! Server-side bindings for `package weaviate.v1`, generated
    //! independently of `wv_transport::rpc::weaviate` (see `build.rs`).
    tonic::include_proto!("weaviate.v1");
}

use weaviate::weaviate_server::{Weaviate, WeaviateServer};
use weaviate::{
    AggregateReply, AggregateRequest, BatchObjectsReply, BatchObjectsRequest, SearchRequest,
    SearchResponse, TenantsGetReply, TenantsGetRequest,
};

/// Requests the mock server received, recorded in arrival order, for
/// assertions about what the client actually sent.
#[derive(Default)]
struct Recorded {
    search: Vec<SearchRequest>,
    batch: Vec<BatchObjectsRequest>,
    tenants: Vec<TenantsGetRequest>,
    aggregate: Vec<AggregateRequest>,
}

#[derive(Default)]
struct Queued {
    search: VecDeque<SearchResponse>,
    batch: VecDeque<BatchObjectsReply>,
    tenants: VecDeque<TenantsGetReply>,
    aggregate: VecDeque<AggregateReply>,
}

/// Shared handle to a running mock server: program responses and inspect
/// recorded requests while the server answers calls on a background task.
#[derive(Clone, Default)]
pub struct MockWeaviate {
    queued: Arc<Mutex<Queued>>,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockWeaviate {
    /// Construct an empty mock: every call returns a default (empty)
    /// response until one is queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a `Search` response to be returned on the next call.
    #[must_use]
    pub fn push_search(self, response: SearchResponse) -> Self {
        self.queued.lock().unwrap().search.push_back(response);
        self
    }

    /// Queue a `BatchObjects` response to be returned on the next call.
    #[must_use]
    pub fn push_batch(self, response: BatchObjectsReply) -> Self {
        self.queued.lock().unwrap().batch.push_back(response);
        self
    }

    /// Queue a `TenantsGet` response to be returned on the next call.
    #[must_use]
    pub fn push_tenants(self, response: TenantsGetReply) -> Self {
        self.queued.lock().unwrap().tenants.push_back(response);
        self
    }

    /// Queue an `Aggregate` response to be returned on the next call.
    #[must_use]
    pub fn push_aggregate(self, response: AggregateReply) -> Self {
        self.queued.lock().unwrap().aggregate.push_back(response);
        self
    }

    /// Every `SearchRequest` this server has received so far, in order.
    #[must_use]
    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.recorded.lock().unwrap().search.clone()
    }

    /// Every `BatchObjectsRequest` this server has received so far, in order.
    #[must_use]
    pub fn batch_requests(&self) -> Vec<BatchObjectsRequest> {
        self.recorded.lock().unwrap().batch.clone()
    }
}

#[async_trait::async_trait]
impl Weaviate for MockWeaviate {
    async fn search(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<Response<SearchResponse>, Status> {
        let req = request.into_inner();
        self.recorded.lock().unwrap().search.push(req);
        let mut queued = self.queued.lock().unwrap();
        Ok(Response::new(queued.search.pop_front().unwrap_or_default()))
    }

    async fn batch_objects(
        &self,
        request: Request<BatchObjectsRequest>,
    ) -> Result<Response<BatchObjectsReply>, Status> {
        let req = request.into_inner();
        self.recorded.lock().unwrap().batch.push(req);
        let mut queued = self.queued.lock().unwrap();
        Ok(Response::new(queued.batch.pop_front().unwrap_or_default()))
    }

    async fn tenants_get(
        &self,
        request: Request<TenantsGetRequest>,
    ) -> Result<Response<TenantsGetReply>, Status> {
        let req = request.into_inner();
        self.recorded.lock().unwrap().tenants.push(req);
        let mut queued = self.queued.lock().unwrap();
        Ok(Response::new(queued.tenants.pop_front().unwrap_or_default()))
    }

    async fn aggregate(
        &self,
        request: Request<AggregateRequest>,
    ) -> Result<Response<AggregateReply>, Status> {
        let req = request.into_inner();
        self.recorded.lock().unwrap().aggregate.push(req);
        let mut queued = self.queued.lock().unwrap();
        Ok(Response::new(queued.aggregate.pop_front().unwrap_or_default()))
    }
}

/// A running mock server: its bound address and a shutdown handle. Dropping
/// this (or calling [`MockServerHandle::shutdown`]) stops the server.
pub struct MockServerHandle {
    /// Address the server is listening on, e.g. `http://127.0.0.1:53214`.
    pub address: String,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl MockServerHandle {
    /// Stop the server and wait for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Spawn `mock` as a real gRPC server on an OS-assigned loopback port, with
/// the `weaviate.v1.Weaviate` health service reporting `SERVING` — matching
/// what `RpcTransport::connect`'s health probe (§6) expects.
pub async fn spawn(mock: MockWeaviate) -> MockServerHandle {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock rpc listener");
    let addr: SocketAddr = listener.local_addr().expect("mock rpc listener addr");

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    set_serving(&mut health_reporter).await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);

    let task = tokio::spawn(async move {
        let _ = tonic::transport::Server::builder()
            .add_service(health_service)
            .add_service(WeaviateServer::new(mock))
            .serve_with_incoming_shutdown(incoming, async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    MockServerHandle {
        address: format!("http://{addr}"),
        shutdown: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn set_serving(reporter: &mut HealthReporter) {
    reporter.set_serving::<WeaviateServer<MockWeaviate>>().await;
}
