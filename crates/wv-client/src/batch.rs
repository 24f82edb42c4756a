// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-collection batch facade (§4.8): the background engine
//! (`add_object`/`add_reference`/`flush`/`close`) plus the single-shot
//! `insert_many` path, both wired to the RPC object submitter, the REST
//! reference submitter, and the REST node-stats source (`wv_client::submit`).

use std::sync::Arc;
use uuid::Uuid;

use wv_auth::TokenStateHandle;
use wv_batch::{BatchEngine, BatchEngineConfig, ObjectBatchSubmitter};
use wv_core::collection::ConsistencyLevel;
use wv_core::object::{Object, Reference};
use wv_core::{BatchItemError, BatchObject, BatchReference, BatchResult};
use wv_error::Error;
use wv_transport::rpc::RpcTransport;
use wv_transport::HttpTransport;

use crate::submit::{RestNodeStatsSource, RestReferenceSubmitter, RpcObjectSubmitter};

/// The per-collection batch facade (§4.10 `batch`).
pub struct BatchFacade {
    engine: Arc<BatchEngine>,
    object_submitter: Arc<dyn ObjectBatchSubmitter>,
    collection: String,
    consistency_level: Option<ConsistencyLevel>,
}

impl BatchFacade {
    pub(crate) fn new(
        http: HttpTransport,
        rpc: RpcTransport<TokenStateHandle>,
        collection: impl Into<String>,
        consistency_level: Option<ConsistencyLevel>,
    ) -> Self {
        let object_submitter: Arc<dyn ObjectBatchSubmitter> = Arc::new(RpcObjectSubmitter::new(rpc));
        let reference_submitter = Arc::new(RestReferenceSubmitter::new(http.clone()));
        let stats_source = Arc::new(RestNodeStatsSource::new(http));
        let config = BatchEngineConfig {
            consistency_level,
            ..BatchEngineConfig::default()
        };
        let engine = Arc::new(BatchEngine::new(
            config,
            object_submitter.clone(),
            reference_submitter,
            Some(stats_source),
        ));
        Self {
            engine,
            object_submitter,
            collection: collection.into(),
            consistency_level,
        }
    }

    /// Start the background size-controller poll task.
    pub async fn start(&self) {
        self.engine.start().await;
    }

    /// Current number of queued, not-yet-flushed objects.
    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.engine.num_objects()
    }

    /// Current number of queued, not-yet-flushed references.
    #[must_use]
    pub fn num_references(&self) -> usize {
        self.engine.num_references()
    }

    /// Queue one object for background ingestion, returning its
    /// (possibly freshly generated) UUID.
    pub async fn add_object(&self, object: Object) -> Uuid {
        self.engine.add_object(object, self.collection.clone()).await
    }

    /// Queue one reference for background ingestion.
    pub async fn add_reference(&self, from_uuid: Uuid, from_property: impl Into<String>, to: Reference) {
        self.engine
            .add_reference(from_uuid, from_property, to, self.collection.clone())
            .await;
    }

    /// Force a flush of both queues. `force_wait = true` blocks until
    /// every outstanding send has been classified.
    pub async fn flush(&self, force_wait: bool) {
        self.engine.flush(force_wait).await;
    }

    /// Objects that failed fatally (not retried).
    pub async fn failed_objects(&self) -> Vec<(BatchObject, BatchItemError)> {
        self.engine.failed_objects().await
    }

    /// References that failed fatally (not retried).
    pub async fn failed_references(&self) -> Vec<(BatchReference, BatchItemError)> {
        self.engine.failed_references().await
    }

    /// UUIDs acknowledged successfully so far.
    pub async fn successful_objects(&self) -> Vec<Uuid> {
        self.engine.successful_objects().await
    }

    /// `true` once the dynamic size controller has fallen back to
    /// throughput-only sizing (§9 Open Question (a)).
    #[must_use]
    pub fn using_throughput_fallback(&self) -> bool {
        self.engine.using_throughput_fallback()
    }

    /// Flush everything, then stop the background size-controller task.
    pub async fn close(&self) {
        self.engine.close().await;
    }

    /// Insert `objects` in one RPC call, with no chunking or retry (§2,
    /// §8 scenario B). Independent of the background engine above —
    /// matches the source's single-shot objects path being separate from
    /// its context-managed batch.
    pub async fn insert_many(&self, objects: Vec<Object>) -> Result<BatchResult, Error> {
        wv_batch::insert_many(
            self.object_submitter.as_ref(),
            objects,
            self.collection.clone(),
            self.consistency_level,
        )
        .await
    }
}
