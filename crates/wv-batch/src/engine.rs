// SPDX-License-Identifier: MIT OR Apache-2.0
//! The batch engine (§4.8): the producer queues, the worker pool driving
//! flushes, the dynamic size controller, and the retry/fatal
//! classification of per-item responses.
//!
//! This is the background, multi-producer engine behind `with
//! client.batch: ...` in the source — `add_object`/`add_reference` return
//! immediately with a (possibly freshly generated) UUID, and results
//! surface later via [`BatchEngine::failed_objects`]/
//! [`BatchEngine::failed_references`]. The single-shot `insert_many` path
//! (§2 data flow, §8 scenario B) is a different, simpler call —
//! [`insert_many`] — that submits its whole input in one RPC call with no
//! chunking or retry, matching the source's `_BatchGRPC.objects()` being
//! independent of `_Batch`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::warn;
use uuid::Uuid;
use wv_core::collection::ConsistencyLevel;
use wv_core::object::Object;
use wv_core::{BatchItemError, BatchItemOutcome, BatchObject, BatchReference, BatchResult, Reference};
use wv_error::Error;

use crate::classify::ErrorClassifier;
use crate::pool::WorkerPool;
use crate::queue::{ObjectQueue, ReferenceQueue};
use crate::size::{self, Mode, NodeStatsSource, SizeController, SizeControllerHandle};
use crate::submit::{is_batch_retriable, ObjectBatchSubmitter, ReferenceBatchSubmitter};

type ObjectFlushTask = (Vec<BatchObject>, Result<crate::submit::ObjectFlushOutcome, Error>);
type ReferenceFlushTask = (Vec<BatchReference>, Result<crate::submit::ReferenceFlushOutcome, Error>);

const THROTTLE_POLL: Duration = Duration::from_secs(1);

/// Configuration the engine is constructed with; one per
/// `Client`/`with_tenant` scope.
#[derive(Clone)]
pub struct BatchEngineConfig {
    /// Size of the bounded worker pool (§4.8 "Workers"). Default 1.
    pub num_workers: usize,
    /// Sizing strategy (§4.8, SPEC_FULL supplement).
    pub mode: Mode,
    /// Read timeout, used to derive the throughput-fallback creation-time
    /// window.
    pub read_timeout: Duration,
    /// Consistency level attached to every flush.
    pub consistency_level: Option<ConsistencyLevel>,
    /// Retry/fatal classification rules.
    pub classifier: ErrorClassifier,
    /// Starting recommended size before the first poll/flush feedback.
    pub initial_batch_size: usize,
}

impl Default for BatchEngineConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            mode: Mode::Dynamic,
            read_timeout: Duration::from_secs(90),
            consistency_level: None,
            classifier: ErrorClassifier::new(),
            initial_batch_size: 50,
        }
    }
}

/// The adaptive, concurrent batch ingestion engine (§4.8).
pub struct BatchEngine {
    objects: ObjectQueue,
    references: ReferenceQueue,
    next_index: AtomicUsize,
    size: Arc<SizeController>,
    size_handle: AsyncMutex<Option<SizeControllerHandle>>,
    object_pool: AsyncMutex<WorkerPool<ObjectFlushTask>>,
    reference_pool: AsyncMutex<WorkerPool<ReferenceFlushTask>>,
    object_submitter: Arc<dyn ObjectBatchSubmitter>,
    reference_submitter: Arc<dyn ReferenceBatchSubmitter>,
    stats_source: Option<Arc<dyn NodeStatsSource>>,
    consistency_level: Option<ConsistencyLevel>,
    classifier: ErrorClassifier,
    successful_objects: AsyncMutex<Vec<Uuid>>,
    failed_objects: AsyncMutex<Vec<(BatchObject, BatchItemError)>>,
    failed_references: AsyncMutex<Vec<(BatchReference, BatchItemError)>>,
}

impl BatchEngine {
    /// Construct an engine. `stats_source` is consulted only in
    /// [`Mode::Dynamic`]; the fixed modes never poll it.
    pub fn new(
        config: BatchEngineConfig,
        object_submitter: Arc<dyn ObjectBatchSubmitter>,
        reference_submitter: Arc<dyn ReferenceBatchSubmitter>,
        stats_source: Option<Arc<dyn NodeStatsSource>>,
    ) -> Self {
        let size = Arc::new(SizeController::new(
            config.mode,
            config.num_workers,
            config.read_timeout,
            config.initial_batch_size,
        ));
        Self {
            objects: ObjectQueue::new(),
            references: ReferenceQueue::new(),
            next_index: AtomicUsize::new(0),
            size,
            size_handle: AsyncMutex::new(None),
            object_pool: AsyncMutex::new(WorkerPool::new(config.num_workers)),
            reference_pool: AsyncMutex::new(WorkerPool::new(config.num_workers)),
            object_submitter,
            reference_submitter,
            stats_source,
            consistency_level: config.consistency_level,
            classifier: config.classifier,
            successful_objects: AsyncMutex::new(Vec::new()),
            failed_objects: AsyncMutex::new(Vec::new()),
            failed_references: AsyncMutex::new(Vec::new()),
        }
    }

    /// Start the background size-controller poll task, if one applies
    /// (§4.8; no-op and idempotent for the fixed modes or if already
    /// started).
    pub async fn start(&self) {
        if self.size.mode() != Mode::Dynamic {
            return;
        }
        let Some(stats) = self.stats_source.clone() else {
            return;
        };
        let mut handle = self.size_handle.lock().await;
        if handle.is_some() {
            return;
        }
        *handle = Some(size::spawn_poll(self.size.clone(), stats));
    }

    /// Current number of queued, not-yet-flushed objects.
    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Current number of queued, not-yet-flushed references.
    #[must_use]
    pub fn num_references(&self) -> usize {
        self.references.len()
    }

    /// Add one object, assigning a fresh UUID if the caller didn't supply
    /// one, and returning it (§3, §4.8 "Accept `add_object`... from many
    /// producers").
    pub async fn add_object(&self, mut object: Object, collection: impl Into<String>) -> Uuid {
        let uuid = object.uuid.unwrap_or_else(Uuid::new_v4);
        object.uuid = Some(uuid);
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        self.objects.push(BatchObject {
            index,
            object,
            collection: collection.into(),
        });
        self.maybe_auto_create().await;
        uuid
    }

    /// Add one reference (§4.8).
    pub async fn add_reference(
        &self,
        from_uuid: Uuid,
        from_property: impl Into<String>,
        to: Reference,
        collection: impl Into<String>,
    ) {
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        self.references.push(BatchReference {
            index,
            from_uuid,
            from_property: from_property.into(),
            to,
            collection: collection.into(),
        });
        self.maybe_auto_create().await;
    }

    /// The auto-create trigger (§4.8): fires once either queue reaches its
    /// recommended size, blocking new submissions while the recommended
    /// size is `0` (server-overload throttle) before kicking off a
    /// non-blocking flush.
    async fn maybe_auto_create(&self) {
        if self.objects.len() < self.size.recommended_object_size()
            && self.references.len() < self.size.recommended_reference_size()
        {
            return;
        }
        while self.size.recommended_object_size() == 0 {
            tokio::time::sleep(THROTTLE_POLL).await;
        }
        self.flush(false).await;
    }

    /// Drain both queues and submit them. When `force_wait` is `false` and
    /// the worker pool isn't yet at capacity, this returns as soon as the
    /// sends are spawned; otherwise it waits for every outstanding send
    /// and applies retry/fatal classification to the results.
    ///
    /// References only go out once the objects flush they followed has
    /// been acknowledged (§4.8 "Reference batching"), so they are spawned
    /// only on the waiting path.
    pub async fn flush(&self, force_wait: bool) {
        let objects_batch = self.objects.drain();
        if !objects_batch.is_empty() {
            let submitter = self.object_submitter.clone();
            let consistency = self.consistency_level;
            let mut pool = self.object_pool.lock().await;
            pool.spawn(async move {
                let result = submitter.submit_objects(&objects_batch, consistency).await;
                (objects_batch, result)
            });
        }

        let mut object_pool = self.object_pool.lock().await;
        if object_pool.should_wait(force_wait) {
            let outcomes = object_pool.join_outstanding().await;
            drop(object_pool);
            for (batch, result) in outcomes {
                self.classify_object_outcome(batch, result).await;
            }

            let references_batch = self.references.drain();
            if !references_batch.is_empty() {
                let submitter = self.reference_submitter.clone();
                let consistency = self.consistency_level;
                let mut pool = self.reference_pool.lock().await;
                pool.spawn(async move {
                    let result = submitter.submit_references(&references_batch, consistency).await;
                    (references_batch, result)
                });
            }
            let mut reference_pool = self.reference_pool.lock().await;
            if reference_pool.should_wait(force_wait) {
                let outcomes = reference_pool.join_outstanding().await;
                drop(reference_pool);
                for (batch, result) in outcomes {
                    self.classify_reference_outcome(batch, result).await;
                }
            }
        }
    }

    async fn classify_object_outcome(
        &self,
        batch: Vec<BatchObject>,
        result: Result<crate::submit::ObjectFlushOutcome, Error>,
    ) {
        let batch_len = batch.len();
        match result {
            Ok(outcome) => {
                let mut retried = 0usize;
                for (index, item) in batch.into_iter().enumerate() {
                    match outcome.per_item_errors.get(&index) {
                        None => {
                            let uuid = item.object.uuid.expect("uuid assigned in add_object");
                            self.successful_objects.lock().await.push(uuid);
                        }
                        Some(messages) => {
                            if self.classifier.should_retry(messages) {
                                retried += 1;
                                self.objects.push(item);
                            } else {
                                let error = BatchItemError::new(messages.join("; "));
                                self.failed_objects.lock().await.push((item, error));
                            }
                        }
                    }
                }
                self.size.record_object_success(batch_len - retried, outcome.elapsed);
            }
            Err(err) if is_batch_retriable(&err) => {
                warn!(target: "weaviate.batch", error = %err, count = batch_len, "object flush timed out, requeuing");
                self.size.record_object_timeout();
                for item in batch {
                    self.objects.push(item);
                }
            }
            Err(err) => {
                let message = err.to_string();
                for item in batch {
                    let error = BatchItemError::new(message.clone());
                    self.failed_objects.lock().await.push((item, error));
                }
            }
        }
    }

    async fn classify_reference_outcome(
        &self,
        batch: Vec<BatchReference>,
        result: Result<crate::submit::ReferenceFlushOutcome, Error>,
    ) {
        let batch_len = batch.len();
        match result {
            Ok(outcome) => {
                let mut retried = 0usize;
                for (index, item) in batch.into_iter().enumerate() {
                    if let Some(messages) = outcome.per_item_errors.get(&index) {
                        if self.classifier.should_retry(messages) {
                            retried += 1;
                            self.references.push(item);
                        } else {
                            let error = BatchItemError::new(messages.join("; "));
                            self.failed_references.lock().await.push((item, error));
                        }
                    }
                }
                self.size.record_reference_success(batch_len - retried, outcome.elapsed);
            }
            Err(err) if is_batch_retriable(&err) => {
                warn!(target: "weaviate.batch", error = %err, count = batch_len, "reference flush timed out, requeuing");
                self.size.record_reference_timeout();
                for item in batch {
                    self.references.push(item);
                }
            }
            Err(err) => {
                let message = err.to_string();
                for item in batch {
                    let error = BatchItemError::new(message.clone());
                    self.failed_references.lock().await.push((item, error));
                }
            }
        }
    }

    /// Snapshot of objects that failed fatally (not retried).
    pub async fn failed_objects(&self) -> Vec<(BatchObject, BatchItemError)> {
        self.failed_objects.lock().await.clone()
    }

    /// Snapshot of references that failed fatally (not retried).
    pub async fn failed_references(&self) -> Vec<(BatchReference, BatchItemError)> {
        self.failed_references.lock().await.clone()
    }

    /// Snapshot of object UUIDs that have been acknowledged successfully.
    pub async fn successful_objects(&self) -> Vec<Uuid> {
        self.successful_objects.lock().await.clone()
    }

    /// `true` once the recommended size has fallen back to throughput-only
    /// sizing (§9 Open Question (a)).
    #[must_use]
    pub fn using_throughput_fallback(&self) -> bool {
        self.size.using_fallback()
    }

    /// Flush everything, then stop the background size-controller task.
    /// Mirrors `with client.batch: ...`'s `__exit__` (flush, then
    /// shutdown).
    pub async fn close(&self) {
        self.flush(true).await;
        if let Some(handle) = self.size_handle.lock().await.take() {
            handle.shutdown().await;
        }
    }
}

/// The single-shot `insert_many` path (§2 data flow, §8 scenario B): one
/// RPC call for the whole input, no chunking, no retry — matching the
/// source's `_BatchGRPC.objects()`. Order is preserved exactly
/// (§8 item 3): `result.all_responses[i]` corresponds to `objects[i]`.
pub async fn insert_many(
    submitter: &dyn ObjectBatchSubmitter,
    objects: Vec<Object>,
    collection: impl Into<String>,
    consistency_level: Option<ConsistencyLevel>,
) -> Result<BatchResult, Error> {
    let collection = collection.into();
    let start = Instant::now();
    let batch: Vec<BatchObject> = objects
        .into_iter()
        .enumerate()
        .map(|(index, mut object)| {
            let uuid = object.uuid.unwrap_or_else(Uuid::new_v4);
            object.uuid = Some(uuid);
            BatchObject {
                index,
                object,
                collection: collection.clone(),
            }
        })
        .collect();

    let outcome = submitter.submit_objects(&batch, consistency_level).await?;
    let elapsed_seconds = start.elapsed().as_secs_f64();

    let outcomes = batch
        .iter()
        .enumerate()
        .map(|(index, item)| match outcome.per_item_errors.get(&index) {
            None => BatchItemOutcome::Success(item.object.uuid.expect("uuid assigned above")),
            Some(messages) => BatchItemOutcome::Failure(BatchItemError::new(messages.join("; "))),
        })
        .collect();

    Ok(BatchResult::from_outcomes(outcomes, elapsed_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submit::{ObjectFlushOutcome, ReferenceFlushOutcome};
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicU32;
    use wv_core::object::PropertyValue;

    struct ScriptedObjectSubmitter {
        calls: AtomicU32,
        /// Returns one scripted outcome per call, indexed by call count.
        scripts: Vec<Result<BTreeMap<usize, Vec<String>>, ()>>,
    }

    #[async_trait::async_trait]
    impl ObjectBatchSubmitter for ScriptedObjectSubmitter {
        async fn submit_objects(
            &self,
            objects: &[BatchObject],
            _consistency_level: Option<ConsistencyLevel>,
        ) -> Result<ObjectFlushOutcome, Error> {
            let _ = objects;
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            match self.scripts.get(call) {
                Some(Ok(per_item_errors)) => Ok(ObjectFlushOutcome {
                    per_item_errors: per_item_errors.clone(),
                    elapsed: Duration::from_millis(10),
                }),
                Some(Err(())) => Err(Error::UnexpectedStatus {
                    label: "batch_objects".into(),
                    status: 500,
                    body_snippet: String::new(),
                }),
                None => Ok(ObjectFlushOutcome {
                    per_item_errors: BTreeMap::new(),
                    elapsed: Duration::from_millis(1),
                }),
            }
        }
    }

    struct NoReferences;

    #[async_trait::async_trait]
    impl ReferenceBatchSubmitter for NoReferences {
        async fn submit_references(
            &self,
            _references: &[BatchReference],
            _consistency_level: Option<ConsistencyLevel>,
        ) -> Result<ReferenceFlushOutcome, Error> {
            Ok(ReferenceFlushOutcome::default())
        }
    }

    fn object_with(name: &str) -> Object {
        Object::new().with_property("name", PropertyValue::Text(name.to_string()))
    }

    #[tokio::test]
    async fn insert_many_preserves_order_and_partitions_errors() {
        let mut errors = BTreeMap::new();
        errors.insert(0, vec!["wrong_name".to_string()]);
        errors.insert(2, vec!["wrong_name".to_string()]);
        let submitter = ScriptedObjectSubmitter {
            calls: AtomicU32::new(0),
            scripts: vec![Ok(errors)],
        };

        let objects = vec![object_with("a"), object_with("b"), object_with("c")];
        let result = insert_many(&submitter, objects, "Article", None).await.unwrap();

        assert_eq!(result.all_responses.len(), 3);
        assert_eq!(result.errors.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(result.uuids.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert!(result.has_errors());
    }

    #[tokio::test]
    async fn fatal_flush_error_marks_every_item_failed() {
        let submitter = Arc::new(ScriptedObjectSubmitter {
            calls: AtomicU32::new(0),
            scripts: vec![Err(())],
        });
        let engine = BatchEngine::new(
            BatchEngineConfig {
                mode: Mode::Fixed { size: 2 },
                ..BatchEngineConfig::default()
            },
            submitter,
            Arc::new(NoReferences),
            None,
        );

        engine.add_object(object_with("a"), "Article").await;
        engine.add_object(object_with("b"), "Article").await;
        engine.flush(true).await;

        let failed = engine.failed_objects().await;
        assert_eq!(failed.len(), 2);
        assert!(engine.successful_objects().await.is_empty());
    }

    #[tokio::test]
    async fn retriable_errors_are_requeued_then_succeed() {
        let mut first_errors = BTreeMap::new();
        first_errors.insert(0, vec!["connection reset".to_string()]);
        let submitter = Arc::new(ScriptedObjectSubmitter {
            calls: AtomicU32::new(0),
            scripts: vec![Ok(first_errors), Ok(BTreeMap::new())],
        });
        let engine = BatchEngine::new(
            BatchEngineConfig {
                mode: Mode::Fixed { size: 10 },
                ..BatchEngineConfig::default()
            },
            submitter,
            Arc::new(NoReferences),
            None,
        );

        engine.add_object(object_with("a"), "Article").await;
        engine.flush(true).await;
        assert_eq!(engine.num_objects(), 1, "retriable item requeued");
        assert!(engine.failed_objects().await.is_empty());

        engine.flush(true).await;
        assert_eq!(engine.successful_objects().await.len(), 1);
    }
}
