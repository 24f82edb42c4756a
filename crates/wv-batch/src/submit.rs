// SPDX-License-Identifier: MIT OR Apache-2.0
//! The seams between the batch engine and the two transports it drives:
//! RPC `BatchObjects` for objects, REST `POST /v1/batch/references` for
//! references (§4.8 "Reference batching", §6). Kept as traits so the
//! engine's queueing/sizing/retry logic is testable without a live server,
//! the same shape as `wv_auth::TokenExchanger` and
//! `wv_transport::rpc::BearerTokenSource`.

use std::collections::BTreeMap;
use std::time::Duration;
use wv_core::collection::ConsistencyLevel;
use wv_core::{BatchObject, BatchReference};
use wv_error::Error;

/// The outcome of submitting one batch of objects: per-item error
/// messages keyed by position in the submitted slice (absent ⇒ success),
/// plus the wall-clock time the call took (feeds the throughput fallback
/// and the REST/RPC `elapsed`/`took` field).
#[derive(Clone, Debug, Default)]
pub struct ObjectFlushOutcome {
    /// Index (within the submitted slice) → error messages for that item.
    pub per_item_errors: BTreeMap<usize, Vec<String>>,
    /// Wall-clock time the call took.
    pub elapsed: Duration,
}

/// The outcome of submitting one batch of references.
#[derive(Clone, Debug, Default)]
pub struct ReferenceFlushOutcome {
    /// Index (within the submitted slice) → error messages for that item.
    pub per_item_errors: BTreeMap<usize, Vec<String>>,
    /// Wall-clock time the call took.
    pub elapsed: Duration,
}

/// Submits an object batch over the RPC data plane (§4.1, §6
/// `BatchObjects`). A connection-level failure (including a read timeout)
/// must surface as [`Error::Connection`] so the engine can tell it apart
/// from a decoded-but-fatal response (§4.9).
#[async_trait::async_trait]
pub trait ObjectBatchSubmitter: Send + Sync {
    /// Submit `objects` as a single RPC call.
    async fn submit_objects(
        &self,
        objects: &[BatchObject],
        consistency_level: Option<ConsistencyLevel>,
    ) -> Result<ObjectFlushOutcome, Error>;
}

/// Submits a reference batch over the REST control plane
/// (`POST /v1/batch/references`, §6).
#[async_trait::async_trait]
pub trait ReferenceBatchSubmitter: Send + Sync {
    /// Submit `references` as a single REST call.
    async fn submit_references(
        &self,
        references: &[BatchReference],
        consistency_level: Option<ConsistencyLevel>,
    ) -> Result<ReferenceFlushOutcome, Error>;
}

/// `true` for failures the batch engine retries by re-enqueuing the whole
/// batch (§4.8 "Timeouts", §4.9 "Connection failure... retriable at the
/// batch layer with fresh timeout"). Every other error is fatal for the
/// whole flushed batch, since no per-item attribution survives it.
#[must_use]
pub fn is_batch_retriable(err: &Error) -> bool {
    matches!(err, Error::Connection { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_batch_retriable() {
        let err = Error::connection("batch_objects", std::io::Error::other("reset"));
        assert!(is_batch_retriable(&err));
    }

    #[test]
    fn decoded_errors_are_not_batch_retriable() {
        let err = Error::UnexpectedStatus {
            label: "batch_objects".into(),
            status: 500,
            body_snippet: String::new(),
        };
        assert!(!is_batch_retriable(&err));
    }
}
