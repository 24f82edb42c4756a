// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The adaptive batch ingestion engine (§4.8): producer queues, a dynamic
//! size controller, a bounded worker pool driving flushes, and the
//! retry/fatal classification of per-item responses.
//!
//! This crate has no knowledge of how objects/references reach the wire —
//! it drives the [`submit::ObjectBatchSubmitter`]/
//! [`submit::ReferenceBatchSubmitter`] traits that `wv-client` implements
//! over `wv-transport`. [`engine::insert_many`] is the separate, simpler
//! one-shot bulk-insert path that bypasses queueing entirely.

/// Retry/fatal classification of per-item batch errors.
pub mod classify;
/// `BatchEngine`, the orchestrator, and the one-shot `insert_many` path.
pub mod engine;
/// The bounded worker pool driving flush sends.
pub mod pool;
/// The object/reference producer queues.
pub mod queue;
/// The dynamic size controller and its fixed/rate-limited degenerate modes.
pub mod size;
/// The transport seam traits the engine drives.
pub mod submit;

pub use classify::ErrorClassifier;
pub use engine::{insert_many, BatchEngine, BatchEngineConfig};
pub use pool::WorkerPool;
pub use queue::{ObjectQueue, ReferenceQueue};
pub use size::{Mode, NodeStats, NodeStatsReading, NodeStatsSource, SizeController, SizeControllerHandle};
pub use submit::{is_batch_retriable, ObjectBatchSubmitter, ObjectFlushOutcome, ReferenceBatchSubmitter, ReferenceFlushOutcome};
