// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Data model shared by every layer of the Weaviate client runtime.
//!
//! This crate has no knowledge of HTTP or RPC — it defines the types that
//! flow across those transports: collections, properties, objects,
//! references, tenants, the filter AST, batch results, roles/permissions,
//! and replication operations. Encoding these types onto the wire lives in
//! `wv-filter` (filters) and `wv-search` (search requests/results); sending
//! them lives in `wv-transport`.

/// Beacon URIs and reference targets (`weaviate://localhost/...`).
pub mod beacon;
/// Batch request/result types and the per-item error used for partitioning.
pub mod batch;
/// `Collection` handle and its config snapshot.
pub mod collection;
/// RFC-3339 date-time parsing that tolerates the server's trimmed form.
pub mod datetime;
/// The filter AST (`And`/`Or`/`Value`) shared by both wire encoders.
pub mod filter;
/// `MetadataReturn` and its independently-optional fields.
pub mod metadata;
/// `Object`, `Reference`, and the open-record `PropertyValue` union.
pub mod object;
/// `Property` and `DataType`.
pub mod property;
/// `ReplicateOperation` and its transfer/status types.
pub mod replicate;
/// `Role` and `Permission`.
pub mod role;
/// `Tenant` and `ActivityStatus`.
pub mod tenant;

pub use batch::{BatchItemError, BatchItemOutcome, BatchObject, BatchReference, BatchRequest, BatchResult};
pub use beacon::Beacon;
pub use collection::{Collection, CollectionConfig, ConsistencyLevel};
pub use filter::{Filter, FilterTarget, Operator, ReferenceTarget};
pub use metadata::MetadataReturn;
pub use object::{Object, PropertyValue, Reference};
pub use property::{DataType, Property, ScalarType};
pub use replicate::{ReplicateOperation, ReplicateStatus, TransferType};
pub use role::{Permission, PermissionDomain, Role};
pub use tenant::{ActivityStatus, Tenant};
