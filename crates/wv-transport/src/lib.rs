// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Dual transport shared by every Weaviate client call (§4.1): a JSON/HTTP
//! control plane for schema, batch REST fallback, backup, and admin calls,
//! and a binary RPC data plane for search, batch ingestion, and (on newer
//! servers) aggregation.
//!
//! Both planes are colour-neutral: callers drive them from either a sync
//! or async façade (see `wv-executor`) and neither module spawns its own
//! runtime.

/// Connect-time readiness/liveness probing.
pub mod health;
/// JSON/HTTP control-plane transport.
pub mod http;
/// Binary RPC data-plane transport.
pub mod rpc;

pub use health::{probe, server_version, HealthStatus};
pub use http::{HttpResponse, HttpTransport};
pub use rpc::{weaviate, BearerTokenSource, NoAuth, RpcTransport};
