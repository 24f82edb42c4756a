// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
//! In-process mock HTTP/RPC server and data-model fixtures shared by
//! integration tests across the workspace (SPEC_FULL "Test tooling" /
//! workspace-layout entry). Not published; `dev-dependencies` only.
//!
//! Grounded on the teacher's `tests/` harness and its direct `wiremock`
//! usage: the REST half here is a thin set of reusable stub builders over
//! the same `wiremock` crate every other crate already uses inline, and
//! the RPC half adds the equivalent for the gRPC plane, which `wiremock`
//! itself can't stub.

/// Fixture data (collections, objects, property maps) for common test
/// scenarios.
pub mod fixtures;
/// `wiremock` stub builders for the REST control plane.
pub mod http;
/// In-process mock `weaviate.v1.Weaviate` gRPC server.
pub mod rpc;

pub use rpc::{spawn, MockServerHandle, MockWeaviate};
