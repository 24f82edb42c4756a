// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Pure encoders from the transport-agnostic [`wv_core::filter::Filter`]
//! tree onto each wire format the client speaks (§4.5).
//!
//! Both encoders are pure functions with no I/O; the caller picks one
//! based on the capability gate and the transport the surrounding
//! operation is using.

/// RPC `Filters` message encoder.
pub mod rpc;
/// Legacy REST/GraphQL JSON encoder.
pub mod rest;

pub use rest::reject_unsupported_reference_traversal;
