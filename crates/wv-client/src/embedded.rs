// SPDX-License-Identifier: MIT OR Apache-2.0
//! The embedded-server collaborator interface (§1, §9).
//!
//! Embedded-server supervision is an external lifecycle collaborator: this
//! module defines the trait [`Client::connect`](crate::Client::connect)
//! consults, not a process supervisor. Callers who want an embedded server
//! implement [`EmbeddedServer`] themselves (spawning and watching a child
//! process, a container, or a test fixture) and hand it to
//! [`crate::Client::with_embedded`].

use async_trait::async_trait;
use wv_error::Error;

/// A started-or-startable local server instance, consulted by
/// [`crate::Client::connect`]/[`crate::Client::close`] but never implemented
/// here — no process-supervision code lives in this crate (§1 Non-goals).
#[async_trait]
pub trait EmbeddedServer: Send + Sync {
    /// Ensure the server is running and ready to accept connections.
    /// Called once, before OIDC discovery and version probing.
    async fn start(&self) -> Result<(), Error>;

    /// Tear down the server. Called as the last step of
    /// [`crate::Client::close`], after the RPC channel, HTTP pool, and
    /// refresh scheduler have already stopped.
    async fn stop(&self) -> Result<(), Error>;
}
