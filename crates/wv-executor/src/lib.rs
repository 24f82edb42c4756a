// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The uniform call shape shared by the client's synchronous and
//! asynchronous surfaces (§4.4).
//!
//! The source this crate generalizes used a decorator that unwraps
//! duck-typed awaitables at call time, synthesizing a synchronous mirror
//! of one asynchronous implementation. Rust's type system has no
//! equivalent duck-typing at that boundary, so this crate takes the
//! alternative the design allows: one async core ([`AsyncExecutor`]) plus
//! a thin blocking adapter ([`SyncExecutor`]) that drives the same core on
//! an owned runtime. Every I/O-bearing call is written once, against
//! [`AsyncExecutor::execute`]; `wv-client`'s sync façade calls
//! [`SyncExecutor::execute`] instead of duplicating the call graph.
//!
//! Methods that perform no I/O (pure builders, local validation) opt out
//! of this machinery entirely — they are plain functions, not wrapped by
//! either executor.

use std::future::Future;
use wv_error::Error;

/// Runs the core call shape: invoke `method`, then map its result through
/// `on_response` (success) or `on_error` (failure) exactly once.
///
/// This is the async implementation every domain operation is written
/// against directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct AsyncExecutor;

impl AsyncExecutor {
    /// Construct an executor. Stateless — provided for symmetry with
    /// [`SyncExecutor::new`] and so call sites read uniformly.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run `method`, mapping its `Ok` through `on_response` and its `Err`
    /// through `on_error`.
    pub async fn execute<Fut, T, R>(
        &self,
        method: impl FnOnce() -> Fut,
        on_response: impl FnOnce(T) -> R,
        on_error: impl FnOnce(Error) -> Error,
    ) -> Result<R, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        match method().await {
            Ok(value) => Ok(on_response(value)),
            Err(err) => Err(on_error(err)),
        }
    }
}

/// Drives [`AsyncExecutor`] to completion on an owned multi-thread
/// runtime, giving every async operation a synchronous mirror without a
/// second hand-written call graph.
///
/// A client constructed with the sync surface owns one [`SyncExecutor`]
/// for its lifetime; the async surface never constructs one, since it
/// already runs inside the caller's own runtime.
pub struct SyncExecutor {
    runtime: tokio::runtime::Runtime,
    inner: AsyncExecutor,
}

impl SyncExecutor {
    /// Build a dedicated multi-thread runtime for the sync surface.
    pub fn new() -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::connection("sync executor runtime", e))?;
        Ok(Self {
            runtime,
            inner: AsyncExecutor::new(),
        })
    }

    /// Run `method` to completion on this executor's runtime, applying the
    /// same response/error mapping as [`AsyncExecutor::execute`].
    pub fn execute<Fut, T, R>(
        &self,
        method: impl FnOnce() -> Fut,
        on_response: impl FnOnce(T) -> R,
        on_error: impl FnOnce(Error) -> Error,
    ) -> Result<R, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        self.runtime
            .block_on(self.inner.execute(method, on_response, on_error))
    }
}

impl Default for SyncExecutor {
    fn default() -> Self {
        Self::new().expect("failed to build default sync executor runtime")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok_call() -> Result<u32, Error> {
        Ok(7)
    }

    async fn err_call() -> Result<u32, Error> {
        Err(Error::InvalidInput("boom".into()))
    }

    #[tokio::test]
    async fn async_executor_maps_success_through_on_response() {
        let executor = AsyncExecutor::new();
        let result = executor
            .execute(ok_call, |n| n * 2, |e| e)
            .await
            .unwrap();
        assert_eq!(result, 14);
    }

    #[tokio::test]
    async fn async_executor_maps_failure_through_on_error() {
        let executor = AsyncExecutor::new();
        let err = executor
            .execute(err_call, |n: u32| n, |_| Error::ClosedClient)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ClosedClient));
    }

    #[test]
    fn sync_executor_mirrors_the_same_call_graph() {
        let executor = SyncExecutor::new().unwrap();
        let result = executor.execute(ok_call, |n| n + 1, |e| e).unwrap();
        assert_eq!(result, 8);

        let err = executor
            .execute(err_call, |n: u32| n, |e| e)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
