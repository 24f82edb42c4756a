// SPDX-License-Identifier: MIT OR Apache-2.0
//! The bounded worker pool servicing flushes (§4.8 "Workers", §5: "Batch
//! engine workers run on a bounded thread pool (sync) or task group
//! (async)").
//!
//! A flush always spawns its send onto the pool. When fewer than
//! `num_workers` sends are outstanding and the caller did not force a
//! wait, the spawning call returns immediately; otherwise it joins every
//! outstanding send before returning, matching the source's
//! `ThreadPoolExecutor` + `as_completed` shape.

use std::future::Future;
use tokio::task::JoinHandle;

/// A pool of at most `num_workers` concurrently outstanding flush sends.
/// Generic over the per-send outcome type `T` so it serves both the
/// object-flush and reference-flush pipelines.
pub struct WorkerPool<T: Send + 'static> {
    num_workers: usize,
    outstanding: Vec<JoinHandle<T>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Construct a pool bounded at `num_workers` (minimum 1).
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            outstanding: Vec::new(),
        }
    }

    /// The pool's configured worker count.
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Number of sends currently in flight.
    #[must_use]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    /// Spawn `send` onto the pool's task group, tracking its handle.
    pub fn spawn(&mut self, send: impl Future<Output = T> + Send + 'static)
    where
        T: 'static,
    {
        self.outstanding.push(tokio::spawn(send));
    }

    /// Whether the caller should block for outstanding sends before
    /// returning from this flush: always when `force_wait` is set
    /// (`flush()`/context-manager exit), otherwise once the pool is at
    /// capacity.
    #[must_use]
    pub fn should_wait(&self, force_wait: bool) -> bool {
        force_wait || self.outstanding.len() >= self.num_workers
    }

    /// Await every outstanding send and return their outcomes in
    /// completion order, clearing the pool. A panicked task is dropped
    /// from the results (outstanding joins aren't expected to panic —
    /// sends themselves are fallible `Result`s, not panics).
    pub async fn join_outstanding(&mut self) -> Vec<T> {
        let handles = std::mem::take(&mut self.outstanding);
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(value) = handle.await {
                results.push(value);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn does_not_wait_below_capacity() {
        let mut pool: WorkerPool<u32> = WorkerPool::new(4);
        pool.spawn(async { 1 });
        assert!(!pool.should_wait(false));
        assert!(pool.should_wait(true));
    }

    #[tokio::test]
    async fn waits_once_at_capacity() {
        let mut pool: WorkerPool<u32> = WorkerPool::new(2);
        pool.spawn(async { 1 });
        pool.spawn(async { 2 });
        assert!(pool.should_wait(false));
        let results = pool.join_outstanding().await;
        assert_eq!(results.len(), 2);
        assert_eq!(pool.outstanding_count(), 0);
    }
}
