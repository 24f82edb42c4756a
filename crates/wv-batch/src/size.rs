// SPDX-License-Identifier: MIT OR Apache-2.0
//! The dynamic batch-size controller (§4.8 "Dynamic size controller",
//! "Throughput-based fallback", "Timeouts") and its `fixed_size`/
//! `rate_limit` degenerate modes (SPEC_FULL §4.8 supplement).
//!
//! The controller's recommended sizes are plain atomics, consulted
//! lock-free on the submission hot path (§5: "writes a single atomic
//! 'recommended size' consulted lock-free on the hot path"); only the
//! background poll task (Dynamic mode) and flush-completion callbacks
//! (Fixed/RateLimit/fallback) ever write to them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wv_error::Error;

const COLD_START_GROWTH_CAP: f64 = 25.0;
const STEADY_RATIO_LOW: f64 = 1.9;
const STEADY_RATIO_HIGH: f64 = 2.1;
const BACKOFF_RATIO_CEILING: f64 = 10.0;
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const POLL_RETRY_INTERVAL: Duration = Duration::from_millis(100);
const FINAL_DRAIN_SIZE: usize = 10;
const THROUGHPUT_WINDOW: usize = 5;
const THROUGHPUT_GROWTH_CAP: usize = 250;
const THROUGHPUT_DAMPING: f64 = 0.75;

/// A server-reported batch-ingestion rate and queue depth for one node, as
/// surfaced by the cluster-nodes-status endpoint (`batchStats` in the
/// original JSON shape).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStats {
    /// Aggregate objects/sec the node is currently processing.
    pub rate_per_second: f64,
    /// Current depth of the server-side ingestion queue.
    pub queue_length: u64,
}

/// What the poll observed this cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeStatsReading {
    /// The node reported rich stats; the dynamic formula applies.
    Full(NodeStats),
    /// The node status shape is missing `rate_per_second` entirely (older
    /// servers). §9 Open Question (a): the original client falls back to
    /// throughput-only sizing and stops polling node stats for the rest of
    /// the client's lifetime — preserved here verbatim.
    MissingRate,
}

/// Supplies node ingestion stats to the dynamic size controller. Grounded
/// on the `Cluster.get_nodes_status()` collaborator in `original_source/`;
/// implemented over `GET /v1/nodes` in `wv-client`.
#[async_trait::async_trait]
pub trait NodeStatsSource: Send + Sync {
    /// Fetch the current stats for the node this client is bound to.
    async fn node_stats(&self) -> Result<NodeStatsReading, Error>;
}

/// Selects how the controller arrives at a recommended batch size
/// (SPEC_FULL §4.8 supplement: `dynamic()` / `fixed_size()` / `rate_limit()`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Poll node stats and adapt size to observed throughput/congestion,
    /// falling back to sliding-window throughput averaging when the node
    /// doesn't expose `rate_per_second`.
    Dynamic,
    /// A constant recommended size; never adjusted by flush feedback or
    /// timeouts.
    Fixed {
        /// The constant recommended size for both objects and references.
        size: usize,
    },
    /// A constant recommended size, externally capped by a requests-per-
    /// minute budget enforced by the caller between flushes.
    RateLimit {
        /// The constant recommended size for both objects and references.
        size: usize,
        /// Maximum number of batch requests allowed per minute.
        requests_per_minute: u32,
    },
}

/// Tracks the recommended object/reference batch sizes and adjusts them
/// per §4.8. One instance per [`crate::engine::BatchEngine`].
pub struct SizeController {
    mode: Mode,
    num_workers: usize,
    creation_time: Duration,
    recommended_objects: AtomicUsize,
    recommended_references: AtomicUsize,
    using_fallback: AtomicBool,
    objects_throughput: Mutex<VecDeque<f64>>,
    references_throughput: Mutex<VecDeque<f64>>,
}

impl SizeController {
    /// Construct a controller. `read_timeout` derives the fallback
    /// "creation time" window (`min(read_timeout/10, 2s)`, §4.8).
    #[must_use]
    pub fn new(mode: Mode, num_workers: usize, read_timeout: Duration, initial_size: usize) -> Self {
        let creation_time = (read_timeout / 10).min(Duration::from_secs(2));
        let initial = match mode {
            Mode::Dynamic => initial_size,
            Mode::Fixed { size } | Mode::RateLimit { size, .. } => size,
        };
        Self {
            mode,
            num_workers: num_workers.max(1),
            creation_time,
            recommended_objects: AtomicUsize::new(initial),
            recommended_references: AtomicUsize::new(initial),
            using_fallback: AtomicBool::new(false),
            objects_throughput: Mutex::new(VecDeque::with_capacity(THROUGHPUT_WINDOW)),
            references_throughput: Mutex::new(VecDeque::with_capacity(THROUGHPUT_WINDOW)),
        }
    }

    /// The configured mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The requests-per-minute budget in [`Mode::RateLimit`], if any.
    #[must_use]
    pub fn requests_per_minute(&self) -> Option<u32> {
        match self.mode {
            Mode::RateLimit { requests_per_minute, .. } => Some(requests_per_minute),
            _ => None,
        }
    }

    /// Current recommended object batch size, read lock-free.
    #[must_use]
    pub fn recommended_object_size(&self) -> usize {
        self.recommended_objects.load(Ordering::Relaxed)
    }

    /// Current recommended reference batch size, read lock-free.
    #[must_use]
    pub fn recommended_reference_size(&self) -> usize {
        self.recommended_references.load(Ordering::Relaxed)
    }

    /// Whether the controller has fallen back to throughput-only sizing
    /// because the server's node-stats shape lacked `rate_per_second`.
    #[must_use]
    pub fn using_fallback(&self) -> bool {
        self.using_fallback.load(Ordering::Relaxed)
    }

    /// A read timeout occurred on the object flush: halve the recommended
    /// size (floor 1) and leave the batch marked for retry by the caller.
    /// Only `Mode::Dynamic` responds — the fixed modes keep their
    /// configured size regardless of timeouts (SPEC_FULL §4.8 supplement).
    pub fn record_object_timeout(&self) {
        if self.mode != Mode::Dynamic {
            return;
        }
        self.recommended_objects
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_div(2).max(1))
            })
            .ok();
    }

    /// A read timeout occurred on the reference flush.
    pub fn record_reference_timeout(&self) {
        if self.mode != Mode::Dynamic {
            return;
        }
        self.recommended_references
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_div(2).max(1))
            })
            .ok();
    }

    /// A successful object flush completed: feed the throughput fallback
    /// window when the controller has fallen back to it.
    pub fn record_object_success(&self, count: usize, elapsed: Duration) {
        self.record_success(
            count,
            elapsed,
            &self.objects_throughput,
            &self.recommended_objects,
        );
    }

    /// A successful reference flush completed.
    pub fn record_reference_success(&self, count: usize, elapsed: Duration) {
        self.record_success(
            count,
            elapsed,
            &self.references_throughput,
            &self.recommended_references,
        );
    }

    fn record_success(
        &self,
        count: usize,
        elapsed: Duration,
        window: &Mutex<VecDeque<f64>>,
        recommended: &AtomicUsize,
    ) {
        if self.mode != Mode::Dynamic || !self.using_fallback.load(Ordering::Relaxed) {
            return;
        }
        if count == 0 || elapsed.as_secs_f64() <= 0.0 {
            return;
        }
        let throughput = count as f64 / elapsed.as_secs_f64();
        let mut samples = window.lock().expect("throughput window poisoned");
        if samples.len() == THROUGHPUT_WINDOW {
            samples.pop_front();
        }
        samples.push_back(throughput);
        let avg = samples.iter().sum::<f64>() / samples.len() as f64;
        // §4.8: `min(current + 250, avg * creation_time * 0.75)`.
        let damped_target = avg * self.creation_time.as_secs_f64() * THROUGHPUT_DAMPING;
        let current = recommended.load(Ordering::Relaxed);
        let next = (current + THROUGHPUT_GROWTH_CAP).min(damped_target.round() as usize).max(1);
        recommended.store(next, Ordering::Relaxed);
    }

    fn apply_dynamic_formula(&self, stats: NodeStats) {
        let rate = stats.rate_per_second;
        let qlen = stats.queue_length as f64;
        let rate_per_worker = if rate > 0.0 { rate / self.num_workers as f64 } else { 0.0 };

        let next = if qlen == 0.0 {
            let current = self.recommended_objects.load(Ordering::Relaxed) as f64;
            current + (current * 2.0).min(COLD_START_GROWTH_CAP)
        } else if rate <= 0.0 {
            // No throughput signal alongside a non-empty queue: hold steady
            // rather than divide by zero.
            self.recommended_objects.load(Ordering::Relaxed) as f64
        } else {
            let ratio = qlen / rate;
            if ratio > STEADY_RATIO_LOW && ratio < STEADY_RATIO_HIGH {
                rate_per_worker
            } else if ratio <= STEADY_RATIO_LOW {
                let current = self.recommended_objects.load(Ordering::Relaxed) as f64;
                (current * 1.5).min(rate_per_worker * 2.0 / ratio)
            } else if ratio < BACKOFF_RATIO_CEILING {
                rate_per_worker * 2.0 / ratio
            } else {
                0.0
            }
        };

        let next = next.max(0.0).round() as usize;
        self.recommended_objects.store(next, Ordering::Relaxed);
        self.recommended_references.store(next, Ordering::Relaxed);
    }
}

/// Handle to the background poll task. Dropping this handle does not stop
/// the task — call [`SizeControllerHandle::shutdown`] explicitly.
pub struct SizeControllerHandle {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SizeControllerHandle {
    /// Signal the poll loop to stop and wait for it to exit, leaving the
    /// recommended size at a small positive value so a final flush drains
    /// (§4.8 "On shutdown").
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

/// Spawn the background poll task for [`Mode::Dynamic`]. The fixed modes
/// never call this — their recommended size is set once, at construction.
pub fn spawn_poll(controller: Arc<SizeController>, stats: Arc<dyn NodeStatsSource>) -> SizeControllerHandle {
    debug_assert_eq!(controller.mode, Mode::Dynamic);
    let shutdown = Arc::new(Notify::new());
    let task_shutdown = shutdown.clone();

    let task = tokio::spawn(async move {
        let mut interval = POLL_INTERVAL;
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = task_shutdown.notified() => break,
            }

            match stats.node_stats().await {
                Ok(NodeStatsReading::Full(node_stats)) => {
                    controller.apply_dynamic_formula(node_stats);
                    interval = POLL_INTERVAL;
                }
                Ok(NodeStatsReading::MissingRate) => {
                    debug!(
                        target: "weaviate.batch.size",
                        "node stats missing rate_per_second, falling back to throughput-only sizing"
                    );
                    controller.using_fallback.store(true, Ordering::Relaxed);
                    break;
                }
                Err(err) => {
                    warn!(target: "weaviate.batch.size", error = %err, "node stats poll failed, retrying soon");
                    interval = POLL_RETRY_INTERVAL;
                }
            }
        }
        controller
            .recommended_objects
            .store(FINAL_DRAIN_SIZE, Ordering::Relaxed);
    });

    SizeControllerHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_grows_from_empty_queue() {
        let controller = SizeController::new(Mode::Dynamic, 1, Duration::from_secs(30), 10);
        controller.apply_dynamic_formula(NodeStats {
            rate_per_second: 100.0,
            queue_length: 0,
        });
        assert_eq!(controller.recommended_object_size(), 30); // 10 + min(20, 25)
    }

    #[test]
    fn steady_state_matches_rate_per_worker() {
        let controller = SizeController::new(Mode::Dynamic, 2, Duration::from_secs(30), 10);
        controller.apply_dynamic_formula(NodeStats {
            rate_per_second: 100.0,
            queue_length: 200, // ratio == 2.0
        });
        assert_eq!(controller.recommended_object_size(), 50); // 100/2
    }

    #[test]
    fn severe_backlog_stops_accepting() {
        let controller = SizeController::new(Mode::Dynamic, 1, Duration::from_secs(30), 10);
        controller.apply_dynamic_formula(NodeStats {
            rate_per_second: 10.0,
            queue_length: 200, // ratio == 20
        });
        assert_eq!(controller.recommended_object_size(), 0);
    }

    #[test]
    fn timeout_halves_size_with_floor_one() {
        let controller = SizeController::new(Mode::Dynamic, 1, Duration::from_secs(30), 2);
        controller.record_object_timeout();
        assert_eq!(controller.recommended_object_size(), 1);
        controller.record_object_timeout();
        assert_eq!(controller.recommended_object_size(), 1);
    }

    #[test]
    fn fixed_mode_ignores_timeouts() {
        let controller = SizeController::new(Mode::Fixed { size: 50 }, 1, Duration::from_secs(30), 0);
        controller.record_object_timeout();
        assert_eq!(controller.recommended_object_size(), 50);
    }

    #[test]
    fn rate_limit_mode_carries_its_budget() {
        let controller = SizeController::new(
            Mode::RateLimit { size: 20, requests_per_minute: 600 },
            1,
            Duration::from_secs(30),
            0,
        );
        assert_eq!(controller.recommended_object_size(), 20);
        assert_eq!(controller.requests_per_minute(), Some(600));
    }
}
