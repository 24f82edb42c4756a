// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ReplicateOperation` — immutable once created; cancellation is a
//! terminal state transition (§3).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a replicate operation copies a shard replica or moves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferType {
    /// Source replica is retained; a new one is created on the target.
    Copy,
    /// Source replica is removed once the target is caught up.
    Move,
}

/// Lifecycle state of a replicate operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicateStatus {
    /// Queued, not yet started.
    Registered,
    /// Actively copying/moving data.
    Hydrating,
    /// Data transfer complete, finalizing.
    Finalizing,
    /// Completed successfully. Terminal.
    Ready,
    /// Cancelled by request. Terminal.
    Cancelled,
}

impl ReplicateStatus {
    /// Returns `true` if this status is terminal (no further transitions).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ReplicateStatus::Ready | ReplicateStatus::Cancelled)
    }
}

/// A single history entry in a replicate operation's lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateStatusEntry {
    /// Status at this point in the history.
    pub status: ReplicateStatus,
    /// ISO-8601 timestamp of the transition.
    pub timestamp: String,
}

/// A shard-replication operation, immutable except for its `status` and
/// `status_history` fields, which only the server advances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicateOperation {
    /// Operation identifier.
    pub uuid: Uuid,
    /// Collection the replicated shard belongs to.
    pub collection: String,
    /// Shard name being replicated.
    pub shard: String,
    /// Node currently holding the replica.
    pub source_node: String,
    /// Node the replica is being copied/moved to.
    pub target_node: String,
    /// Whether this is a copy or a move.
    pub transfer_type: TransferType,
    /// Current status.
    pub status: ReplicateStatus,
    /// Full status transition history, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_history: Option<Vec<ReplicateStatusEntry>>,
}

impl ReplicateOperation {
    /// Returns `true` if this operation can still be cancelled (i.e. its
    /// status is not already terminal).
    #[must_use]
    pub fn is_cancellable(&self) -> bool {
        !self.status.is_terminal()
    }
}
