// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Tenant` and its activity status (§3).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tenant's activity status. `Hot`/`Cold` are legacy aliases of
/// `Active`/`Inactive` kept for wire compatibility with older servers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityStatus {
    /// Tenant's shard is loaded and serving traffic.
    Active,
    /// Tenant's shard is unloaded but retrievable.
    Inactive,
    /// Tenant's shard has been moved to cold/offloaded storage.
    Offloaded,
    /// Legacy alias of [`ActivityStatus::Active`].
    #[serde(rename = "HOT")]
    Hot,
    /// Legacy alias of [`ActivityStatus::Inactive`].
    #[serde(rename = "COLD")]
    Cold,
    /// Transitioning from `Inactive`/`Offloaded` to `Active`. Read-only.
    Activating,
    /// Transitioning from `Active` to `Inactive`. Read-only.
    Deactivating,
    /// Transitioning to `Offloaded`. Read-only.
    Offloading,
    /// Transitioning from `Offloaded` back to `Active`. Read-only.
    Onloading,
}

impl ActivityStatus {
    /// Normalize a legacy alias to its canonical status.
    #[must_use]
    pub fn canonical(self) -> Self {
        match self {
            ActivityStatus::Hot => ActivityStatus::Active,
            ActivityStatus::Cold => ActivityStatus::Inactive,
            other => other,
        }
    }

    /// Returns `true` if this status may be supplied on create/update.
    /// Transitional and offloaded-readonly statuses may not (§3).
    #[must_use]
    pub fn is_writable(self) -> bool {
        matches!(
            self.canonical(),
            ActivityStatus::Active | ActivityStatus::Inactive | ActivityStatus::Offloaded
        )
    }
}

/// Raised when a read-only [`ActivityStatus`] is supplied to a writer.
#[derive(Debug, Clone, Error)]
#[error("activity status {0:?} is read-only and cannot be set directly")]
pub struct ReadOnlyStatusError(pub ActivityStatus);

/// A logical partition within a multi-tenant collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant name, unique within the collection.
    pub name: String,
    /// Current (or desired, on create/update) activity status.
    pub activity_status: ActivityStatus,
}

impl Tenant {
    /// Construct a tenant in the given status, rejecting read-only statuses.
    pub fn new(
        name: impl Into<String>,
        activity_status: ActivityStatus,
    ) -> Result<Self, ReadOnlyStatusError> {
        if !activity_status.is_writable() {
            return Err(ReadOnlyStatusError(activity_status));
        }
        Ok(Self {
            name: name.into(),
            activity_status,
        })
    }

    /// Construct an active tenant — the common case.
    #[must_use]
    pub fn active(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            activity_status: ActivityStatus::Active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_readonly_status_on_create() {
        let err = Tenant::new("T1", ActivityStatus::Activating).unwrap_err();
        assert_eq!(err.0, ActivityStatus::Activating);
    }

    #[test]
    fn legacy_aliases_normalize() {
        assert_eq!(ActivityStatus::Hot.canonical(), ActivityStatus::Active);
        assert_eq!(ActivityStatus::Cold.canonical(), ActivityStatus::Inactive);
        assert!(ActivityStatus::Hot.is_writable());
    }

    #[test]
    fn accepts_writable_statuses() {
        assert!(Tenant::new("T1", ActivityStatus::Offloaded).is_ok());
    }
}
