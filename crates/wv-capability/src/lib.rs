// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Capability negotiation between a connected server's version and the
//! features a call wants to use (§4.3).
//!
//! Two outcomes: a **hard gate** raises [`wv_error::Error::UnsupportedFeature`]
//! when a feature is entirely absent; a **soft gate** ([`Transport`]) picks
//! which wire encoding to use when the feature exists on both sides of a
//! version cut-off but is carried differently.

use serde::{Deserialize, Serialize};
use wv_error::{Error, VersionRequirement};

/// A parsed server semantic version (major.minor.patch; pre-release/build
/// metadata from `semver` is ignored for gating purposes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerVersion {
    /// Major version component.
    pub major: u64,
    /// Minor version component.
    pub minor: u64,
    /// Patch version component.
    pub patch: u64,
}

impl ServerVersion {
    /// Construct a version directly from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Parse a version string as returned by `GET /v1/meta`.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let parsed = semver::Version::parse(raw.trim_start_matches('v'))
            .map_err(|e| Error::InvalidInput(format!("invalid server version {raw:?}: {e}")))?;
        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
        })
    }

    /// Returns `true` if this version is `>= (major, minor, patch)`.
    #[must_use]
    pub fn is_at_least(&self, major: u64, minor: u64, patch: u64) -> bool {
        *self >= ServerVersion::new(major, minor, patch)
    }
}

/// A version-gated feature, named for error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GatedFeature {
    /// Human-readable/identifier name, used verbatim in error messages.
    pub name: &'static str,
    /// Minimum server version required.
    pub min_version: ServerVersion,
}

/// Named-vector support on objects and `near_vector` probes.
pub const NAMED_VECTORS: GatedFeature = GatedFeature {
    name: "named_vectors",
    min_version: ServerVersion::new(1, 24, 0),
};

/// Multi-name `target_vector` join support.
pub const MULTI_TARGET_VECTOR_JOIN: GatedFeature = GatedFeature {
    name: "multi_target_vector_join",
    min_version: ServerVersion::new(1, 26, 0),
};

/// Reference traversal inside filters, over either transport.
pub const FILTER_REFERENCE_TRAVERSAL: GatedFeature = GatedFeature {
    name: "filter_reference_traversal",
    min_version: ServerVersion::new(1, 23, 0),
};

/// The version at/after which `Aggregate` is served over RPC rather than
/// the legacy GraphQL REST path (soft gate, §4.3/§6/scenario F).
pub const AGGREGATE_RPC_CUTOVER: ServerVersion = ServerVersion::new(1, 29, 0);

/// Which transport a soft-gated operation should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    /// Use the RPC data plane.
    Rpc,
    /// Use the legacy REST/GraphQL control plane.
    RestLegacy,
}

/// Holds the server's parsed version and answers gating questions for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilityGate {
    version: ServerVersion,
}

impl CapabilityGate {
    /// Construct a gate for the given connected server version.
    #[must_use]
    pub fn new(version: ServerVersion) -> Self {
        Self { version }
    }

    /// The connected server's version.
    #[must_use]
    pub fn server_version(&self) -> ServerVersion {
        self.version
    }

    /// Returns `true` if the server is at least the given version.
    #[must_use]
    pub fn is_at_least(&self, major: u64, minor: u64, patch: u64) -> bool {
        self.version.is_at_least(major, minor, patch)
    }

    /// Hard gate: error out if `feature` is not supported by the
    /// connected server, before any I/O past the version probe (§8 item 5).
    pub fn require(&self, feature: GatedFeature) -> Result<(), Error> {
        if self.version >= feature.min_version {
            Ok(())
        } else {
            Err(Error::unsupported_feature(
                feature.name,
                VersionRequirement {
                    required_major: feature.min_version.major,
                    required_minor: feature.min_version.minor,
                    required_patch: feature.min_version.patch,
                    actual_major: self.version.major,
                    actual_minor: self.version.minor,
                    actual_patch: self.version.patch,
                },
            ))
        }
    }

    /// Soft gate: which transport `Aggregate` should use for this server
    /// (scenario F).
    #[must_use]
    pub fn aggregate_transport(&self) -> Transport {
        if self.version >= AGGREGATE_RPC_CUTOVER {
            Transport::Rpc
        } else {
            Transport::RestLegacy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version() {
        let v = ServerVersion::parse("1.24.3").unwrap();
        assert_eq!(v, ServerVersion::new(1, 24, 3));
    }

    #[test]
    fn rejects_garbage_version() {
        assert!(ServerVersion::parse("not-a-version").is_err());
    }

    #[test]
    fn hard_gate_rejects_older_server() {
        let gate = CapabilityGate::new(ServerVersion::new(1, 22, 0));
        let err = gate.require(NAMED_VECTORS).unwrap_err();
        assert!(err.to_string().contains("named_vectors"));
    }

    #[test]
    fn hard_gate_accepts_exact_minimum() {
        let gate = CapabilityGate::new(ServerVersion::new(1, 24, 0));
        assert!(gate.require(NAMED_VECTORS).is_ok());
    }

    #[test]
    fn aggregate_transport_switches_at_cutover() {
        let old = CapabilityGate::new(ServerVersion::new(1, 24, 0));
        let new = CapabilityGate::new(ServerVersion::new(1, 29, 0));
        assert_eq!(old.aggregate_transport(), Transport::RestLegacy);
        assert_eq!(new.aggregate_transport(), Transport::Rpc);
    }
}
