// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! The client's error taxonomy (§7) and the header-redaction rules used by
//! the DEBUG logger (§6, §8 item 9).
//!
//! Every raised error is a distinct, pattern-matchable variant so callers
//! never have to string-match a message to recover from a specific
//! failure. Per-item batch errors are *not* represented here — those are
//! [`wv_core::BatchItemError`], plain data that is never thrown (§4.9).

/// Header/body redaction for the DEBUG request logger.
pub mod redact;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A required and an actual version, for [`Error::UnsupportedFeature`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRequirement {
    /// Minimum major version required.
    pub required_major: u64,
    /// Minimum minor version required.
    pub required_minor: u64,
    /// Minimum patch version required.
    pub required_patch: u64,
    /// The server's actual major version.
    pub actual_major: u64,
    /// The server's actual minor version.
    pub actual_minor: u64,
    /// The server's actual patch version.
    pub actual_patch: u64,
}

impl std::fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requires >= {}.{}.{}, server reports {}.{}.{}",
            self.required_major,
            self.required_minor,
            self.required_patch,
            self.actual_major,
            self.actual_minor,
            self.actual_patch
        )
    }
}

/// The top-level error type returned by every fallible client operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure before any response was received.
    #[error("connection error ({label}): {source}")]
    Connection {
        /// Caller-supplied label identifying the failing operation.
        label: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server responded, but with a status outside the call's
    /// allow-list (including an unexpected-but-nominally-ok 2xx).
    #[error("unexpected status {status} for {label}: {body_snippet}")]
    UnexpectedStatus {
        /// Caller-supplied label identifying the failing operation.
        label: String,
        /// The HTTP status code received.
        status: u16,
        /// A short snippet of the response body, for diagnostics.
        body_snippet: String,
    },

    /// An RPC call failed or returned a non-OK status.
    #[error("rpc error ({label}): [{code}] {message}")]
    Rpc {
        /// Caller-supplied label identifying the failing operation.
        label: String,
        /// The RPC status code.
        code: i32,
        /// The RPC status message/details.
        message: String,
    },

    /// Caller-side validation failed before any I/O was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation was attempted on a client that has been closed.
    #[error("client is closed")]
    ClosedClient,

    /// The capability gate rejected an operation not supported by the
    /// connected server version.
    #[error("unsupported feature {feature}: {requirement}")]
    UnsupportedFeature {
        /// Name of the gated feature.
        feature: String,
        /// The version requirement that was not met.
        requirement: VersionRequirement,
    },

    /// Credential setup or OIDC negotiation failed.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// The response decoded successfully but carried a server-side error
    /// envelope (e.g. a GraphQL `errors` array).
    #[error("query error: {0:?}")]
    Query(Vec<String>),

    /// A backup operation reached the terminal `FAILED` state.
    #[error("backup {backup_id} failed: {reason}")]
    BackupFailed {
        /// Identifier of the failed backup.
        backup_id: String,
        /// Server-reported failure reason.
        reason: String,
    },

    /// A backup operation was cancelled before completion.
    #[error("backup {backup_id} was canceled")]
    BackupCanceled {
        /// Identifier of the canceled backup.
        backup_id: String,
    },
}

impl Error {
    /// Construct a [`Error::Connection`] from any boxable transport error.
    pub fn connection(
        label: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Connection {
            label: label.into(),
            source: Box::new(source),
        }
    }

    /// Construct an [`Error::UnsupportedFeature`], truncating the body
    /// snippet is not needed here since this variant carries no body.
    #[must_use]
    pub fn unsupported_feature(feature: impl Into<String>, requirement: VersionRequirement) -> Self {
        Error::UnsupportedFeature {
            feature: feature.into(),
            requirement,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_requirement_displays_both_versions() {
        let req = VersionRequirement {
            required_major: 1,
            required_minor: 24,
            required_patch: 0,
            actual_major: 1,
            actual_minor: 23,
            actual_patch: 5,
        };
        let message = req.to_string();
        assert!(message.contains("1.24.0"));
        assert!(message.contains("1.23.5"));
    }

    #[test]
    fn unsupported_feature_message_carries_requirement() {
        let err = Error::unsupported_feature(
            "named_vectors",
            VersionRequirement {
                required_major: 1,
                required_minor: 24,
                required_patch: 0,
                actual_major: 1,
                actual_minor: 22,
                actual_patch: 0,
            },
        );
        assert!(err.to_string().contains("named_vectors"));
        assert!(err.to_string().contains("1.24.0"));
    }
}
