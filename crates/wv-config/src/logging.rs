// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `WEAVIATE_LOG_LEVEL` logging façade (§6, §9).
//!
//! `Logger::from_env` is the only place this process reads the env var;
//! every other component holds a cheaply-cloneable [`Logger`] handle
//! instead of calling `std::env::var` itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use wv_error::redact::redact_headers;

/// Request/response logging verbosity, mirroring `WEAVIATE_LOG_LEVEL`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Full request/response tracing, including redacted headers and bodies.
    Debug,
    /// Default: no per-request logs.
    Info,
    /// Warnings only (e.g. OIDC discovery fallback, dropped static header).
    Warn,
    /// Errors only.
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl LogLevel {
    /// Parse `WEAVIATE_LOG_LEVEL`'s value. Unset or invalid values default
    /// to [`LogLevel::Info`] and produce no per-request logs (§6).
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_uppercase).as_deref() {
            Some("DEBUG") => LogLevel::Debug,
            Some("INFO") => LogLevel::Info,
            Some("WARN") => LogLevel::Warn,
            Some("ERROR") => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

/// A cheap, cloneable logging handle carrying the resolved level. Obtained
/// once at client construction; never re-reads the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Resolve the logger from `WEAVIATE_LOG_LEVEL` once, at construction.
    #[must_use]
    pub fn from_env() -> Self {
        let raw = std::env::var("WEAVIATE_LOG_LEVEL").ok();
        Self {
            level: LogLevel::parse(raw.as_deref()),
        }
    }

    /// Construct a logger pinned to an explicit level, bypassing the
    /// environment (used by tests and embedders that manage their own
    /// tracing setup).
    #[must_use]
    pub fn with_level(level: LogLevel) -> Self {
        Self { level }
    }

    /// The resolved log level.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Emit a DEBUG-level request trace: the request line, redacted
    /// headers, and the request body. A no-op unless the resolved level is
    /// [`LogLevel::Debug`].
    pub fn log_request(
        &self,
        method: &str,
        path: &str,
        headers: &[(String, String)],
        body: Option<&str>,
    ) {
        if self.level != LogLevel::Debug {
            return;
        }
        let redacted = redact_headers(headers);
        tracing::debug!(
            target: "weaviate.transport",
            method,
            path,
            headers = ?redacted,
            body,
            "request"
        );
    }

    /// Emit a DEBUG-level response trace: status and body.
    pub fn log_response(&self, status: u16, body: Option<&str>) {
        if self.level != LogLevel::Debug {
            return;
        }
        tracing::debug!(target: "weaviate.transport", status, body, "response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_or_invalid_defaults_to_info() {
        assert_eq!(LogLevel::parse(None), LogLevel::Info);
        assert_eq!(LogLevel::parse(Some("bogus")), LogLevel::Info);
    }

    #[test]
    fn recognizes_each_level_case_insensitively() {
        assert_eq!(LogLevel::parse(Some("debug")), LogLevel::Debug);
        assert_eq!(LogLevel::parse(Some("WARN")), LogLevel::Warn);
        assert_eq!(LogLevel::parse(Some("Error")), LogLevel::Error);
    }
}
