// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Client configuration, connection parameters, and the logging façade.
//!
//! §9 "Global mutable state": the logger and environment-variable reads are
//! process-wide, so they are centralized here and read exactly once, at
//! [`Logger::from_env`] construction — never re-read on the hot path.

/// The DEBUG/INFO/WARN/ERROR request logger façade.
pub mod logging;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while validating a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more fields failed semantic validation.
    #[error("client config validation failed: {reasons:?}")]
    Validation {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

/// The two-part timeout pair used by both transports (§4.1, §5).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timeouts {
    /// Maximum time to establish a connection.
    pub connect: Duration,
    /// Maximum time to wait for a full response once connected.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            read: Duration::from_secs(60),
        }
    }
}

/// Explicit proxy configuration, since the client does not rely on
/// ambient env-var proxy detection for its connection parameters (§6:
/// "CLI/env surface: none at the core" besides the log-level variable).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProxyConfig {
    /// Proxy URL for HTTP requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    /// Proxy URL for HTTPS requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<String>,
    /// Hosts to bypass the proxy for.
    #[serde(default)]
    pub no_proxy: Vec<String>,
}

/// Top-level client configuration, explicit at construction time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClientConfig {
    /// Base URL of the REST control plane, e.g. `http://localhost:8080`.
    pub http_base_url: String,
    /// Host:port of the RPC data-plane channel.
    pub rpc_address: String,
    /// Connect/read timeout pair.
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Explicit proxy settings.
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Whether to start/stop an embedded server around this client's
    /// lifecycle (§9 "Embedded server collaborator").
    #[serde(default)]
    pub embedded: bool,
}

impl ClientConfig {
    /// Construct a config pointed at the given REST and RPC addresses,
    /// with default timeouts and no proxy.
    #[must_use]
    pub fn new(http_base_url: impl Into<String>, rpc_address: impl Into<String>) -> Self {
        Self {
            http_base_url: http_base_url.into(),
            rpc_address: rpc_address.into(),
            timeouts: Timeouts::default(),
            proxy: ProxyConfig::default(),
            embedded: false,
        }
    }

    /// Validate this configuration, collecting every problem rather than
    /// failing on the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut reasons = Vec::new();
        if self.http_base_url.trim().is_empty() {
            reasons.push("http_base_url must not be empty".to_string());
        }
        if !self.http_base_url.starts_with("http://") && !self.http_base_url.starts_with("https://")
        {
            reasons.push("http_base_url must start with http:// or https://".to_string());
        }
        if self.rpc_address.trim().is_empty() {
            reasons.push("rpc_address must not be empty".to_string());
        }
        if self.timeouts.connect.is_zero() {
            reasons.push("timeouts.connect must be greater than zero".to_string());
        }
        if self.timeouts.read.is_zero() {
            reasons.push("timeouts.read must be greater than zero".to_string());
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation { reasons })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_config() {
        let config = ClientConfig::new("http://localhost:8080", "localhost:50051");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn collects_every_validation_failure() {
        let mut config = ClientConfig::new("ftp://bad", "localhost:50051");
        config.timeouts.connect = Duration::ZERO;
        let err = config.validate().unwrap_err();
        let ConfigError::Validation { reasons } = err;
        assert_eq!(reasons.len(), 2);
    }

    #[test]
    fn json_schema_is_generated_for_embedders() {
        let schema = schemars::schema_for!(ClientConfig);
        let value = serde_json::to_value(&schema).unwrap();
        assert!(value.get("properties").is_some());
    }
}
