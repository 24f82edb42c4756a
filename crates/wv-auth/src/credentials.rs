// SPDX-License-Identifier: MIT OR Apache-2.0
//! The four credential shapes a client may be constructed with (§4.2,
//! supplemented with a static bearer token per `original_source/weaviate/
//! connect/`).

use serde::{Deserialize, Serialize};

/// Credential material supplied when connecting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Credentials {
    /// A static API key, sent in the server's own API-key header scheme.
    ApiKey(String),
    /// OIDC client-credentials grant: `client_id`/`client_secret` exchanged
    /// directly for an access token, no end-user interaction.
    ClientCredentials {
        /// OAuth2 client identifier.
        client_id: String,
        /// OAuth2 client secret.
        client_secret: String,
        /// Requested scope string, space-separated.
        scope: Option<String>,
    },
    /// OIDC resource-owner-password grant: a username/password exchanged
    /// for an access token on behalf of that user.
    ResourceOwnerPassword {
        /// End-user username.
        username: String,
        /// End-user password.
        password: String,
        /// Public client identifier (no secret — used for the password
        /// grant against a public OIDC client).
        client_id: String,
        /// Requested scope string, space-separated.
        scope: Option<String>,
    },
    /// A pre-obtained bearer token, sent as-is with no refresh or expiry
    /// tracking — distinct from [`Credentials::ApiKey`] only in that it is
    /// carried as `Authorization: Bearer <token>` rather than the server's
    /// API-key header.
    BearerToken(String),
}

impl Credentials {
    /// `true` for the two OIDC grants, which require discovery and a
    /// background refresh scheduler; `false` for the two static shapes.
    #[must_use]
    pub fn requires_oidc(&self) -> bool {
        matches!(
            self,
            Credentials::ClientCredentials { .. } | Credentials::ResourceOwnerPassword { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_shapes_do_not_require_oidc() {
        assert!(!Credentials::ApiKey("k".into()).requires_oidc());
        assert!(!Credentials::BearerToken("t".into()).requires_oidc());
    }

    #[test]
    fn oidc_shapes_require_oidc() {
        assert!(Credentials::ClientCredentials {
            client_id: "c".into(),
            client_secret: "s".into(),
            scope: None,
        }
        .requires_oidc());
        assert!(Credentials::ResourceOwnerPassword {
            username: "u".into(),
            password: "p".into(),
            client_id: "c".into(),
            scope: None,
        }
        .requires_oidc());
    }
}
