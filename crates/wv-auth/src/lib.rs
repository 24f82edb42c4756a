// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Credential shapes, OIDC discovery, and the background token-refresh
//! scheduler that keeps a connected client's bearer token current (§4.2).

/// The four credential shapes a client may be constructed with.
pub mod credentials;
/// OIDC discovery and token-endpoint exchange.
pub mod oidc;
/// The background refresh scheduler and its token state handle.
pub mod refresh;

pub use credentials::Credentials;
pub use oidc::{OidcProvider, TokenResponse};
pub use refresh::{RefreshHandle, TokenExchanger, TokenState, TokenStateHandle};

use std::sync::Arc;
use wv_error::Error;

/// A [`TokenExchanger`] bound to one [`Credentials`] value, performing the
/// grant exchange matching its shape and, for OIDC shapes, discovery
/// against the connected server first.
pub struct CredentialExchanger {
    client: reqwest::Client,
    token_endpoint: String,
    credentials: Credentials,
}

impl CredentialExchanger {
    /// Resolve a [`CredentialExchanger`] for `credentials` against
    /// `issuer_url`. For the two static shapes this never performs
    /// discovery; for the two OIDC shapes, a missing or unparsable
    /// discovery document is a fast [`Error::Authentication`] failure,
    /// since the caller explicitly asked for OIDC (§4.2).
    pub async fn resolve(
        client: reqwest::Client,
        issuer_url: &str,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let token_endpoint = if credentials.requires_oidc() {
            match oidc::discover(&client, issuer_url).await? {
                Some(provider) => provider.token_endpoint,
                None => {
                    return Err(Error::Authentication(format!(
                        "OIDC credentials supplied but {issuer_url} has no OIDC provider configured"
                    )))
                }
            }
        } else {
            String::new()
        };
        Ok(Self {
            client,
            token_endpoint,
            credentials,
        })
    }
}

#[async_trait::async_trait]
impl TokenExchanger for CredentialExchanger {
    async fn exchange(&self) -> Result<TokenResponse, Error> {
        match &self.credentials {
            Credentials::ClientCredentials {
                client_id,
                client_secret,
                scope,
            } => {
                oidc::exchange_client_credentials(
                    &self.client,
                    &self.token_endpoint,
                    client_id,
                    client_secret,
                    scope.as_deref(),
                )
                .await
            }
            Credentials::ResourceOwnerPassword {
                username,
                password,
                client_id,
                scope,
            } => {
                oidc::exchange_resource_owner_password(
                    &self.client,
                    &self.token_endpoint,
                    username,
                    password,
                    client_id,
                    scope.as_deref(),
                )
                .await
            }
            Credentials::ApiKey(_) | Credentials::BearerToken(_) => Err(Error::Authentication(
                "static credential shapes do not use the refresh scheduler".to_string(),
            )),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let client_id = match &self.credentials {
            Credentials::ClientCredentials { client_id, .. }
            | Credentials::ResourceOwnerPassword { client_id, .. } => client_id.as_str(),
            _ => return self.exchange().await,
        };
        oidc::exchange_refresh_token(&self.client, &self.token_endpoint, refresh_token, client_id)
            .await
    }
}

/// Build the [`TokenState`] and, for OIDC credentials, the running
/// [`RefreshHandle`] for a just-connected client. Static credential shapes
/// (API-key, bearer token) return `None` for the handle — there is
/// nothing to refresh.
pub async fn start(
    client: reqwest::Client,
    issuer_url: &str,
    credentials: Credentials,
) -> Result<(TokenState, Option<RefreshHandle>), Error> {
    match credentials {
        Credentials::ApiKey(key) => Ok((TokenState::static_token(key), None)),
        Credentials::BearerToken(token) => Ok((TokenState::static_token(token), None)),
        oidc_credentials => {
            let exchanger =
                CredentialExchanger::resolve(client, issuer_url, oidc_credentials).await?;
            let state = TokenState::empty();
            let handle = refresh::spawn(state.clone(), Arc::new(exchanger)).await?;
            Ok((state, Some(handle)))
        }
    }
}
