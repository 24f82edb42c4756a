// SPDX-License-Identifier: MIT OR Apache-2.0
//! OIDC discovery and token exchange (§4.2).
//!
//! Discovery failures are not fatal: a non-JSON response (a proxy
//! intercepting `.well-known/openid-configuration`) or a `404` means the
//! server has no OIDC provider configured, and the client proceeds
//! without it — but only if the caller didn't actually supply OIDC
//! credentials, in which case that's a fast authentication failure (§4.2).

use serde::{Deserialize, Serialize};
use wv_error::Error;

/// The subset of an OIDC discovery document this client needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OidcProvider {
    /// The provider's token endpoint, used for every grant type.
    pub token_endpoint: String,
}

/// Discover the OIDC provider advertised by the server's
/// `.well-known/openid-configuration`, if any.
///
/// Returns `Ok(None)` when the server has no OIDC provider configured
/// (404, or a response that doesn't parse as the discovery document —
/// typically a proxy intercept page).
pub async fn discover(client: &reqwest::Client, issuer_url: &str) -> Result<Option<OidcProvider>, Error> {
    let url = format!(
        "{}/.well-known/openid-configuration",
        issuer_url.trim_end_matches('/')
    );
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::connection("oidc discovery", e))?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Ok(None);
    }

    let text = response
        .text()
        .await
        .map_err(|e| Error::connection("oidc discovery body", e))?;
    match serde_json::from_str::<OidcProvider>(&text) {
        Ok(provider) => Ok(Some(provider)),
        Err(_) => Ok(None),
    }
}

/// A successful token response from the provider's token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// The bearer access token.
    pub access_token: String,
    /// Seconds until the access token expires.
    pub expires_in: u64,
    /// A refresh token, present unless the grant type doesn't issue one
    /// (commonly absent for client-credentials).
    pub refresh_token: Option<String>,
}

/// Exchange a client-credentials grant for a token.
pub async fn exchange_client_credentials(
    client: &reqwest::Client,
    token_endpoint: &str,
    client_id: &str,
    client_secret: &str,
    scope: Option<&str>,
) -> Result<TokenResponse, Error> {
    let mut params = vec![
        ("grant_type", "client_credentials"),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    if let Some(scope) = scope {
        params.push(("scope", scope));
    }
    post_token_request(client, token_endpoint, &params).await
}

/// Exchange a resource-owner-password grant for a token.
pub async fn exchange_resource_owner_password(
    client: &reqwest::Client,
    token_endpoint: &str,
    username: &str,
    password: &str,
    client_id: &str,
    scope: Option<&str>,
) -> Result<TokenResponse, Error> {
    let mut params = vec![
        ("grant_type", "password"),
        ("username", username),
        ("password", password),
        ("client_id", client_id),
    ];
    if let Some(scope) = scope {
        params.push(("scope", scope));
    }
    post_token_request(client, token_endpoint, &params).await
}

/// Exchange a refresh token for a new access token.
pub async fn exchange_refresh_token(
    client: &reqwest::Client,
    token_endpoint: &str,
    refresh_token: &str,
    client_id: &str,
) -> Result<TokenResponse, Error> {
    let params = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
    ];
    post_token_request(client, token_endpoint, &params).await
}

async fn post_token_request(
    client: &reqwest::Client,
    token_endpoint: &str,
    params: &[(&str, &str)],
) -> Result<TokenResponse, Error> {
    let response = client
        .post(token_endpoint)
        .form(params)
        .send()
        .await
        .map_err(|e| Error::connection("oidc token exchange", e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::connection("oidc token exchange body", e))?;

    if !status.is_success() {
        return Err(Error::Authentication(format!(
            "token endpoint returned {status}: {text}"
        )));
    }

    serde_json::from_str(&text)
        .map_err(|e| Error::Authentication(format!("malformed token response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn discovery_parses_valid_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_endpoint": "https://idp.example.com/token"
            })))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let provider = discover(&client, &server.uri()).await.unwrap();
        assert_eq!(
            provider.unwrap().token_endpoint,
            "https://idp.example.com/token"
        );
    }

    #[tokio::test]
    async fn discovery_returns_none_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let provider = discover(&client, &server.uri()).await.unwrap();
        assert!(provider.is_none());
    }

    #[tokio::test]
    async fn discovery_returns_none_on_non_json_proxy_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>intercepted</html>"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let provider = discover(&client, &server.uri()).await.unwrap();
        assert!(provider.is_none());
    }

    #[tokio::test]
    async fn token_exchange_surfaces_failure_as_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let err = exchange_client_credentials(
            &client,
            &format!("{}/token", server.uri()),
            "id",
            "secret",
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }
}
