// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON/HTTP control-plane transport (§4.1).
//!
//! `<base_url>/v1<path>`, JSON bodies, and a per-call allow-list of
//! "successful" status codes — any other status, including an
//! unlisted-but-nominally-ok 2xx, is a failure (§4.1: "to catch silent
//! regressions").

use crate::rpc::BearerTokenSource;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wv_config::logging::Logger;
use wv_error::Error;

const BODY_SNIPPET_LEN: usize = 512;

/// Shared state for every HTTP call: base URL, headers, and client handle.
#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    logger: Logger,
    token_source: Option<Arc<dyn BearerTokenSource + Send + Sync>>,
}

impl HttpTransport {
    /// Construct a transport over the given base URL (e.g.
    /// `http://localhost:8080`, without the `/v1` suffix) and timeouts.
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
        logger: Logger,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .map_err(|e| Error::connection("http client build", e))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            logger,
            token_source: None,
        })
    }

    /// Attach a bearer-token source; every request then carries a live
    /// `Authorization: Bearer <token>` header unless the caller already
    /// supplies one explicitly.
    #[must_use]
    pub fn with_token_source(
        mut self,
        source: Arc<dyn BearerTokenSource + Send + Sync>,
    ) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Issue an HTTP request against `<base_url>/v1<path>`.
    ///
    /// `ok_statuses` is the allow-list of status codes this call accepts
    /// as success; any other status (including other 2xx codes) produces
    /// [`Error::UnexpectedStatus`]. `label` identifies the operation in
    /// error messages and DEBUG logs.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: &BTreeMap<String, String>,
        headers: &[(String, String)],
        ok_statuses: &[u16],
        label: &str,
    ) -> Result<HttpResponse, Error> {
        let url = format!("{}/v1{path}", self.base_url);
        let mut request = self.client.request(method.clone(), &url);
        if !params.is_empty() {
            request = request.query(&params.iter().collect::<Vec<_>>());
        }
        let has_explicit_auth = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("authorization"));
        if !has_explicit_auth {
            if let Some(token) = self.token_source.as_ref().and_then(|source| source.current_token()) {
                request = request.header("authorization", format!("Bearer {token}"));
            }
        }
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let body_string = body.map(|b| b.to_string());
        if let Some(body) = body {
            request = request.json(body);
        }

        self.logger
            .log_request(method.as_str(), path, headers, body_string.as_deref());

        let response = request
            .send()
            .await
            .map_err(|e| Error::connection(label.to_string(), e))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::connection(label.to_string(), e))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        self.logger.log_response(status, Some(&text));

        if !ok_statuses.contains(&status) {
            return Err(Error::UnexpectedStatus {
                label: label.to_string(),
                status,
                body_snippet: text.chars().take(BODY_SNIPPET_LEN).collect(),
            });
        }

        Ok(HttpResponse { status, body: text })
    }

    /// Convenience wrapper for `GET` requests.
    pub async fn get(
        &self,
        path: &str,
        params: &BTreeMap<String, String>,
        headers: &[(String, String)],
        ok_statuses: &[u16],
        label: &str,
    ) -> Result<HttpResponse, Error> {
        self.send(Method::GET, path, None, params, headers, ok_statuses, label)
            .await
    }

    /// Convenience wrapper for `POST` requests with a JSON body.
    pub async fn post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        headers: &[(String, String)],
        ok_statuses: &[u16],
        label: &str,
    ) -> Result<HttpResponse, Error> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::InvalidInput(format!("failed to serialize request body: {e}")))?;
        self.send(
            Method::POST,
            path,
            Some(&value),
            &BTreeMap::new(),
            headers,
            ok_statuses,
            label,
        )
        .await
    }
}

/// The raw result of an HTTP call that passed its allow-list check.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The status code received.
    pub status: u16,
    /// The raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::InvalidInput(format!("failed to parse response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_returns_allowed_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(
            server.uri(),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Logger::with_level(wv_config::logging::LogLevel::Info),
        )
        .unwrap();

        let response = transport
            .get(
                "/.well-known/ready",
                &BTreeMap::new(),
                &[],
                &[200],
                "ready",
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn unlisted_2xx_is_still_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/meta"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(
            server.uri(),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Logger::with_level(wv_config::logging::LogLevel::Info),
        )
        .unwrap();

        let err = transport
            .get("/meta", &BTreeMap::new(), &[], &[200], "meta")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { status: 202, .. }));
    }

    #[tokio::test]
    async fn not_found_is_reported_with_label() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/objects/Article/does-not-exist"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(
            server.uri(),
            Duration::from_secs(1),
            Duration::from_secs(1),
            Logger::with_level(wv_config::logging::LogLevel::Info),
        )
        .unwrap();

        let err = transport
            .get(
                "/objects/Article/does-not-exist",
                &BTreeMap::new(),
                &[],
                &[200],
                "get_by_id",
            )
            .await
            .unwrap_err();
        match err {
            Error::UnexpectedStatus { status, label, .. } => {
                assert_eq!(status, 404);
                assert_eq!(label, "get_by_id");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }
}
