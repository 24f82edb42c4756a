// SPDX-License-Identifier: MIT OR Apache-2.0
//! The background token-refresh scheduler (§4.2, §8 item 8).
//!
//! One scheduler per client. Sleeps until `max(1, expires_in - 30s)`, then
//! refreshes; on failure, retries after 1s. Cancelled by the client's
//! shutdown event rather than by dropping the task, so `close()` can wait
//! for it to actually stop.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wv_error::Error;

use crate::oidc::TokenResponse;

const EXPIRY_SAFETY_MARGIN: Duration = Duration::from_secs(30);
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// The currently held access token and when it expires.
#[derive(Clone, Debug)]
struct CurrentToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Duration,
}

/// A shared, readable handle to the current access token, updated by the
/// refresh scheduler and consulted by every outgoing request.
#[derive(Clone)]
pub struct TokenState {
    inner: Arc<RwLock<Option<CurrentToken>>>,
}

impl TokenState {
    /// Construct an empty token state (no token held yet).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Construct a token state pre-seeded with a static, never-refreshed
    /// token (API-key or bearer-token credential shapes).
    #[must_use]
    pub fn static_token(token: String) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(CurrentToken {
                access_token: token,
                refresh_token: None,
                expires_in: Duration::MAX,
            }))),
        }
    }

    async fn set(&self, response: TokenResponse) {
        let mut guard = self.inner.write().await;
        *guard = Some(CurrentToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: Duration::from_secs(response.expires_in),
        });
    }

    /// The current access token, if any has been obtained.
    pub async fn current(&self) -> Option<String> {
        self.inner.read().await.as_ref().map(|t| t.access_token.clone())
    }

    async fn refresh_token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
    }

    async fn expires_in(&self) -> Option<Duration> {
        self.inner.read().await.as_ref().map(|t| t.expires_in)
    }
}

impl wv_transport::rpc::BearerTokenSource for TokenStateHandle {
    fn current_token(&self) -> Option<String> {
        self.0.try_read().ok().and_then(|g| g.as_ref().map(|t| t.access_token.clone()))
    }
}

/// A `Clone + Send + Sync` wrapper over [`TokenState`] suitable for
/// [`wv_transport::rpc::BearerTokenSource`], which is a synchronous trait.
#[derive(Clone)]
pub struct TokenStateHandle(Arc<RwLock<Option<CurrentToken>>>);

impl From<&TokenState> for TokenStateHandle {
    fn from(state: &TokenState) -> Self {
        Self(state.inner.clone())
    }
}

/// A single-use exchange function: either the initial grant exchange or a
/// refresh-token exchange, re-run by the scheduler each cycle.
#[async_trait::async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Perform the initial token exchange using stored credentials.
    async fn exchange(&self) -> Result<TokenResponse, Error>;

    /// Perform a refresh using a previously issued refresh token. Called
    /// only when the prior response carried one; when it returns an error
    /// the scheduler falls back to [`TokenExchanger::exchange`] (§4.2:
    /// "if the token endpoint stops returning `refresh_token`... re-fetch
    /// using stored credentials").
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error>;
}

/// Handle to a running refresh scheduler. Dropping this handle does not
/// stop the task — call [`RefreshHandle::shutdown`] explicitly, matching
/// `close()`'s teardown order (§4.2, §5).
pub struct RefreshHandle {
    shutdown: Arc<Notify>,
    stopped: watch::Receiver<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Signal the scheduler to stop and wait for it to exit.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }

    /// `true` once the scheduler has observed shutdown and exited its loop.
    #[must_use]
    pub fn has_stopped(&self) -> bool {
        *self.stopped.borrow()
    }
}

/// Spawn the refresh scheduler: perform the initial exchange, store the
/// token, then loop sleeping/refreshing until shutdown.
pub async fn spawn(
    state: TokenState,
    exchanger: Arc<dyn TokenExchanger>,
) -> Result<RefreshHandle, Error> {
    let initial = exchanger.exchange().await?;
    state.set(initial).await;

    let shutdown = Arc::new(Notify::new());
    let (stopped_tx, stopped_rx) = watch::channel(false);
    let task_shutdown = shutdown.clone();
    let task_state = state.clone();

    let task = tokio::spawn(async move {
        loop {
            let sleep_for = task_state
                .expires_in()
                .await
                .map(|expires_in| expires_in.saturating_sub(EXPIRY_SAFETY_MARGIN))
                .unwrap_or(EXPIRY_SAFETY_MARGIN)
                .max(Duration::from_secs(1));

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = task_shutdown.notified() => break,
            }

            loop {
                let outcome = match task_state.refresh_token().await {
                    Some(refresh_token) => exchanger.refresh(&refresh_token).await,
                    None => exchanger.exchange().await,
                };
                match outcome {
                    Ok(response) => {
                        task_state.set(response).await;
                        debug!(target: "weaviate.auth", "token refreshed");
                        break;
                    }
                    Err(err) => {
                        warn!(target: "weaviate.auth", error = %err, "token refresh failed, retrying in 1s");
                        tokio::select! {
                            _ = tokio::time::sleep(RETRY_DELAY) => {}
                            _ = task_shutdown.notified() => {
                                let _ = stopped_tx.send(true);
                                return;
                            }
                        }
                    }
                }
            }
        }
        let _ = stopped_tx.send(true);
    });

    Ok(RefreshHandle {
        shutdown,
        stopped: stopped_rx,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyThenOkExchanger {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl TokenExchanger for FlakyThenOkExchanger {
        async fn exchange(&self) -> Result<TokenResponse, Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(TokenResponse {
                    access_token: "first".into(),
                    expires_in: 1,
                    refresh_token: None,
                })
            } else if n == 1 {
                Err(Error::Authentication("transient".into()))
            } else {
                Ok(TokenResponse {
                    access_token: "second".into(),
                    expires_in: 3600,
                    refresh_token: None,
                })
            }
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse, Error> {
            self.exchange().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduler_retries_after_failed_refresh_and_rolls_new_token() {
        let state = TokenState::empty();
        let exchanger = Arc::new(FlakyThenOkExchanger {
            calls: AtomicUsize::new(0),
        });
        let handle = spawn(state.clone(), exchanger).await.unwrap();

        assert_eq!(state.current().await, Some("first".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        assert_eq!(state.current().await, Some("second".to_string()));
        handle.shutdown().await;
    }

    #[test]
    fn static_token_is_immediately_available() {
        let state = TokenState::static_token("k".into());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let token = rt.block_on(state.current());
        assert_eq!(token, Some("k".to_string()));
    }
}
