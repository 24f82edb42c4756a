// SPDX-License-Identifier: MIT OR Apache-2.0
//! Synchronous mirror of the async surface (§4.4, §9).
//!
//! Scoped to the hot path named in §4.4 — connect/close and per-collection
//! object CRUD, batch ingestion, search, and aggregation — rather than a
//! mechanical re-derivation of every admin accessor on [`crate::Client`].
//! Builder chains (`QueryBuilder`/`AggregateBuilder`) already perform no
//! I/O until their terminal call, so they are reused as-is (passed through
//! a closure); only the terminal, I/O-bearing call is driven through
//! [`SyncExecutor`].

use std::sync::Arc;
use uuid::Uuid;

use wv_config::ClientConfig;
use wv_core::object::{Object, Reference};
use wv_core::{BatchResult, CollectionConfig};
use wv_error::Error;
use wv_executor::SyncExecutor;
use wv_search::aggregate::AggregateResponse;
use wv_search::DecodedResponse;

use crate::aggregate::AggregateBuilder;
use crate::collection::{CollectionConfigFacade, CollectionHandle, CollectionTenants};
use crate::query::QueryBuilder;
use crate::Client;

/// A blocking mirror of [`Client`], owning a dedicated multi-thread
/// runtime that every call blocks on (§4.4).
pub struct SyncClient {
    inner: Client,
    executor: Arc<SyncExecutor>,
}

impl SyncClient {
    /// Construct a client from validated configuration and credentials,
    /// building the dedicated runtime its calls will block on.
    pub fn new(config: ClientConfig, credentials: wv_auth::Credentials) -> Result<Self, Error> {
        Ok(Self {
            inner: Client::new(config, credentials)?,
            executor: Arc::new(SyncExecutor::new()?),
        })
    }

    /// Blocking mirror of [`Client::connect`].
    pub fn connect(&self) -> Result<(), Error> {
        self.executor.execute(|| self.inner.connect(), |()| (), |e| e)
    }

    /// Blocking mirror of [`Client::close`].
    pub fn close(&self) -> Result<(), Error> {
        self.executor.execute(|| self.inner.close(), |()| (), |e| e)
    }

    /// Blocking mirror of [`Client::collection`].
    pub fn collection(&self, name: impl Into<String>) -> Result<SyncCollectionHandle, Error> {
        let handle = self
            .executor
            .execute(|| self.inner.collection(name), |handle| handle, |e| e)?;
        Ok(SyncCollectionHandle {
            handle,
            executor: self.executor.clone(),
        })
    }
}

/// A blocking mirror of [`CollectionHandle`].
pub struct SyncCollectionHandle {
    handle: CollectionHandle,
    executor: Arc<SyncExecutor>,
}

impl SyncCollectionHandle {
    /// This handle's collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Insert a single object, blocking until the server acknowledges it.
    pub fn insert(&self, object: Object) -> Result<Uuid, Error> {
        let scope = self.handle.scope();
        self.executor.execute(
            || self.handle.data().insert(object, scope),
            |uuid| uuid,
            |e| e,
        )
    }

    /// Fetch one object by UUID, or `None` if it does not exist.
    pub fn get_by_id(&self, uuid: Uuid) -> Result<Option<Object>, Error> {
        let scope = self.handle.scope();
        self.executor.execute(
            || self.handle.data().get_by_id(uuid, scope),
            |object| object,
            |e| e,
        )
    }

    /// Whether an object exists, without fetching its body.
    pub fn exists(&self, uuid: Uuid) -> Result<bool, Error> {
        let scope = self.handle.scope();
        self.executor
            .execute(|| self.handle.data().exists(uuid, scope), |b| b, |e| e)
    }

    /// Replace an object's properties/vector wholesale.
    pub fn replace(&self, uuid: Uuid, object: Object) -> Result<(), Error> {
        let scope = self.handle.scope();
        self.executor.execute(
            || self.handle.data().replace(uuid, object, scope),
            |()| (),
            |e| e,
        )
    }

    /// Merge-update an object's properties.
    pub fn update(&self, uuid: Uuid, object: Object) -> Result<(), Error> {
        let scope = self.handle.scope();
        self.executor.execute(
            || self.handle.data().update(uuid, object, scope),
            |()| (),
            |e| e,
        )
    }

    /// Delete an object by UUID.
    pub fn delete(&self, uuid: Uuid) -> Result<(), Error> {
        let scope = self.handle.scope();
        self.executor
            .execute(|| self.handle.data().delete(uuid, scope), |()| (), |e| e)
    }

    /// Add beacons to a reference property, preserving existing targets.
    pub fn add_reference(&self, uuid: Uuid, property: &str, target: Reference) -> Result<(), Error> {
        let scope = self.handle.scope();
        self.executor.execute(
            || self.handle.data().reference().add(uuid, property, target, scope),
            |()| (),
            |e| e,
        )
    }

    /// Insert `objects` in one RPC call, with no chunking or retry (§2,
    /// §8 scenario B).
    pub fn insert_many(&self, objects: Vec<Object>) -> Result<BatchResult, Error> {
        self.executor
            .execute(|| self.handle.batch().insert_many(objects), |r| r, |e| e)
    }

    /// Build and run a search request in one call: `build` configures the
    /// (non-I/O) fluent [`QueryBuilder`], then the terminal fetch runs on
    /// the sync executor.
    pub fn fetch_objects(
        &self,
        build: impl FnOnce(QueryBuilder) -> QueryBuilder,
    ) -> Result<DecodedResponse, Error> {
        let request = build(self.handle.query());
        self.executor
            .execute(|| request.fetch_objects(), |r| r, |e| e)
    }

    /// Build and run an aggregation in one call, mirroring
    /// [`SyncCollectionHandle::fetch_objects`].
    pub fn aggregate(
        &self,
        build: impl FnOnce(AggregateBuilder) -> AggregateBuilder,
    ) -> Result<AggregateResponse, Error> {
        let request = build(self.handle.aggregate());
        self.executor.execute(|| request.execute(), |r| r, |e| e)
    }

    /// Tenant CRUD, pre-scoped to this collection.
    #[must_use]
    pub fn tenants(&self) -> SyncCollectionTenants {
        SyncCollectionTenants {
            admin: self.handle.tenants(),
            executor: self.executor.clone(),
        }
    }

    /// Schema CRUD, pre-scoped to this collection.
    #[must_use]
    pub fn config(&self) -> SyncCollectionConfig {
        SyncCollectionConfig {
            admin: self.handle.config(),
            executor: self.executor.clone(),
        }
    }
}

/// A blocking mirror of [`CollectionTenants`].
pub struct SyncCollectionTenants {
    admin: CollectionTenants,
    executor: Arc<SyncExecutor>,
}

impl SyncCollectionTenants {
    /// List every tenant under this collection.
    pub fn list(&self) -> Result<Vec<wv_core::tenant::Tenant>, Error> {
        self.executor.execute(|| self.admin.list(), |t| t, |e| e)
    }
}

/// A blocking mirror of [`CollectionConfigFacade`].
pub struct SyncCollectionConfig {
    admin: CollectionConfigFacade,
    executor: Arc<SyncExecutor>,
}

impl SyncCollectionConfig {
    /// Fetch this collection's current config, or `None` if it has been
    /// deleted out from under this handle.
    pub fn describe(&self) -> Result<Option<wv_core::collection::Collection>, Error> {
        self.executor.execute(|| self.admin.describe(), |c| c, |e| e)
    }

    /// Update this collection's mutable config fields.
    pub fn update(&self, config: CollectionConfig) -> Result<wv_core::collection::Collection, Error> {
        self.executor
            .execute(|| self.admin.update(config), |c| c, |e| e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wv_auth::Credentials;

    #[test]
    fn rejects_invalid_config_up_front() {
        let config = ClientConfig::new("not-a-url", "localhost:50051");
        let err = SyncClient::new(config, Credentials::ApiKey("key".into())).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn connect_fails_fast_when_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/.well-known/ready"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = ClientConfig::new(server.uri(), "http://127.0.0.1:1");
        // SyncClient owns a blocking runtime, so it must be built/driven
        // from outside any existing tokio reactor. `spawn_blocking` hands
        // it a plain OS thread even though this test itself runs async.
        let result = tokio::task::spawn_blocking(move || {
            let client = SyncClient::new(config, Credentials::ApiKey("key".into())).unwrap();
            client.connect()
        })
        .await
        .unwrap();
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
