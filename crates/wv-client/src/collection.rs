// SPDX-License-Identifier: MIT OR Apache-2.0
//! A handle scoped to one collection (§4.10), carrying the tenant and
//! consistency level every sub-facade it mints should inherit (§5: "carried
//! per call" — here carried once, at the handle, rather than threaded
//! through every method call individually).

use wv_admin::BackupAdmin;
use wv_auth::TokenStateHandle;
use wv_capability::CapabilityGate;
use wv_core::collection::ConsistencyLevel;
use wv_core::tenant::Tenant;
use wv_error::Error;
use wv_transport::rpc::RpcTransport;
use wv_transport::HttpTransport;

use crate::aggregate::AggregateBuilder;
use crate::batch::BatchFacade;
use crate::data::{CallScope, DataFacade};
use crate::query::QueryBuilder;

/// A handle scoped to one collection, exposing `data`, `batch`, `query`,
/// `aggregate`, `tenants`, `config`, and `backup` (§4.10).
#[derive(Clone)]
pub struct CollectionHandle {
    http: HttpTransport,
    rpc: RpcTransport<TokenStateHandle>,
    gate: CapabilityGate,
    name: String,
    tenant: Option<String>,
    consistency_level: Option<ConsistencyLevel>,
}

impl CollectionHandle {
    pub(crate) fn new(
        http: HttpTransport,
        rpc: RpcTransport<TokenStateHandle>,
        gate: CapabilityGate,
        name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            rpc,
            gate,
            name: name.into(),
            tenant: None,
            consistency_level: None,
        }
    }

    /// Scope every sub-facade minted from this handle to `tenant`.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Scope every sub-facade minted from this handle to `level` (§5).
    #[must_use]
    pub fn with_consistency_level(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = Some(level);
        self
    }

    /// This handle's collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The call scope (tenant + consistency level) carried by this
    /// handle, for callers driving [`CollectionHandle::data`] directly.
    #[must_use]
    pub fn scope(&self) -> CallScope<'_> {
        CallScope {
            tenant: self.tenant.as_deref(),
            consistency_level: self.consistency_level,
        }
    }

    /// Single-object CRUD and the reference sub-facade (§4.10 `data`).
    #[must_use]
    pub fn data(&self) -> DataFacade {
        DataFacade::new(self.http.clone(), self.name.clone())
    }

    /// Background and single-shot batch ingestion (§4.10 `batch`).
    #[must_use]
    pub fn batch(&self) -> BatchFacade {
        BatchFacade::new(self.http.clone(), self.rpc.clone(), self.name.clone(), self.consistency_level)
    }

    /// Fluent search surface over this collection (§4.10 `query`).
    #[must_use]
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.rpc.clone(), self.gate, self.name.clone(), self.tenant.clone(), self.consistency_level)
    }

    /// Aggregation over this collection (§4.10 `aggregate`).
    #[must_use]
    pub fn aggregate(&self) -> AggregateBuilder {
        AggregateBuilder::new(self.http.clone(), self.rpc.clone(), self.gate, self.name.clone(), self.tenant.clone())
    }

    /// Tenant CRUD, pre-scoped to this collection (§4.10 `tenants`).
    #[must_use]
    pub fn tenants(&self) -> CollectionTenants {
        CollectionTenants {
            admin: wv_admin::TenantAdmin::new(self.http.clone()),
            collection: self.name.clone(),
        }
    }

    /// Schema CRUD, pre-scoped to this collection (§4.10 `config`).
    #[must_use]
    pub fn config(&self) -> CollectionConfigFacade {
        CollectionConfigFacade {
            admin: wv_admin::SchemaAdmin::new(self.http.clone()),
            collection: self.name.clone(),
        }
    }

    /// Cluster-wide backup create/status/restore/cancel, unscoped — a
    /// backup targets a set of collections named by `include`/`exclude`,
    /// not a single one (§4.10 `backup`).
    #[must_use]
    pub fn backup(&self) -> BackupAdmin {
        BackupAdmin::new(self.http.clone())
    }
}

/// [`wv_admin::TenantAdmin`] pre-bound to one collection, so callers don't
/// repeat the collection name on every call.
#[derive(Clone)]
pub struct CollectionTenants {
    admin: wv_admin::TenantAdmin,
    collection: String,
}

impl CollectionTenants {
    /// Create tenants, chunking requests larger than 100.
    pub async fn create(&self, tenants: &[Tenant]) -> Result<(), Error> {
        self.admin.create(&self.collection, tenants).await
    }

    /// Update tenants' activity status, chunking requests larger than 100.
    pub async fn update(&self, tenants: &[Tenant]) -> Result<(), Error> {
        self.admin.update(&self.collection, tenants).await
    }

    /// Remove tenants by name, chunking requests larger than 100.
    pub async fn remove(&self, names: &[String]) -> Result<(), Error> {
        self.admin.remove(&self.collection, names).await
    }

    /// Fetch one tenant by name, or `None` if it does not exist.
    pub async fn get(&self, tenant: &str) -> Result<Option<Tenant>, Error> {
        self.admin.get(&self.collection, tenant).await
    }

    /// List every tenant under this collection.
    pub async fn list(&self) -> Result<Vec<Tenant>, Error> {
        self.admin.list(&self.collection).await
    }
}

/// [`wv_admin::SchemaAdmin`] pre-bound to one collection.
#[derive(Clone)]
pub struct CollectionConfigFacade {
    admin: wv_admin::SchemaAdmin,
    collection: String,
}

impl CollectionConfigFacade {
    /// Fetch this collection's current config, or `None` if it has been
    /// deleted out from under this handle.
    pub async fn describe(&self) -> Result<Option<wv_core::collection::Collection>, Error> {
        self.admin.get(&self.collection).await
    }

    /// Update this collection's mutable config fields (§3: "every change
    /// is a round trip through `config.update()` followed by a fresh
    /// `describe()`").
    pub async fn update(&self, config: wv_core::collection::CollectionConfig) -> Result<wv_core::collection::Collection, Error> {
        self.admin.update(&self.collection, config).await
    }

    /// Delete this collection.
    pub async fn delete(&self) -> Result<(), Error> {
        self.admin.delete(&self.collection).await
    }

    /// Add a property to this collection's schema.
    pub async fn add_property(&self, property: wv_core::property::Property) -> Result<(), Error> {
        self.admin.add_property(&self.collection, property).await
    }

    /// Fetch shard status for this collection.
    pub async fn shards(&self) -> Result<Vec<wv_admin::ShardStatus>, Error> {
        self.admin.shards(&self.collection).await
    }

    /// Update one shard's status (e.g. `READY`/`READONLY`).
    pub async fn update_shard_status(&self, shard: &str, status: &str) -> Result<(), Error> {
        self.admin.update_shard_status(&self.collection, shard, status).await
    }
}
