// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Role`/`Permission` — RBAC types (§3). The client only models and
//! transports these; the RBAC DSL itself is a thin CRUD executor (`wv-admin`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The functional domain a permission applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDomain {
    /// Collection schema management.
    Collections,
    /// Object data CRUD/batch/query.
    Data,
    /// Role management itself.
    Roles,
    /// User management.
    Users,
    /// Cluster-wide administration.
    Cluster,
    /// Individual node operations.
    Nodes,
    /// Backup create/restore/list.
    Backups,
}

/// An action permitted (or not) by a permission within its domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Permission {
    /// The domain this permission governs.
    pub domain: PermissionDomain,
    /// Actions granted within the domain, e.g. `["read", "create"]`.
    pub actions: Vec<String>,
    /// Resource scope, e.g. a collection name glob. `None` means
    /// unrestricted within the domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

/// A named bundle of permissions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Role {
    /// Role name, unique cluster-wide.
    pub name: String,
    /// Permissions granted by this role.
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Group this role's permissions by domain, as the server returns them
    /// on read (§3: "grouped on output by domain").
    #[must_use]
    pub fn grouped_by_domain(&self) -> BTreeMap<PermissionDomain, Vec<Permission>> {
        let mut grouped: BTreeMap<PermissionDomain, Vec<Permission>> = BTreeMap::new();
        for permission in &self.permissions {
            grouped
                .entry(permission.domain)
                .or_default()
                .push(permission.clone());
        }
        grouped
    }

    /// Flatten this role's permissions for the wire, as the client sends
    /// them on input (§3: "on input they are flattened and sent
    /// individually").
    #[must_use]
    pub fn flattened(&self) -> Vec<Permission> {
        self.permissions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_permissions_by_domain() {
        let role = Role {
            name: "viewer".into(),
            permissions: vec![
                Permission {
                    domain: PermissionDomain::Data,
                    actions: vec!["read".into()],
                    resource: None,
                },
                Permission {
                    domain: PermissionDomain::Data,
                    actions: vec!["create".into()],
                    resource: Some("Article".into()),
                },
                Permission {
                    domain: PermissionDomain::Collections,
                    actions: vec!["read".into()],
                    resource: None,
                },
            ],
        };
        let grouped = role.grouped_by_domain();
        assert_eq!(grouped.get(&PermissionDomain::Data).unwrap().len(), 2);
        assert_eq!(grouped.get(&PermissionDomain::Collections).unwrap().len(), 1);
        assert_eq!(role.flattened().len(), 3);
    }
}
