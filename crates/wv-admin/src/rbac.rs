// SPDX-License-Identifier: MIT OR Apache-2.0
//! RBAC role, user, and OIDC/internal group management (§6
//! `/v1/authz/roles*`, `/v1/authz/users*`, `/v1/authz/groups/{type}*`).

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wv_core::role::{Permission, Role};
use wv_error::Error;
use wv_transport::HttpTransport;

#[derive(Serialize)]
struct PermissionsRequest<'a> {
    permissions: &'a [Permission],
}

#[derive(Debug, Deserialize)]
struct CreateUserResponse {
    apikey: String,
}

/// A database user as returned by the RBAC user endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    /// The user's identifier.
    pub user_id: String,
    /// Names of roles assigned to this user.
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Thin CRUD executor over role management.
#[derive(Clone)]
pub struct RoleAdmin {
    transport: HttpTransport,
}

impl RoleAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// List every role defined on the server.
    pub async fn list(&self) -> Result<Vec<Role>, Error> {
        let response = self
            .transport
            .get("/authz/roles", &BTreeMap::new(), &[], &[200], "roles_list")
            .await?;
        response.json()
    }

    /// Fetch one role by name, or `None` if it does not exist.
    pub async fn get(&self, name: &str) -> Result<Option<Role>, Error> {
        let response = self
            .transport
            .get(&format!("/authz/roles/{name}"), &BTreeMap::new(), &[], &[200, 404], "roles_get")
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Create a role. Permissions are flattened and sent individually (§3).
    pub async fn create(&self, role: &Role) -> Result<(), Error> {
        let body = serde_json::json!({
            "name": role.name,
            "permissions": role.flattened(),
        });
        self.transport.post("/authz/roles", &body, &[], &[200], "roles_create").await?;
        Ok(())
    }

    /// Delete a role.
    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        self.transport
            .send(Method::DELETE, &format!("/authz/roles/{name}"), None, &BTreeMap::new(), &[], &[200, 204], "roles_delete")
            .await?;
        Ok(())
    }

    /// Add permissions to an existing role.
    pub async fn add_permissions(&self, name: &str, permissions: &[Permission]) -> Result<(), Error> {
        let body = PermissionsRequest { permissions };
        self.transport
            .post(&format!("/authz/roles/{name}/add-permissions"), &body, &[], &[200], "roles_add_permissions")
            .await?;
        Ok(())
    }

    /// Remove permissions from a role.
    pub async fn remove_permissions(&self, name: &str, permissions: &[Permission]) -> Result<(), Error> {
        let body = PermissionsRequest { permissions };
        self.transport
            .post(&format!("/authz/roles/{name}/remove-permissions"), &body, &[], &[200], "roles_remove_permissions")
            .await?;
        Ok(())
    }

    /// List the users currently assigned a role.
    pub async fn users_for_role(&self, name: &str) -> Result<Vec<String>, Error> {
        let response = self
            .transport
            .get(&format!("/authz/roles/{name}/users"), &BTreeMap::new(), &[], &[200], "roles_users_for_role")
            .await?;
        response.json()
    }
}

/// Thin CRUD executor over database-user management.
#[derive(Clone)]
pub struct UserAdmin {
    transport: HttpTransport,
}

impl UserAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// List every database user.
    pub async fn list(&self) -> Result<Vec<User>, Error> {
        let response = self
            .transport
            .get("/authz/users/db", &BTreeMap::new(), &[], &[200], "users_list")
            .await?;
        response.json()
    }

    /// Fetch one user by id, or `None` if it does not exist.
    pub async fn get(&self, user_id: &str) -> Result<Option<User>, Error> {
        let response = self
            .transport
            .get(&format!("/authz/users/db/{user_id}"), &BTreeMap::new(), &[], &[200, 404], "users_get")
            .await?;
        if response.status == 404 {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    /// Create a database user, returning its freshly minted API key.
    pub async fn create(&self, user_id: &str) -> Result<String, Error> {
        let response = self
            .transport
            .post(&format!("/authz/users/db/{user_id}"), &serde_json::json!({}), &[], &[200], "users_create")
            .await?;
        Ok(response.json::<CreateUserResponse>()?.apikey)
    }

    /// Delete a database user.
    pub async fn delete(&self, user_id: &str) -> Result<(), Error> {
        self.transport
            .send(Method::DELETE, &format!("/authz/users/db/{user_id}"), None, &BTreeMap::new(), &[], &[200, 204], "users_delete")
            .await?;
        Ok(())
    }

    /// Rotate a database user's API key, returning the new key.
    pub async fn rotate_key(&self, user_id: &str) -> Result<String, Error> {
        let response = self
            .transport
            .post(&format!("/authz/users/db/{user_id}/rotate-key"), &serde_json::json!({}), &[], &[200], "users_rotate_key")
            .await?;
        Ok(response.json::<CreateUserResponse>()?.apikey)
    }

    /// Assign roles to a user.
    pub async fn assign_roles(&self, user_id: &str, roles: &[String]) -> Result<(), Error> {
        let body = serde_json::json!({ "roles": roles });
        self.transport
            .post(&format!("/authz/users/db/{user_id}/assign"), &body, &[], &[200], "users_assign_roles")
            .await?;
        Ok(())
    }

    /// Revoke roles from a user.
    pub async fn revoke_roles(&self, user_id: &str, roles: &[String]) -> Result<(), Error> {
        let body = serde_json::json!({ "roles": roles });
        self.transport
            .post(&format!("/authz/users/db/{user_id}/revoke"), &body, &[], &[200], "users_revoke_roles")
            .await?;
        Ok(())
    }
}

/// Which namespace a group belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// An OIDC-federated group.
    Oidc,
    /// A statically configured internal group.
    Internal,
}

impl GroupKind {
    fn path_segment(self) -> &'static str {
        match self {
            Self::Oidc => "oidc",
            Self::Internal => "internal",
        }
    }
}

/// Thin CRUD executor over OIDC/internal group role assignment.
#[derive(Clone)]
pub struct GroupAdmin {
    transport: HttpTransport,
}

impl GroupAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// List the roles assigned to a group.
    pub async fn roles_for_group(&self, kind: GroupKind, group_id: &str) -> Result<Vec<String>, Error> {
        let segment = kind.path_segment();
        let response = self
            .transport
            .get(&format!("/authz/groups/{segment}/{group_id}/roles"), &BTreeMap::new(), &[], &[200], "groups_roles_for_group")
            .await?;
        response.json()
    }

    /// Assign roles to a group.
    pub async fn assign_roles(&self, kind: GroupKind, group_id: &str, roles: &[String]) -> Result<(), Error> {
        let segment = kind.path_segment();
        let body = serde_json::json!({ "roles": roles });
        self.transport
            .post(&format!("/authz/groups/{segment}/{group_id}/assign"), &body, &[], &[200], "groups_assign_roles")
            .await?;
        Ok(())
    }

    /// Revoke roles from a group.
    pub async fn revoke_roles(&self, kind: GroupKind, group_id: &str, roles: &[String]) -> Result<(), Error> {
        let segment = kind.path_segment();
        let body = serde_json::json!({ "roles": roles });
        self.transport
            .post(&format!("/authz/groups/{segment}/{group_id}/revoke"), &body, &[], &[200], "groups_revoke_roles")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wv_config::logging::{LogLevel, Logger};

    async fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(
            server.uri(),
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(1),
            Logger::with_level(LogLevel::Info),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_user_returns_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/authz/users/db/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "apikey": "secret" })))
            .mount(&server)
            .await;

        let admin = UserAdmin::new(transport_for(&server).await);
        assert_eq!(admin.create("alice").await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn get_missing_role_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/authz/roles/viewer"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let admin = RoleAdmin::new(transport_for(&server).await);
        assert!(admin.get("viewer").await.unwrap().is_none());
    }
}
