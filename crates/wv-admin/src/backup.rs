// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single-collection-set backup create/status/restore/cancel (§6
//! `/v1/backups*`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use wv_error::Error;
use wv_transport::HttpTransport;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The lifecycle state of a backup or restore operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BackupStatusCode {
    /// Backup has started.
    Started,
    /// Files are being transferred to the backend.
    Transferring,
    /// Files have finished transferring.
    Transferred,
    /// Backup or restore completed successfully.
    Success,
    /// Backup or restore failed.
    Failed,
    /// Backup or restore was cancelled.
    Cancelled,
}

impl BackupStatusCode {
    /// True once the operation will not progress further.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

#[derive(Serialize)]
struct CreateBackupRequest<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    include: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude: Option<&'a [String]>,
}

#[derive(Serialize)]
struct RestoreBackupRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    include: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude: Option<&'a [String]>,
}

/// The status of a backup or restore operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupStatus {
    /// The caller-supplied backup id.
    pub id: String,
    /// Current lifecycle status.
    pub status: BackupStatusCode,
    /// Failure reason, present only when `status` is `Failed`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Thin CRUD executor over backup create/status/restore/cancel.
#[derive(Clone)]
pub struct BackupAdmin {
    transport: HttpTransport,
}

impl BackupAdmin {
    /// Construct an admin executor over the given HTTP transport.
    #[must_use]
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Start a backup with the given backend (e.g. `"s3"`) and id.
    pub async fn create(
        &self,
        backend: &str,
        id: &str,
        include: Option<&[String]>,
        exclude: Option<&[String]>,
    ) -> Result<BackupStatus, Error> {
        let body = CreateBackupRequest { id, include, exclude };
        let response = self
            .transport
            .post(&format!("/backups/{backend}"), &body, &[], &[200], "backup_create")
            .await?;
        response.json()
    }

    /// Fetch a backup's current status.
    pub async fn status(&self, backend: &str, id: &str) -> Result<BackupStatus, Error> {
        let response = self
            .transport
            .get(
                &format!("/backups/{backend}/{id}"),
                &BTreeMap::new(),
                &[],
                &[200],
                "backup_status",
            )
            .await?;
        response.json()
    }

    /// Poll `status` every 500ms until the backup reaches a terminal state,
    /// raising [`Error::BackupFailed`]/[`Error::BackupCanceled`] on failure
    /// or cancellation.
    pub async fn wait_for_backup(&self, backend: &str, id: &str) -> Result<BackupStatus, Error> {
        loop {
            let status = self.status(backend, id).await?;
            match status.status {
                BackupStatusCode::Success => return Ok(status),
                BackupStatusCode::Failed => {
                    return Err(Error::BackupFailed {
                        backup_id: id.to_string(),
                        reason: status.error.unwrap_or_default(),
                    })
                }
                BackupStatusCode::Cancelled => {
                    return Err(Error::BackupCanceled { backup_id: id.to_string() })
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
    }

    /// Start restoring a backup into the current cluster.
    pub async fn restore(
        &self,
        backend: &str,
        id: &str,
        include: Option<&[String]>,
        exclude: Option<&[String]>,
    ) -> Result<BackupStatus, Error> {
        let body = RestoreBackupRequest { include, exclude };
        let response = self
            .transport
            .post(&format!("/backups/{backend}/{id}/restore"), &body, &[], &[200], "backup_restore")
            .await?;
        response.json()
    }

    /// Fetch a restore operation's current status.
    pub async fn restore_status(&self, backend: &str, id: &str) -> Result<BackupStatus, Error> {
        let response = self
            .transport
            .get(
                &format!("/backups/{backend}/{id}/restore"),
                &BTreeMap::new(),
                &[],
                &[200],
                "backup_restore_status",
            )
            .await?;
        response.json()
    }

    /// Cancel an in-progress backup.
    pub async fn cancel(&self, backend: &str, id: &str) -> Result<(), Error> {
        self.transport
            .send(
                reqwest::Method::DELETE,
                &format!("/backups/{backend}/{id}"),
                None,
                &BTreeMap::new(),
                &[],
                &[200, 204],
                "backup_cancel",
            )
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
            Duration::from_secs(1),
            Duration::from_secs(1),
            Logger::with_level(LogLevel::Info),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn wait_for_backup_resolves_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/backups/s3/my-backup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "my-backup",
                "status": "SUCCESS",
            })))
            .mount(&server)
            .await;

        let admin = BackupAdmin::new(transport_for(&server).await);
        let status = admin.wait_for_backup("s3", "my-backup").await.unwrap();
        assert_eq!(status.status, BackupStatusCode::Success);
    }

    #[tokio::test]
    async fn wait_for_backup_raises_failed_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/backups/s3/my-backup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "my-backup",
                "status": "FAILED",
                "error": "disk full",
            })))
            .mount(&server)
            .await;

        let admin = BackupAdmin::new(transport_for(&server).await);
        let err = admin.wait_for_backup("s3", "my-backup").await.unwrap_err();
        assert!(matches!(err, Error::BackupFailed { .. }));
    }
}
