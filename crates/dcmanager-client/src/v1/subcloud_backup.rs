//! Subcloud backups: `/subcloud-backup`.
//!
//! Operations target either one subcloud or a whole group. Group operations
//! may partially succeed, which the server reports as `207 Multi-Status`.

use std::sync::Arc;

use serde::Serialize;

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{ApiRequest, Body, Form, Method, Transport};
use crate::v1::subcloud::{SUBCLOUDS_KEY, Subcloud};

/// Accepted statuses of create and restore.
pub const BACKUP_ACCEPTED: &[u16] = &[200, 207];

/// Accepted statuses of delete.
pub const BACKUP_DELETED: &[u16] = &[204, 207];

/// Body of `PATCH /subcloud-backup/delete/{release}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupDeleteRequest {
    /// Subcloud name or ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcloud: Option<String>,
    /// Subcloud group name or ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Keep the backup on the subcloud.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_only: Option<String>,
    /// Base64-encoded sysadmin password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sysadmin_password: Option<String>,
}

/// Manager for `/subcloud-backup`.
#[derive(Debug)]
pub struct SubcloudBackupManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SubcloudBackupManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Starts a backup; returns the subclouds whose backup was accepted.
    pub async fn create(&self, form: Form) -> Result<Vec<Subcloud>> {
        self.base
            .fetch(
                ApiRequest::new(Method::Post, "/subcloud-backup").with_body(Body::Multipart(form)),
                BACKUP_ACCEPTED,
                Some(SUBCLOUDS_KEY),
            )
            .await
    }

    /// Deletes the backups taken for `release`.
    pub async fn delete(&self, release: &str, request: &BackupDeleteRequest) -> Result<()> {
        self.base
            .call(
                ApiRequest::new(Method::Patch, format!("/subcloud-backup/delete/{release}"))
                    .with_body(Body::json(request)?),
                BACKUP_DELETED,
            )
            .await?;
        Ok(())
    }

    /// Restores subclouds from their backups.
    pub async fn restore(&self, form: Form) -> Result<Vec<Subcloud>> {
        self.base
            .fetch(
                ApiRequest::new(Method::Patch, "/subcloud-backup/restore")
                    .with_body(Body::Multipart(form)),
                BACKUP_ACCEPTED,
                Some(SUBCLOUDS_KEY),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;
    use crate::transport::ApiResponse;

    #[tokio::test]
    async fn create_accepts_partial_success() {
        let fake = Arc::new(FakeTransport::new());
        fake.push(ApiResponse::new(
            207,
            json!({"subclouds": [{"id": 1, "name": "subcloud1", "backup-status": "in-progress"}]})
                .to_string(),
        ));
        let manager = SubcloudBackupManager::new(Arc::clone(&fake));

        let subclouds = manager
            .create(Form::new().text("group", "edge"))
            .await
            .expect("create");

        assert_eq!(subclouds[0].backup_status.as_deref(), Some("in-progress"));
    }

    #[tokio::test]
    async fn delete_failure_is_api_error() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_status(422, r#"{"faultstring": "Backup not found"}"#);
        let manager = SubcloudBackupManager::new(Arc::clone(&fake));

        let err = manager
            .delete("24.09", &BackupDeleteRequest::default())
            .await
            .expect_err("422");

        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("Backup not found"));
    }

    #[tokio::test]
    async fn delete_patches_release_path() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_status(204, "");
        let manager = SubcloudBackupManager::new(Arc::clone(&fake));
        let request = BackupDeleteRequest {
            subcloud: Some("subcloud1".into()),
            local_only: Some("true".into()),
            ..BackupDeleteRequest::default()
        };

        manager.delete("24.09", &request).await.expect("delete");

        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.path, "/subcloud-backup/delete/24.09");
        assert_eq!(
            sent.body,
            Body::Json(json!({"subcloud": "subcloud1", "local_only": "true"}))
        );
    }
}
