//! Subcloud peer groups: `/subcloud-peer-groups`.
//!
//! A peer group is the unit of subcloud rehoming between federated system
//! controllers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Transport};
use crate::utils::de;
use crate::v1::subcloud::{SUBCLOUDS_KEY, Subcloud};

/// Collection key of peer group listings.
pub const PEER_GROUPS_KEY: &str = "subcloud_peer_groups";

/// Snapshot of a subcloud peer group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubcloudPeerGroup {
    /// Subcloud peer group ID.
    #[serde(rename = "id", deserialize_with = "de::id")]
    pub peer_group_id: String,
    /// Subcloud peer group name.
    #[serde(alias = "peer-group-name")]
    pub peer_group_name: String,
    /// Priority of the group.
    #[serde(default, alias = "group-priority", deserialize_with = "de::opt_string")]
    pub group_priority: Option<String>,
    /// enabled or disabled.
    #[serde(default, alias = "group-state", deserialize_with = "de::opt_string")]
    pub group_state: Option<String>,
    /// UUID of the leader system.
    #[serde(default, alias = "system-leader-id", deserialize_with = "de::opt_string")]
    pub system_leader_id: Option<String>,
    /// Name of the leader system.
    #[serde(default, alias = "system-leader-name", deserialize_with = "de::opt_string")]
    pub system_leader_name: Option<String>,
    /// Subclouds rehomed at once.
    #[serde(default, alias = "max-subcloud-rehoming", deserialize_with = "de::opt_string")]
    pub max_subcloud_rehoming: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

/// Rehoming progress of the subclouds in a peer group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PeerGroupStatus {
    /// Subcloud peer group ID.
    #[serde(deserialize_with = "de::id")]
    pub peer_group_id: String,
    /// Subcloud peer group name.
    #[serde(default)]
    pub peer_group_name: String,
    /// Subclouds in the group.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub total_subclouds: Option<String>,
    /// Subclouds done migrating.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub complete: Option<String>,
    /// Subclouds waiting to migrate.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub waiting_for_migrate: Option<String>,
    /// Subclouds being rehomed.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub rehoming: Option<String>,
    /// Subclouds that failed to rehome.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub rehome_failed: Option<String>,
    /// Managed subclouds.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub managed: Option<String>,
    /// Unmanaged subclouds.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub unmanaged: Option<String>,
}

/// Body of peer group create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerGroupRequest {
    /// Subcloud peer group name.
    #[serde(rename = "peer-group-name", skip_serializing_if = "Option::is_none")]
    pub peer_group_name: Option<String>,
    /// Priority of the group.
    #[serde(rename = "group-priority", skip_serializing_if = "Option::is_none")]
    pub group_priority: Option<u32>,
    /// enabled or disabled.
    #[serde(rename = "group-state", skip_serializing_if = "Option::is_none")]
    pub group_state: Option<String>,
    /// Subclouds rehomed at once.
    #[serde(rename = "max-subcloud-rehoming", skip_serializing_if = "Option::is_none")]
    pub max_subcloud_rehoming: Option<u32>,
}

impl PeerGroupRequest {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.peer_group_name.is_none()
            && self.group_priority.is_none()
            && self.group_state.is_none()
            && self.max_subcloud_rehoming.is_none()
    }
}

#[derive(Debug, Serialize)]
struct MigrateRequest<'a> {
    sysadmin_password: &'a str,
}

/// Manager for `/subcloud-peer-groups`.
#[derive(Debug)]
pub struct SubcloudPeerGroupManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SubcloudPeerGroupManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates a subcloud peer group.
    pub async fn add(&self, request: &PeerGroupRequest) -> Result<Vec<SubcloudPeerGroup>> {
        self.base
            .create("/subcloud-peer-groups", Body::json(request)?, Some(PEER_GROUPS_KEY))
            .await
    }

    /// Every subcloud peer group.
    pub async fn list(&self) -> Result<Vec<SubcloudPeerGroup>> {
        self.base
            .list("/subcloud-peer-groups", Some(PEER_GROUPS_KEY))
            .await
    }

    /// One subcloud peer group.
    pub async fn detail(&self, group_ref: &str) -> Result<Vec<SubcloudPeerGroup>> {
        self.base
            .list(&format!("/subcloud-peer-groups/{group_ref}"), Some(PEER_GROUPS_KEY))
            .await
    }

    /// Updates a subcloud peer group.
    pub async fn update(
        &self,
        group_ref: &str,
        request: &PeerGroupRequest,
    ) -> Result<Vec<SubcloudPeerGroup>> {
        self.base
            .update(
                &format!("/subcloud-peer-groups/{group_ref}"),
                Body::json(request)?,
                Some(PEER_GROUPS_KEY),
            )
            .await
    }

    /// Deletes a subcloud peer group.
    pub async fn delete(&self, group_ref: &str) -> Result<()> {
        self.base
            .delete(&format!("/subcloud-peer-groups/{group_ref}"))
            .await
    }

    /// Subclouds in the group.
    pub async fn list_subclouds(&self, group_ref: &str) -> Result<Vec<Subcloud>> {
        self.base
            .list(
                &format!("/subcloud-peer-groups/{group_ref}/subclouds"),
                Some(SUBCLOUDS_KEY),
            )
            .await
    }

    /// Starts migrating the group's subclouds to this system.
    ///
    /// `sysadmin_password` must already be base64-encoded.
    pub async fn migrate(&self, group_ref: &str, sysadmin_password: &str) -> Result<Vec<Subcloud>> {
        self.base
            .update(
                &format!("/subcloud-peer-groups/{group_ref}/migrate"),
                Body::json(&MigrateRequest { sysadmin_password })?,
                Some(SUBCLOUDS_KEY),
            )
            .await
    }

    /// Migration progress of the group.
    pub async fn status(&self, group_ref: &str) -> Result<Vec<PeerGroupStatus>> {
        self.base
            .list(&format!("/subcloud-peer-groups/{group_ref}/status"), None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;
    use crate::transport::Method;

    #[tokio::test]
    async fn detail_decodes_peer_group() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "id": 3,
            "peer_group_name": "pg-east",
            "group_priority": 0,
            "group_state": "enabled",
            "system_leader_id": "ac62f555-9386-42f1-b3a1-51ecb709409d",
            "system_leader_name": "dc-east",
            "max_subcloud_rehoming": 10,
            "created-at": "2024-05-01 10:00:00",
            "updated-at": null
        })));
        let manager = SubcloudPeerGroupManager::new(Arc::clone(&fake));

        let groups = manager.detail("pg-east").await.expect("detail");

        assert_eq!(groups[0].peer_group_id, "3");
        assert_eq!(groups[0].group_priority.as_deref(), Some("0"));
        assert_eq!(groups[0].max_subcloud_rehoming.as_deref(), Some("10"));
        assert_eq!(groups[0].created_at.as_deref(), Some("2024-05-01 10:00:00"));
    }

    #[tokio::test]
    async fn migrate_sends_encoded_password() {
        let fake = Arc::new(FakeTransport::with_json(json!({"subclouds": []})));
        let manager = SubcloudPeerGroupManager::new(Arc::clone(&fake));

        let subclouds = manager.migrate("pg-east", "c2VjcmV0").await.expect("migrate");

        assert!(subclouds.is_empty());
        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.path, "/subcloud-peer-groups/pg-east/migrate");
        assert_eq!(sent.body, Body::Json(json!({"sysadmin_password": "c2VjcmV0"})));
    }

    #[tokio::test]
    async fn status_is_a_bare_object() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "peer_group_id": 3, "peer_group_name": "pg-east", "total_subclouds": 4,
            "complete": 2, "waiting_for_migrate": 1, "rehoming": 1, "rehome_failed": 0,
            "managed": 2, "unmanaged": 2
        })));
        let manager = SubcloudPeerGroupManager::new(Arc::clone(&fake));

        let status = manager.status("3").await.expect("status");

        assert_eq!(status.len(), 1);
        assert_eq!(status[0].total_subclouds.as_deref(), Some("4"));
        assert_eq!(status[0].rehome_failed.as_deref(), Some("0"));
    }

    #[test]
    fn request_uses_hyphenated_keys() {
        let request = PeerGroupRequest {
            peer_group_name: Some("pg".into()),
            group_priority: Some(1),
            ..PeerGroupRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serializes"),
            json!({"peer-group-name": "pg", "group-priority": 1})
        );
    }
}
