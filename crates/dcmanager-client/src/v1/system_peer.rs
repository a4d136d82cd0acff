//! System peers: `/system-peers`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Transport};
use crate::utils::de;
use crate::v1::subcloud_peer_group::{PEER_GROUPS_KEY, SubcloudPeerGroup};

/// Collection key of system peer listings.
pub const SYSTEM_PEERS_KEY: &str = "system_peers";

/// A remote system controller this system federates with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SystemPeer {
    /// System peer ID.
    #[serde(rename = "id", deserialize_with = "de::id")]
    pub peer_id: String,
    /// UUID of the peer system.
    #[serde(default, rename = "peer-uuid", alias = "peer_uuid", deserialize_with = "de::opt_string")]
    pub peer_uuid: Option<String>,
    /// Name of the peer system.
    #[serde(rename = "peer-name", alias = "peer_name")]
    pub peer_name: String,
    /// Identity endpoint of the peer.
    #[serde(default, rename = "manager-endpoint", alias = "manager_endpoint", deserialize_with = "de::opt_string")]
    pub manager_endpoint: Option<String>,
    /// Username on the peer manager.
    #[serde(default, rename = "manager-username", alias = "manager_username", deserialize_with = "de::opt_string")]
    pub manager_username: Option<String>,
    /// Gateway used to reach the peer controllers.
    #[serde(default, rename = "peer-controller-gateway-address", alias = "peer_controller_gateway_address", deserialize_with = "de::opt_string")]
    pub peer_controller_gateway_address: Option<String>,
    /// Administrative state of the peer.
    #[serde(default, rename = "administrative-state", alias = "administrative_state", deserialize_with = "de::opt_string")]
    pub administrative_state: Option<String>,
    /// Seconds between heartbeats.
    #[serde(default, rename = "heartbeat-interval", alias = "heartbeat_interval", deserialize_with = "de::opt_string")]
    pub heartbeat_interval: Option<String>,
    /// Missed heartbeats before the peer is failed.
    #[serde(default, rename = "heartbeat-failure-threshold", alias = "heartbeat_failure_threshold", deserialize_with = "de::opt_string")]
    pub heartbeat_failure_threshold: Option<String>,
    /// Action taken when the peer fails.
    #[serde(default, rename = "heartbeat-failure-policy", alias = "heartbeat_failure_policy", deserialize_with = "de::opt_string")]
    pub heartbeat_failure_policy: Option<String>,
    /// Seconds before a failed peer enters maintenance.
    #[serde(default, rename = "heartbeat-maintenance-timeout", alias = "heartbeat_maintenance_timeout", deserialize_with = "de::opt_string")]
    pub heartbeat_maintenance_timeout: Option<String>,
    /// Availability of the peer.
    #[serde(default, rename = "availability-state", alias = "availability_state", deserialize_with = "de::opt_string")]
    pub availability_state: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

/// Body of system peer create and update calls.
///
/// `manager_password` must already be base64-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemPeerRequest {
    /// UUID of the peer system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_uuid: Option<String>,
    /// Name of the peer system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_name: Option<String>,
    /// Identity endpoint of the peer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_endpoint: Option<String>,
    /// Username on the peer manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_username: Option<String>,
    /// Base64-encoded peer manager password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_password: Option<String>,
    /// Gateway used to reach the peer controllers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_controller_gateway_address: Option<String>,
    /// Administrative state of the peer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrative_state: Option<String>,
    /// Seconds between heartbeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_interval: Option<u32>,
    /// Missed heartbeats before the peer is failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_failure_threshold: Option<u32>,
    /// Action taken when the peer fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_failure_policy: Option<String>,
    /// Seconds before a failed peer enters maintenance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heartbeat_maintenance_timeout: Option<u32>,
}

impl SystemPeerRequest {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Manager for `/system-peers`.
#[derive(Debug)]
pub struct SystemPeerManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SystemPeerManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates a system peer.
    pub async fn add(&self, request: &SystemPeerRequest) -> Result<Vec<SystemPeer>> {
        self.base
            .create("/system-peers", Body::json(request)?, Some(SYSTEM_PEERS_KEY))
            .await
    }

    /// Every system peer.
    pub async fn list(&self) -> Result<Vec<SystemPeer>> {
        self.base.list("/system-peers", Some(SYSTEM_PEERS_KEY)).await
    }

    /// One system peer.
    pub async fn detail(&self, peer_ref: &str) -> Result<Vec<SystemPeer>> {
        self.base
            .list(&format!("/system-peers/{peer_ref}"), Some(SYSTEM_PEERS_KEY))
            .await
    }

    /// Updates a system peer.
    pub async fn update(&self, peer_ref: &str, request: &SystemPeerRequest) -> Result<Vec<SystemPeer>> {
        self.base
            .update(
                &format!("/system-peers/{peer_ref}"),
                Body::json(request)?,
                Some(SYSTEM_PEERS_KEY),
            )
            .await
    }

    /// Deletes a system peer.
    pub async fn delete(&self, peer_ref: &str) -> Result<()> {
        self.base.delete(&format!("/system-peers/{peer_ref}")).await
    }

    /// Peer groups associated with the system peer.
    pub async fn list_peer_groups(&self, peer_ref: &str) -> Result<Vec<SubcloudPeerGroup>> {
        self.base
            .list(
                &format!("/system-peers/{peer_ref}/subcloud-peer-groups"),
                Some(PEER_GROUPS_KEY),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    #[tokio::test]
    async fn list_decodes_both_key_styles() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "system_peers": [
                {"id": 1, "peer-uuid": "8a5b", "peer-name": "dc-west", "manager-endpoint": "https://10.10.10.2:5000/v3"},
                {"id": 2, "peer_uuid": "9c6d", "peer_name": "dc-east", "heartbeat_interval": 60}
            ]
        })));
        let manager = SystemPeerManager::new(Arc::clone(&fake));

        let peers = manager.list().await.expect("list");

        assert_eq!(peers[0].peer_name, "dc-west");
        assert_eq!(peers[0].manager_endpoint.as_deref(), Some("https://10.10.10.2:5000/v3"));
        assert_eq!(peers[1].peer_uuid.as_deref(), Some("9c6d"));
        assert_eq!(peers[1].heartbeat_interval.as_deref(), Some("60"));
    }

    #[test]
    fn request_is_kebab_case() {
        let request = SystemPeerRequest {
            peer_name: Some("dc-west".into()),
            heartbeat_failure_threshold: Some(3),
            ..SystemPeerRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&request).expect("serializes"),
            json!({"peer-name": "dc-west", "heartbeat-failure-threshold": 3})
        );
        assert!(SystemPeerRequest::default().is_empty());
    }

    #[tokio::test]
    async fn list_peer_groups_path() {
        let fake = Arc::new(FakeTransport::new());
        let manager = SystemPeerManager::new(Arc::clone(&fake));
        manager.list_peer_groups("dc-west").await.expect("list");
        assert_eq!(
            fake.last_request().expect("request").path,
            "/system-peers/dc-west/subcloud-peer-groups"
        );
    }
}
