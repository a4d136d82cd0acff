//! Peer group associations: `/peer-group-associations`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Transport};
use crate::utils::de;

/// Collection key of association listings.
pub const ASSOCIATIONS_KEY: &str = "peer_group_associations";

/// Link between a subcloud peer group and a system peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PeerGroupAssociation {
    /// Association ID.
    #[serde(rename = "id", deserialize_with = "de::id")]
    pub association_id: String,
    /// Subcloud peer group ID.
    #[serde(default, alias = "peer-group-id", deserialize_with = "de::opt_string")]
    pub peer_group_id: Option<String>,
    /// System peer ID.
    #[serde(default, alias = "system-peer-id", deserialize_with = "de::opt_string")]
    pub system_peer_id: Option<String>,
    /// primary or non-primary.
    #[serde(default, alias = "association-type", deserialize_with = "de::opt_string")]
    pub association_type: Option<String>,
    /// Overall sync status.
    #[serde(default, alias = "sync-status", deserialize_with = "de::opt_string")]
    pub sync_status: Option<String>,
    /// Sync failure detail, if any.
    #[serde(default, alias = "sync-message", deserialize_with = "de::opt_string")]
    pub sync_message: Option<String>,
    /// Priority of the peer group on the peer.
    #[serde(default, alias = "peer-group-priority", deserialize_with = "de::opt_string")]
    pub peer_group_priority: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

/// Body of association create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssociationRequest {
    /// Subcloud peer group ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_group_id: Option<u32>,
    /// System peer ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_peer_id: Option<u32>,
    /// Priority of the peer group on the peer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_group_priority: Option<u32>,
}

/// Manager for `/peer-group-associations`.
#[derive(Debug)]
pub struct PeerGroupAssociationManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> PeerGroupAssociationManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates a peer group association.
    pub async fn add(&self, request: &AssociationRequest) -> Result<Vec<PeerGroupAssociation>> {
        self.base
            .create("/peer-group-associations", Body::json(request)?, Some(ASSOCIATIONS_KEY))
            .await
    }

    /// Every peer group association.
    pub async fn list(&self) -> Result<Vec<PeerGroupAssociation>> {
        self.base
            .list("/peer-group-associations", Some(ASSOCIATIONS_KEY))
            .await
    }

    /// One peer group association.
    pub async fn detail(&self, association_id: &str) -> Result<Vec<PeerGroupAssociation>> {
        self.base
            .list(
                &format!("/peer-group-associations/{association_id}"),
                Some(ASSOCIATIONS_KEY),
            )
            .await
    }

    /// Updates a peer group association.
    pub async fn update(
        &self,
        association_id: &str,
        request: &AssociationRequest,
    ) -> Result<Vec<PeerGroupAssociation>> {
        self.base
            .update(
                &format!("/peer-group-associations/{association_id}"),
                Body::json(request)?,
                Some(ASSOCIATIONS_KEY),
            )
            .await
    }

    /// Pushes the peer group and its subclouds to the peer system.
    pub async fn sync(&self, association_id: &str) -> Result<Vec<PeerGroupAssociation>> {
        self.base
            .update(
                &format!("/peer-group-associations/{association_id}/sync"),
                Body::Empty,
                Some(ASSOCIATIONS_KEY),
            )
            .await
    }

    /// Deletes a peer group association.
    pub async fn delete(&self, association_id: &str) -> Result<()> {
        self.base
            .delete(&format!("/peer-group-associations/{association_id}"))
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
    async fn sync_patches_sync_path() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "id": 4, "peer_group_id": 3, "system_peer_id": 1, "association_type": "primary",
            "sync_status": "syncing", "sync_message": null, "peer_group_priority": 1
        })));
        let manager = PeerGroupAssociationManager::new(Arc::clone(&fake));

        let associations = manager.sync("4").await.expect("sync");

        assert_eq!(associations[0].association_type.as_deref(), Some("primary"));
        assert_eq!(associations[0].peer_group_id.as_deref(), Some("3"));
        assert_eq!(associations[0].sync_message, None);
        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.path, "/peer-group-associations/4/sync");
    }

    #[tokio::test]
    async fn update_sends_priority_only() {
        let fake = Arc::new(FakeTransport::with_json(json!({"id": 4})));
        let manager = PeerGroupAssociationManager::new(Arc::clone(&fake));
        let request = AssociationRequest {
            peer_group_priority: Some(2),
            ..AssociationRequest::default()
        };

        manager.update("4", &request).await.expect("update");

        assert_eq!(
            fake.last_request().expect("request").body,
            Body::Json(json!({"peer_group_priority": 2}))
        );
    }
}
