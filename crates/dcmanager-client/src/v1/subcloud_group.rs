//! Subcloud groups: `/subcloud-groups`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Transport};
use crate::utils::de;
use crate::v1::subcloud::{SUBCLOUDS_KEY, Subcloud};

/// Collection key of group listings.
pub const SUBCLOUD_GROUPS_KEY: &str = "subcloud_groups";

/// A named set of subclouds sharing update orchestration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubcloudGroup {
    /// Subcloud group ID.
    #[serde(rename = "id", deserialize_with = "de::id")]
    pub group_id: String,
    /// Group name.
    pub name: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    /// How member subclouds are updated.
    #[serde(default, alias = "update-apply-type", deserialize_with = "de::opt_string")]
    pub update_apply_type: Option<String>,
    /// Subclouds updated in parallel.
    #[serde(default, alias = "max-parallel-subclouds", deserialize_with = "de::opt_string")]
    pub max_parallel_subclouds: Option<String>,
    /// Creation time.
    #[serde(default, alias = "created-at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, alias = "updated-at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

/// Body of group create and update calls. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubcloudGroupRequest {
    /// New group name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// How member subclouds are updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_apply_type: Option<String>,
    /// Subclouds updated in parallel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel_subclouds: Option<u32>,
}

impl SubcloudGroupRequest {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.update_apply_type.is_none()
            && self.max_parallel_subclouds.is_none()
    }
}

/// Manager for `/subcloud-groups`.
#[derive(Debug)]
pub struct SubcloudGroupManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SubcloudGroupManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates a subcloud group.
    pub async fn add(&self, request: &SubcloudGroupRequest) -> Result<Vec<SubcloudGroup>> {
        self.base
            .create("/subcloud-groups", Body::json(request)?, Some(SUBCLOUD_GROUPS_KEY))
            .await
    }

    /// Every subcloud group.
    pub async fn list(&self) -> Result<Vec<SubcloudGroup>> {
        self.base
            .list("/subcloud-groups", Some(SUBCLOUD_GROUPS_KEY))
            .await
    }

    /// One subcloud group.
    pub async fn detail(&self, group_ref: &str) -> Result<Vec<SubcloudGroup>> {
        self.base
            .list(&format!("/subcloud-groups/{group_ref}"), Some(SUBCLOUD_GROUPS_KEY))
            .await
    }

    /// Updates a subcloud group.
    pub async fn update(
        &self,
        group_ref: &str,
        request: &SubcloudGroupRequest,
    ) -> Result<Vec<SubcloudGroup>> {
        self.base
            .update(
                &format!("/subcloud-groups/{group_ref}"),
                Body::json(request)?,
                Some(SUBCLOUD_GROUPS_KEY),
            )
            .await
    }

    /// Deletes a subcloud group.
    pub async fn delete(&self, group_ref: &str) -> Result<()> {
        self.base
            .delete(&format!("/subcloud-groups/{group_ref}"))
            .await
    }

    /// Subclouds that belong to the group.
    pub async fn list_subclouds(&self, group_ref: &str) -> Result<Vec<Subcloud>> {
        self.base
            .list(&format!("/subcloud-groups/{group_ref}/subclouds"), Some(SUBCLOUDS_KEY))
            .await
    }
}
