//! Per-cloud strategy defaults: `/sw-update-options`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Transport};
use crate::utils::de;

/// Collection key of option listings.
pub const OPTIONS_KEY: &str = "sw-update-options";

/// Cloud name under which the server keeps the defaults for all clouds.
pub const DEFAULT_REGION_NAME: &str = "RegionOne";

/// Strategy options for one cloud, or the system-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SwUpdateOptions {
    /// Subcloud name, or `RegionOne` for the defaults.
    #[serde(alias = "cloud")]
    pub name: String,
    /// How storage hosts are updated.
    #[serde(default, rename = "storage-apply-type", alias = "storage_apply_type", deserialize_with = "de::opt_string")]
    pub storage_apply_type: Option<String>,
    /// How worker hosts are updated.
    #[serde(default, rename = "worker-apply-type", alias = "worker_apply_type", deserialize_with = "de::opt_string")]
    pub worker_apply_type: Option<String>,
    /// Worker hosts updated in parallel.
    #[serde(default, rename = "max-parallel-workers", alias = "max_parallel_workers", deserialize_with = "de::opt_string")]
    pub max_parallel_workers: Option<String>,
    /// How alarms gate the update.
    #[serde(default, rename = "alarm-restriction-type", alias = "alarm_restriction_type", deserialize_with = "de::opt_string")]
    pub alarm_restriction_type: Option<String>,
    /// What happens to instances during an update.
    #[serde(default, rename = "default-instance-action", alias = "default_instance_action", deserialize_with = "de::opt_string")]
    pub default_instance_action: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

impl SwUpdateOptions {
    /// True for the system-wide defaults entry.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_REGION_NAME
    }
}

/// Body of `POST /sw-update-options/{cloud}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SwUpdateOptionsRequest {
    /// How storage hosts are updated.
    pub storage_apply_type: String,
    /// How worker hosts are updated.
    pub worker_apply_type: String,
    /// Worker hosts updated in parallel.
    pub max_parallel_workers: u32,
    /// How alarms gate the update.
    pub alarm_restriction_type: String,
    /// What happens to instances during an update.
    pub default_instance_action: String,
}

/// Manager for `/sw-update-options`.
#[derive(Debug)]
pub struct SwUpdateOptionsManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SwUpdateOptionsManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates or replaces the options of `cloud` (`None` means the defaults).
    pub async fn update(
        &self,
        cloud: Option<&str>,
        request: &SwUpdateOptionsRequest,
    ) -> Result<Vec<SwUpdateOptions>> {
        self.base
            .create(&options_path(cloud), Body::json(request)?, Some(OPTIONS_KEY))
            .await
    }

    /// Options of every subcloud that has them.
    pub async fn list(&self) -> Result<Vec<SwUpdateOptions>> {
        self.base.list("/sw-update-options", Some(OPTIONS_KEY)).await
    }

    /// Options of `cloud`, or the defaults.
    pub async fn detail(&self, cloud: Option<&str>) -> Result<Vec<SwUpdateOptions>> {
        self.base.list(&options_path(cloud), Some(OPTIONS_KEY)).await
    }

    /// Drops the per-cloud options so the defaults apply again.
    pub async fn delete(&self, cloud: &str) -> Result<()> {
        self.base.delete(&options_path(Some(cloud))).await
    }
}

fn options_path(cloud: Option<&str>) -> String {
    format!("/sw-update-options/{}", cloud.unwrap_or(DEFAULT_REGION_NAME))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;
    use crate::transport::Method;

    #[tokio::test]
    async fn update_defaults_targets_region_one() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "name": "RegionOne", "storage-apply-type": "parallel", "worker-apply-type": "serial",
            "max-parallel-workers": 2, "alarm-restriction-type": "relaxed",
            "default-instance-action": "migrate"
        })));
        let manager = SwUpdateOptionsManager::new(Arc::clone(&fake));
        let request = SwUpdateOptionsRequest {
            storage_apply_type: "parallel".into(),
            worker_apply_type: "serial".into(),
            max_parallel_workers: 2,
            alarm_restriction_type: "relaxed".into(),
            default_instance_action: "migrate".into(),
        };

        let options = manager.update(None, &request).await.expect("update");

        assert!(options[0].is_default());
        assert_eq!(options[0].max_parallel_workers.as_deref(), Some("2"));
        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.path, "/sw-update-options/RegionOne");
        assert_eq!(
            sent.body,
            Body::Json(json!({
                "storage-apply-type": "parallel", "worker-apply-type": "serial",
                "max-parallel-workers": 2, "alarm-restriction-type": "relaxed",
                "default-instance-action": "migrate"
            }))
        );
    }

    #[tokio::test]
    async fn delete_names_cloud() {
        let fake = Arc::new(FakeTransport::new());
        let manager = SwUpdateOptionsManager::new(Arc::clone(&fake));
        manager.delete("subcloud1").await.expect("delete");
        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Delete);
        assert_eq!(sent.path, "/sw-update-options/subcloud1");
    }
}
