//! Subcloud deploy artifacts: `/subcloud-deploy`.
//!
//! Artifacts (playbook, overrides, helm chart, prestage image list) are
//! stored per software release.

use std::sync::Arc;

use serde::Deserialize;

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Form, Transport};
use crate::utils::{bool_flag, de};

/// Optional envelope around the artifact listing.
pub const SUBCLOUD_DEPLOY_KEY: &str = "subcloud_deploy";

/// Artifact file names stored for one release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubcloudDeploy {
    /// Deploy playbook file name.
    #[serde(default, alias = "deploy-playbook", deserialize_with = "de::opt_string")]
    pub deploy_playbook: Option<String>,
    /// Deploy overrides file name.
    #[serde(default, alias = "deploy-overrides", deserialize_with = "de::opt_string")]
    pub deploy_overrides: Option<String>,
    /// Deploy chart file name.
    #[serde(default, alias = "deploy-chart", deserialize_with = "de::opt_string")]
    pub deploy_chart: Option<String>,
    /// Prestage images file name.
    #[serde(default, alias = "prestage-images", deserialize_with = "de::opt_string")]
    pub prestage_images: Option<String>,
    /// Software version of the artifacts.
    #[serde(default, alias = "software-version", deserialize_with = "de::opt_string")]
    pub software_version: Option<String>,
}

/// Which artifacts a delete removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployDeleteOptions {
    /// Remove only the prestage image list.
    pub prestage_images: bool,
    /// Remove only the deployment files.
    pub deployment_files: bool,
}

/// Manager for `/subcloud-deploy`.
#[derive(Debug)]
pub struct SubcloudDeployManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SubcloudDeployManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Uploads artifacts; the form carries the files and an optional `release`.
    pub async fn upload(&self, form: Form) -> Result<Vec<SubcloudDeploy>> {
        self.base
            .create("/subcloud-deploy", Body::Multipart(form), Some(SUBCLOUD_DEPLOY_KEY))
            .await
    }

    /// Artifacts of `release`, or of the active release.
    pub async fn show(&self, release: Option<&str>) -> Result<Vec<SubcloudDeploy>> {
        self.base
            .list(&deploy_path(release), Some(SUBCLOUD_DEPLOY_KEY))
            .await
    }

    /// Deletes the deploy artifacts of `release`, or of the active release.
    pub async fn delete(&self, release: Option<&str>, options: DeployDeleteOptions) -> Result<()> {
        let mut path = deploy_path(release);
        let mut query = Vec::new();
        if options.prestage_images {
            query.push(format!("prestage_images={}", bool_flag(true)));
        }
        if options.deployment_files {
            query.push(format!("deployment_files={}", bool_flag(true)));
        }
        if !query.is_empty() {
            path = format!("{path}?{}", query.join("&"));
        }
        self.base.delete(&path).await
    }
}

fn deploy_path(release: Option<&str>) -> String {
    release.map_or_else(
        || "/subcloud-deploy".to_string(),
        |release| format!("/subcloud-deploy/{release}"),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    #[tokio::test]
    async fn show_unwraps_envelope() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "subcloud_deploy": {
                "deploy_playbook": "deploy-playbook.yaml", "deploy_overrides": "overrides.yaml",
                "deploy_chart": "deploy-chart.tgz", "prestage_images": null,
                "software_version": "24.09"
            }
        })));
        let manager = SubcloudDeployManager::new(Arc::clone(&fake));

        let deploys = manager.show(Some("24.09")).await.expect("show");

        assert_eq!(deploys[0].deploy_chart.as_deref(), Some("deploy-chart.tgz"));
        assert_eq!(deploys[0].prestage_images, None);
        assert_eq!(fake.last_request().expect("request").path, "/subcloud-deploy/24.09");
    }

    #[tokio::test]
    async fn delete_encodes_selection() {
        let fake = Arc::new(FakeTransport::new());
        let manager = SubcloudDeployManager::new(Arc::clone(&fake));

        manager
            .delete(None, DeployDeleteOptions { prestage_images: true, deployment_files: true })
            .await
            .expect("delete");

        assert_eq!(
            fake.last_request().expect("request").path,
            "/subcloud-deploy?prestage_images=true&deployment_files=true"
        );
    }
}
