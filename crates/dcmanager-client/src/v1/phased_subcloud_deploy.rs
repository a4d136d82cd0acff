//! Phased subcloud deployment: `/phased-subcloud-deploy`.
//!
//! Runs a subcloud deployment one phase at a time instead of the all-in-one
//! `subcloud add`.

use std::fmt;
use std::sync::Arc;

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Form, Transport};
use crate::v1::subcloud::{SUBCLOUDS_KEY, Subcloud};

/// Deployment phases that follow `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    /// Install the subcloud from its install values.
    Install,
    /// Bootstrap the subcloud controller.
    Bootstrap,
    /// Apply the deploy configuration.
    Config,
    /// Mark the deployment complete.
    Complete,
    /// Abort the running phase.
    Abort,
    /// Resume from the failed or aborted phase.
    Resume,
    /// Enroll a factory-installed subcloud.
    Enroll,
}

impl DeployPhase {
    /// Path segment of the phase.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Bootstrap => "bootstrap",
            Self::Config => "configure",
            Self::Complete => "complete",
            Self::Abort => "abort",
            Self::Resume => "resume",
            Self::Enroll => "enroll",
        }
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Manager for `/phased-subcloud-deploy`.
#[derive(Debug)]
pub struct PhasedSubcloudDeployManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> PhasedSubcloudDeployManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates the subcloud record without deploying anything.
    pub async fn create(&self, form: Form) -> Result<Vec<Subcloud>> {
        self.base
            .create("/phased-subcloud-deploy", Body::Multipart(form), Some(SUBCLOUDS_KEY))
            .await
    }

    /// Runs `phase`. An empty form sends no body.
    pub async fn run(&self, subcloud_ref: &str, phase: DeployPhase, form: Form) -> Result<Vec<Subcloud>> {
        let body = if form.is_empty() {
            Body::Empty
        } else {
            Body::Multipart(form)
        };
        self.base
            .update(
                &format!("/phased-subcloud-deploy/{subcloud_ref}/{phase}"),
                body,
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
    use crate::transport::Method;

    #[tokio::test]
    async fn config_phase_uses_configure_path() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "id": 1, "name": "subcloud1", "deploy-status": "pre-config"
        })));
        let manager = PhasedSubcloudDeployManager::new(Arc::clone(&fake));

        let subclouds = manager
            .run("subcloud1", DeployPhase::Config, Form::new().text("sysadmin_password", "c2VjcmV0"))
            .await
            .expect("config");

        assert_eq!(subclouds[0].deploy_status.as_deref(), Some("pre-config"));
        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.path, "/phased-subcloud-deploy/subcloud1/configure");
        assert!(matches!(sent.body, Body::Multipart(_)));
    }

    #[tokio::test]
    async fn complete_sends_no_body() {
        let fake = Arc::new(FakeTransport::with_json(json!({"id": 1, "name": "subcloud1"})));
        let manager = PhasedSubcloudDeployManager::new(Arc::clone(&fake));

        manager
            .run("subcloud1", DeployPhase::Complete, Form::new())
            .await
            .expect("complete");

        assert_eq!(fake.last_request().expect("request").body, Body::Empty);
    }
}
