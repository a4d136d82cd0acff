//! Software-update orchestration strategies: `/sw-update-strategy`.
//!
//! Every strategy kind shares one endpoint; the kind travels as the `type`
//! query parameter (reads, deletes, actions) or body field (create).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::base::{OK, ResourceManager};
use crate::error::Result;
use crate::transport::{ApiRequest, Body, Method, Transport};
use crate::utils::de;

/// Kinds of orchestrated update strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Patch orchestration.
    Patch,
    /// Platform upgrade.
    Upgrade,
    /// Kubernetes version upgrade.
    KubeUpgrade,
    /// Kubernetes root CA certificate update.
    KubeRootcaUpdate,
    /// Device firmware update.
    Firmware,
    /// Software prestaging.
    Prestage,
    /// Unified software deployment.
    SwDeploy,
}

impl StrategyKind {
    /// Every kind, in CLI order.
    pub const ALL: [Self; 7] = [
        Self::Patch,
        Self::Upgrade,
        Self::KubeUpgrade,
        Self::KubeRootcaUpdate,
        Self::Firmware,
        Self::Prestage,
        Self::SwDeploy,
    ];

    /// Value of the `type` field on the wire.
    #[must_use]
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Upgrade => "upgrade",
            Self::KubeUpgrade => "kubernetes",
            Self::KubeRootcaUpdate => "kube-rootca-update",
            Self::Firmware => "firmware",
            Self::Prestage => "prestage",
            Self::SwDeploy => "software",
        }
    }

    /// CLI noun, e.g. `kube-upgrade-strategy`.
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Patch => "patch-strategy",
            Self::Upgrade => "upgrade-strategy",
            Self::KubeUpgrade => "kube-upgrade-strategy",
            Self::KubeRootcaUpdate => "kube-rootca-update-strategy",
            Self::Firmware => "fw-update-strategy",
            Self::Prestage => "prestage-strategy",
            Self::SwDeploy => "sw-deploy-strategy",
        }
    }

    /// Parses a wire `type` value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wire_type() == value)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_type())
    }
}

/// The active strategy of one kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SwUpdateStrategy {
    /// Strategy kind, as the API names it.
    #[serde(rename = "type", alias = "strategy_type")]
    pub strategy_type: String,
    /// How subclouds are updated.
    #[serde(default, rename = "subcloud-apply-type", alias = "subcloud_apply_type", deserialize_with = "de::opt_string")]
    pub subcloud_apply_type: Option<String>,
    /// Subclouds updated in parallel.
    #[serde(default, rename = "max-parallel-subclouds", alias = "max_parallel_subclouds", deserialize_with = "de::opt_string")]
    pub max_parallel_subclouds: Option<String>,
    /// Whether the strategy stops at the first failure.
    #[serde(default, rename = "stop-on-failure", alias = "stop_on_failure", deserialize_with = "de::opt_string")]
    pub stop_on_failure: Option<String>,
    /// Strategy state.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub state: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
    /// Kind-specific arguments echoed back by the server.
    #[serde(default, rename = "extra-args", alias = "extra_args")]
    pub extra_args: Option<Map<String, Value>>,
}

impl SwUpdateStrategy {
    /// Looks up an extra argument, accepting `-` and `_` spellings of `key`.
    #[must_use]
    pub fn extra_arg(&self, key: &str) -> Option<String> {
        let args = self.extra_args.as_ref()?;
        let value = args
            .get(key)
            .or_else(|| args.get(&key.replace('-', "_")))
            .or_else(|| args.get(&key.replace('_', "-")))?;
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Body of `POST /sw-update-strategy`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRequest {
    /// Strategy kind, as the API names it.
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// How subclouds are updated.
    #[serde(rename = "subcloud-apply-type", skip_serializing_if = "Option::is_none")]
    pub subcloud_apply_type: Option<String>,
    /// Subclouds updated in parallel.
    #[serde(rename = "max-parallel-subclouds", skip_serializing_if = "Option::is_none")]
    pub max_parallel_subclouds: Option<u32>,
    /// Whether the strategy stops at the first failure.
    #[serde(rename = "stop-on-failure", skip_serializing_if = "Option::is_none")]
    pub stop_on_failure: Option<String>,
    /// Subcloud the strategy or step targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_name: Option<String>,
    /// Subcloud group name or ID.
    #[serde(rename = "subcloud_group", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Kind-specific fields, sent at the top level.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StrategyRequest {
    /// Starts a request for `kind` with nothing else set.
    #[must_use]
    pub fn new(kind: StrategyKind) -> Self {
        Self {
            strategy_type: kind.wire_type().to_string(),
            subcloud_apply_type: None,
            max_parallel_subclouds: None,
            stop_on_failure: None,
            cloud_name: None,
            group: None,
            extra: BTreeMap::new(),
        }
    }

    /// Adds a kind-specific field.
    #[must_use]
    pub fn extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Serialize)]
struct ActionRequest {
    action: &'static str,
}

/// Manager for `/sw-update-strategy`.
#[derive(Debug)]
pub struct SwUpdateManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SwUpdateManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Creates a strategy.
    pub async fn create(&self, request: &StrategyRequest) -> Result<Vec<SwUpdateStrategy>> {
        self.base
            .create("/sw-update-strategy", Body::json(request)?, None)
            .await
    }

    /// The current strategy of `kind`.
    pub async fn detail(&self, kind: StrategyKind) -> Result<Vec<SwUpdateStrategy>> {
        self.base
            .list(&format!("/sw-update-strategy?type={}", kind.wire_type()), None)
            .await
    }

    /// Deletes the strategy and returns it in its `deleting` state.
    pub async fn delete(&self, kind: StrategyKind) -> Result<Vec<SwUpdateStrategy>> {
        self.base
            .fetch(
                ApiRequest::new(
                    Method::Delete,
                    format!("/sw-update-strategy?type={}", kind.wire_type()),
                ),
                OK,
                None,
            )
            .await
    }

    /// Starts the strategy.
    pub async fn apply(&self, kind: StrategyKind) -> Result<Vec<SwUpdateStrategy>> {
        self.action(kind, "apply").await
    }

    /// Aborts the strategy.
    pub async fn abort(&self, kind: StrategyKind) -> Result<Vec<SwUpdateStrategy>> {
        self.action(kind, "abort").await
    }

    async fn action(&self, kind: StrategyKind, action: &'static str) -> Result<Vec<SwUpdateStrategy>> {
        self.base
            .create(
                &format!("/sw-update-strategy/actions?type={}", kind.wire_type()),
                Body::json(&ActionRequest { action })?,
                None,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::testing::FakeTransport;

    fn strategy(kind: &str) -> Value {
        json!({
            "type": kind,
            "subcloud-apply-type": "parallel",
            "max-parallel-subclouds": 2,
            "stop-on-failure": false,
            "state": "initial",
            "created-at": "2024-05-01 10:00:00",
            "updated-at": null,
            "extra-args": {"release_id": "stx-10.0.1", "prestage-software-version": "24.09"}
        })
    }

    #[test_case(StrategyKind::Patch, "patch", "patch-strategy")]
    #[test_case(StrategyKind::KubeUpgrade, "kubernetes", "kube-upgrade-strategy")]
    #[test_case(StrategyKind::KubeRootcaUpdate, "kube-rootca-update", "kube-rootca-update-strategy")]
    #[test_case(StrategyKind::Firmware, "firmware", "fw-update-strategy")]
    #[test_case(StrategyKind::SwDeploy, "software", "sw-deploy-strategy")]
    fn kind_names(kind: StrategyKind, wire: &str, noun: &str) {
        assert_eq!(kind.wire_type(), wire);
        assert_eq!(kind.noun(), noun);
        assert_eq!(StrategyKind::from_wire(wire), Some(kind));
    }

    #[test]
    fn extra_args_accept_either_spelling() {
        let strategy: SwUpdateStrategy =
            crate::base::from_payload(&strategy("software")).expect("decodes");
        assert_eq!(strategy.extra_arg("release_id").as_deref(), Some("stx-10.0.1"));
        assert_eq!(strategy.extra_arg("release-id").as_deref(), Some("stx-10.0.1"));
        assert_eq!(strategy.extra_arg("prestage_software_version").as_deref(), Some("24.09"));
        assert_eq!(strategy.max_parallel_subclouds.as_deref(), Some("2"));
        assert_eq!(strategy.stop_on_failure.as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn create_flattens_extra_fields() {
        let fake = Arc::new(FakeTransport::with_json(strategy("patch")));
        let manager = SwUpdateManager::new(Arc::clone(&fake));
        let mut request = StrategyRequest::new(StrategyKind::Patch).extra("upload-only", "true");
        request.cloud_name = Some("subcloud1".into());

        let created = manager.create(&request).await.expect("create");

        assert_eq!(created[0].strategy_type, "patch");
        assert_eq!(
            fake.last_request().expect("request").body,
            Body::Json(json!({"type": "patch", "cloud_name": "subcloud1", "upload-only": "true"}))
        );
    }

    #[tokio::test]
    async fn actions_post_to_actions_path() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_json(strategy("kube-rootca-update"));
        let manager = SwUpdateManager::new(Arc::clone(&fake));

        manager.apply(StrategyKind::KubeRootcaUpdate).await.expect("apply");

        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.path, "/sw-update-strategy/actions?type=kube-rootca-update");
        assert_eq!(sent.body, Body::Json(json!({"action": "apply"})));
    }

    #[tokio::test]
    async fn delete_returns_strategy() {
        let fake = Arc::new(FakeTransport::with_json(strategy("firmware")));
        let manager = SwUpdateManager::new(Arc::clone(&fake));

        let deleted = manager.delete(StrategyKind::Firmware).await.expect("delete");

        assert_eq!(deleted[0].strategy_type, "firmware");
        let sent = fake.last_request().expect("request");
        assert_eq!(sent.method, Method::Delete);
        assert_eq!(sent.path, "/sw-update-strategy?type=firmware");
    }

    #[tokio::test]
    async fn conflict_is_api_error() {
        let fake = Arc::new(FakeTransport::new());
        fake.push_status(409, r#"{"error_message": "Strategy of type: patch already exists"}"#);
        let manager = SwUpdateManager::new(Arc::clone(&fake));

        let err = manager
            .create(&StrategyRequest::new(StrategyKind::Patch))
            .await
            .expect_err("conflict");

        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Strategy of type: patch already exists (HTTP 409)");
    }
}
