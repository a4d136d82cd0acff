//! Per-subcloud steps of the active strategy: `/sw-update-strategy/steps`.

use std::sync::Arc;

use serde::Deserialize;

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::Transport;
use crate::utils::de;

/// Collection key of step listings.
pub const STEPS_KEY: &str = "strategy-steps";

/// Progress of one cloud within a strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StrategyStep {
    /// Subcloud name.
    pub cloud: String,
    /// Stage number.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub stage: Option<String>,
    /// Step state.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub state: Option<String>,
    /// Step details.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub details: Option<String>,
    /// Step start time.
    #[serde(default, rename = "started-at", alias = "started_at", deserialize_with = "de::opt_string")]
    pub started_at: Option<String>,
    /// Step end time.
    #[serde(default, rename = "finished-at", alias = "finished_at", deserialize_with = "de::opt_string")]
    pub finished_at: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
}

/// Manager for strategy steps.
#[derive(Debug)]
pub struct StrategyStepManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> StrategyStepManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Every strategy step.
    pub async fn list(&self) -> Result<Vec<StrategyStep>> {
        self.base
            .list("/sw-update-strategy/steps", Some(STEPS_KEY))
            .await
    }

    /// Step of one subcloud.
    pub async fn detail(&self, cloud_name: &str) -> Result<Vec<StrategyStep>> {
        self.base
            .list(&format!("/sw-update-strategy/steps/{cloud_name}"), Some(STEPS_KEY))
            .await
    }
}
