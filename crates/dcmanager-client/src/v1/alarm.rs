//! Alarm summaries: `/alarms`.

use std::sync::Arc;

use serde::Deserialize;

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::Transport;
use crate::utils::de;

/// Collection key of alarm summaries.
pub const ALARMS_KEY: &str = "alarm_summary";

/// Alarm counts of one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlarmSummary {
    /// Region of the subcloud.
    #[serde(alias = "region-name", alias = "name")]
    pub region_name: String,
    /// Critical alarm count.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub critical_alarms: Option<String>,
    /// Major alarm count.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub major_alarms: Option<String>,
    /// Minor alarm count.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub minor_alarms: Option<String>,
    /// Warning alarm count.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub warnings: Option<String>,
    /// Alarm status of the subcloud.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub cloud_status: Option<String>,
}

/// Manager for `/alarms`.
#[derive(Debug)]
pub struct AlarmManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> AlarmManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Alarm counts of every subcloud.
    pub async fn list(&self) -> Result<Vec<AlarmSummary>> {
        self.base.list("/alarms", Some(ALARMS_KEY)).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    #[tokio::test]
    async fn list_decodes_counts() {
        let fake = Arc::new(FakeTransport::with_json(json!({
            "alarm_summary": [{
                "region_name": "subcloud1", "critical_alarms": 0, "major_alarms": 1,
                "minor_alarms": 2, "warnings": 0, "cloud_status": "degraded"
            }]
        })));
        let manager = AlarmManager::new(Arc::clone(&fake));

        let alarms = manager.list().await.expect("list");

        assert_eq!(alarms[0].region_name, "subcloud1");
        assert_eq!(alarms[0].major_alarms.as_deref(), Some("1"));
        assert_eq!(alarms[0].cloud_status.as_deref(), Some("degraded"));
        assert_eq!(fake.last_request().expect("request").path, "/alarms");
    }
}
