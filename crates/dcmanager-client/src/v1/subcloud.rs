//! Subclouds: `/subclouds`.

use std::sync::Arc;

use serde::Deserialize;

use crate::base::ResourceManager;
use crate::error::Result;
use crate::transport::{Body, Form, Transport};
use crate::utils::{bool_flag, de};

/// Collection key of subcloud listings.
pub const SUBCLOUDS_KEY: &str = "subclouds";

/// Sync state of one endpoint type on a subcloud.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EndpointSync {
    /// Endpoint type, e.g. `platform`, `identity`, `dc-cert`.
    #[serde(alias = "endpoint-type")]
    pub endpoint_type: String,
    /// `in-sync`, `out-of-sync` or `unknown`.
    #[serde(default, alias = "sync-status", deserialize_with = "de::opt_string")]
    pub sync_status: Option<String>,
}

/// Snapshot of one subcloud.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Subcloud {
    /// Subcloud ID.
    #[serde(rename = "id", deserialize_with = "de::id")]
    pub subcloud_id: String,
    /// Subcloud name.
    pub name: String,
    /// Free-form description.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub description: Option<String>,
    /// Physical location.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub location: Option<String>,
    /// Software release running on the subcloud.
    #[serde(default, rename = "software-version", alias = "software_version", deserialize_with = "de::opt_string")]
    pub software_version: Option<String>,
    /// managed or unmanaged.
    #[serde(default, rename = "management-state", alias = "management_state", deserialize_with = "de::opt_string")]
    pub management_state: Option<String>,
    /// online or offline.
    #[serde(default, rename = "availability-status", alias = "availability_status", deserialize_with = "de::opt_string")]
    pub availability_status: Option<String>,
    /// Deploy status.
    #[serde(default, rename = "deploy-status", alias = "deploy_status", deserialize_with = "de::opt_string")]
    pub deploy_status: Option<String>,
    /// Management subnet.
    #[serde(default, rename = "management-subnet", alias = "management_subnet", deserialize_with = "de::opt_string")]
    pub management_subnet: Option<String>,
    /// First management address.
    #[serde(default, rename = "management-start-ip", alias = "management_start_ip", deserialize_with = "de::opt_string")]
    pub management_start_ip: Option<String>,
    /// Last management address.
    #[serde(default, rename = "management-end-ip", alias = "management_end_ip", deserialize_with = "de::opt_string")]
    pub management_end_ip: Option<String>,
    /// Management gateway address.
    #[serde(default, rename = "management-gateway-ip", alias = "management_gateway_ip", deserialize_with = "de::opt_string")]
    pub management_gateway_ip: Option<String>,
    /// System controller gateway address.
    #[serde(default, rename = "systemcontroller-gateway-ip", alias = "systemcontroller_gateway_ip", deserialize_with = "de::opt_string")]
    pub systemcontroller_gateway_ip: Option<String>,
    /// Subcloud group ID.
    #[serde(default, alias = "group-id", deserialize_with = "de::opt_string")]
    pub group_id: Option<String>,
    /// Subcloud peer group ID.
    #[serde(default, alias = "peer-group-id", deserialize_with = "de::opt_string")]
    pub peer_group_id: Option<String>,
    /// Creation time.
    #[serde(default, rename = "created-at", alias = "created_at", deserialize_with = "de::opt_string")]
    pub created_at: Option<String>,
    /// Last update time.
    #[serde(default, rename = "updated-at", alias = "updated_at", deserialize_with = "de::opt_string")]
    pub updated_at: Option<String>,
    /// Overall sync status.
    #[serde(default, alias = "sync-status", deserialize_with = "de::opt_string")]
    pub sync_status: Option<String>,
    /// Sync status per endpoint.
    #[serde(default, alias = "endpoint-sync-status")]
    pub endpoint_sync_status: Vec<EndpointSync>,
    /// Backup status.
    #[serde(default, rename = "backup-status", alias = "backup_status", deserialize_with = "de::opt_string")]
    pub backup_status: Option<String>,
    /// Time of the last backup.
    #[serde(default, rename = "backup-datetime", alias = "backup_datetime", deserialize_with = "de::opt_string")]
    pub backup_datetime: Option<String>,
    /// Last deploy error.
    #[serde(default, rename = "error-description", alias = "error_description", deserialize_with = "de::opt_string")]
    pub error_description: Option<String>,
    /// Region of the subcloud.
    #[serde(default, rename = "region-name", alias = "region_name", deserialize_with = "de::opt_string")]
    pub region_name: Option<String>,
    /// OAM floating address.
    #[serde(default, alias = "oam-floating-ip", deserialize_with = "de::opt_string")]
    pub oam_floating_ip: Option<String>,
    /// Deploy config sync status.
    #[serde(default, alias = "deploy-config-sync-status", deserialize_with = "de::opt_string")]
    pub deploy_config_sync_status: Option<String>,
    /// Prestage status.
    #[serde(default, rename = "prestage-status", alias = "prestage_status", deserialize_with = "de::opt_string")]
    pub prestage_status: Option<String>,
    /// Prestaged software versions.
    #[serde(default, rename = "prestage-versions", alias = "prestage_versions", deserialize_with = "de::opt_string")]
    pub prestage_versions: Option<String>,
    /// Rehome data, as JSON text.
    #[serde(default, alias = "rehome-data", deserialize_with = "de::opt_string")]
    pub rehome_data: Option<String>,
}

/// Body of `PATCH /subclouds/{ref}/prestage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PrestageRequest {
    /// Base64-encoded sysadmin password.
    pub sysadmin_password: String,
    /// Run despite failed checks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<String>,
    /// Software release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Prestage for an install.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_install: Option<String>,
    /// Prestage for a software deployment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_sw_deploy: Option<String>,
}

/// Manager for `/subclouds`.
#[derive(Debug)]
pub struct SubcloudManager<T> {
    base: ResourceManager<T>,
}

impl<T: Transport> SubcloudManager<T> {
    pub(crate) const fn new(transport: Arc<T>) -> Self {
        Self {
            base: ResourceManager::new(transport),
        }
    }

    /// Adds a subcloud. The form carries bootstrap values and credentials.
    pub async fn add(&self, form: Form) -> Result<Vec<Subcloud>> {
        self.base
            .create("/subclouds", Body::Multipart(form), Some(SUBCLOUDS_KEY))
            .await
    }

    /// Lists all subclouds.
    pub async fn list(&self) -> Result<Vec<Subcloud>> {
        self.base.list("/subclouds", Some(SUBCLOUDS_KEY)).await
    }

    /// Shows one subcloud; `detail` adds runtime attributes such as the OAM address.
    pub async fn detail(&self, subcloud_ref: &str, detail: bool) -> Result<Vec<Subcloud>> {
        let path = if detail {
            format!("/subclouds/{subcloud_ref}/detail")
        } else {
            format!("/subclouds/{subcloud_ref}")
        };
        self.base.list(&path, Some(SUBCLOUDS_KEY)).await
    }

    /// Updates a subcloud's attributes.
    pub async fn update(&self, subcloud_ref: &str, form: Form) -> Result<Vec<Subcloud>> {
        self.base
            .update(
                &format!("/subclouds/{subcloud_ref}"),
                Body::Multipart(form),
                Some(SUBCLOUDS_KEY),
            )
            .await
    }

    /// Puts a subcloud under management.
    pub async fn manage(&self, subcloud_ref: &str, force: bool) -> Result<Vec<Subcloud>> {
        let mut form = Form::new().text("management-state", "managed");
        if force {
            form = form.text("force", bool_flag(true));
        }
        self.update(subcloud_ref, form).await
    }

    /// Takes a subcloud out of management, optionally for migration.
    pub async fn unmanage(&self, subcloud_ref: &str, migrate: bool) -> Result<Vec<Subcloud>> {
        let mut form = Form::new().text("management-state", "unmanaged");
        if migrate {
            form = form.text("migrate", bool_flag(true));
        }
        self.update(subcloud_ref, form).await
    }

    /// Deletes a subcloud.
    pub async fn delete(&self, subcloud_ref: &str) -> Result<()> {
        self.base.delete(&format!("/subclouds/{subcloud_ref}")).await
    }

    /// Reinstalls, bootstraps and deploys a subcloud again.
    pub async fn redeploy(&self, subcloud_ref: &str, form: Form) -> Result<Vec<Subcloud>> {
        self.base
            .update(
                &format!("/subclouds/{subcloud_ref}/redeploy"),
                Body::Multipart(form),
                Some(SUBCLOUDS_KEY),
            )
            .await
    }

    /// Prestages software on a subcloud.
    pub async fn prestage(
        &self,
        subcloud_ref: &str,
        request: &PrestageRequest,
    ) -> Result<Vec<Subcloud>> {
        self.base
            .update(
                &format!("/subclouds/{subcloud_ref}/prestage"),
                Body::json(request)?,
                Some(SUBCLOUDS_KEY),
            )
            .await
    }
}
