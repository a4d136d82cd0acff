//! Version 1.0 of the dcmanager API.
//!
//! [`DcManagerClient`] holds one manager per resource family, all sharing a
//! single transport.

pub mod alarm;
pub mod peer_group_association;
pub mod phased_subcloud_deploy;
pub mod strategy_step;
pub mod subcloud;
pub mod subcloud_backup;
pub mod subcloud_deploy;
pub mod subcloud_group;
pub mod subcloud_peer_group;
pub mod sw_update;
pub mod sw_update_options;
pub mod system_peer;

use std::sync::Arc;

use crate::error::Result;
use crate::transport::Transport;

pub use alarm::{AlarmManager, AlarmSummary};
pub use peer_group_association::{AssociationRequest, PeerGroupAssociation, PeerGroupAssociationManager};
pub use phased_subcloud_deploy::{DeployPhase, PhasedSubcloudDeployManager};
pub use strategy_step::{StrategyStep, StrategyStepManager};
pub use subcloud::{EndpointSync, PrestageRequest, Subcloud, SubcloudManager};
pub use subcloud_backup::{BackupDeleteRequest, SubcloudBackupManager};
pub use subcloud_deploy::{DeployDeleteOptions, SubcloudDeploy, SubcloudDeployManager};
pub use subcloud_group::{SubcloudGroup, SubcloudGroupManager, SubcloudGroupRequest};
pub use subcloud_peer_group::{
    PeerGroupRequest, PeerGroupStatus, SubcloudPeerGroup, SubcloudPeerGroupManager,
};
pub use sw_update::{StrategyKind, StrategyRequest, SwUpdateManager, SwUpdateStrategy};
pub use sw_update_options::{
    DEFAULT_REGION_NAME, SwUpdateOptions, SwUpdateOptionsManager, SwUpdateOptionsRequest,
};
pub use system_peer::{SystemPeer, SystemPeerManager, SystemPeerRequest};

/// Entry point of the SDK: one named manager per resource family.
#[derive(Debug)]
pub struct DcManagerClient<T> {
    /// `/alarms`
    pub alarms: AlarmManager<T>,
    /// `/subclouds`
    pub subclouds: SubcloudManager<T>,
    /// `/subcloud-backup`
    pub subcloud_backups: SubcloudBackupManager<T>,
    /// `/subcloud-deploy`
    pub subcloud_deploys: SubcloudDeployManager<T>,
    /// `/phased-subcloud-deploy`
    pub phased_deploys: PhasedSubcloudDeployManager<T>,
    /// `/subcloud-groups`
    pub subcloud_groups: SubcloudGroupManager<T>,
    /// `/subcloud-peer-groups`
    pub subcloud_peer_groups: SubcloudPeerGroupManager<T>,
    /// `/system-peers`
    pub system_peers: SystemPeerManager<T>,
    /// `/peer-group-associations`
    pub peer_group_associations: PeerGroupAssociationManager<T>,
    /// `/sw-update-strategy`, every strategy kind
    pub strategies: SwUpdateManager<T>,
    /// `/sw-update-strategy/steps`
    pub strategy_steps: StrategyStepManager<T>,
    /// `/sw-update-options`
    pub sw_update_options: SwUpdateOptionsManager<T>,
    transport: Arc<T>,
}

impl<T: Transport> DcManagerClient<T> {
    /// Builds every manager over `transport`.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Builds every manager over an already shared transport.
    #[must_use]
    pub fn from_shared(transport: Arc<T>) -> Self {
        Self {
            alarms: AlarmManager::new(Arc::clone(&transport)),
            subclouds: SubcloudManager::new(Arc::clone(&transport)),
            subcloud_backups: SubcloudBackupManager::new(Arc::clone(&transport)),
            subcloud_deploys: SubcloudDeployManager::new(Arc::clone(&transport)),
            phased_deploys: PhasedSubcloudDeployManager::new(Arc::clone(&transport)),
            subcloud_groups: SubcloudGroupManager::new(Arc::clone(&transport)),
            subcloud_peer_groups: SubcloudPeerGroupManager::new(Arc::clone(&transport)),
            system_peers: SystemPeerManager::new(Arc::clone(&transport)),
            peer_group_associations: PeerGroupAssociationManager::new(Arc::clone(&transport)),
            strategies: SwUpdateManager::new(Arc::clone(&transport)),
            strategy_steps: StrategyStepManager::new(Arc::clone(&transport)),
            sw_update_options: SwUpdateOptionsManager::new(Arc::clone(&transport)),
            transport,
        }
    }

    /// The shared transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Discards cached credentials and authenticates again.
    pub async fn reauthenticate(&self) -> Result<()> {
        self.transport.reauthenticate().await
    }
}
