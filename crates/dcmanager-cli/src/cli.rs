//! Command-line argument parsing with clap.
//!
//! Global flags live on [`GlobalArgs`] and may appear anywhere on the command
//! line. Each noun's verbs and their flags are declared next to the code that
//! runs them, in [`crate::commands`].

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::alarm::AlarmCommands;
use crate::commands::association::AssociationCommands;
use crate::commands::peer_group::PeerGroupCommands;
use crate::commands::strategy::{
    FirmwareStrategyCommands, KubeRootcaStrategyCommands, KubeUpgradeStrategyCommands,
    PatchStrategyCommands, PrestageStrategyCommands, SwDeployStrategyCommands,
    UpgradeStrategyCommands,
};
use crate::commands::strategy_config::StrategyConfigCommands;
use crate::commands::strategy_step::StrategyStepCommands;
use crate::commands::subcloud::SubcloudCommands;
use crate::commands::subcloud_backup::SubcloudBackupCommands;
use crate::commands::subcloud_deploy::SubcloudDeployCommands;
use crate::commands::subcloud_group::SubcloudGroupCommands;
use crate::commands::system_peer::SystemPeerCommands;

/// Distributed cloud manager CLI.
#[derive(Parser, Debug, Clone)]
#[command(name = "dcmanager")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Global options.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
    /// Bare values, one line per row or field.
    Value,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Identity service username.
    #[arg(long, global = true, env = "OS_USERNAME")]
    pub os_username: Option<String>,

    /// Identity service password.
    #[arg(long, global = true, env = "OS_PASSWORD", hide_env_values = true)]
    pub os_password: Option<String>,

    /// Identity service URL.
    #[arg(long, global = true, env = "OS_AUTH_URL")]
    pub os_auth_url: Option<String>,

    /// Project to scope the token to. Falls back to `OS_TENANT_NAME`.
    #[arg(long, global = true, env = "OS_PROJECT_NAME")]
    pub os_project_name: Option<String>,

    /// Project ID to scope the token to. Falls back to `OS_TENANT_ID`.
    #[arg(long, global = true, env = "OS_PROJECT_ID")]
    pub os_project_id: Option<String>,

    /// User ID, instead of a username.
    #[arg(long, global = true, env = "OS_USER_ID")]
    pub os_user_id: Option<String>,

    /// Domain name of the user.
    #[arg(long, global = true, env = "OS_USER_DOMAIN_NAME")]
    pub os_user_domain_name: Option<String>,

    /// Domain ID of the user.
    #[arg(long, global = true, env = "OS_USER_DOMAIN_ID")]
    pub os_user_domain_id: Option<String>,

    /// Domain name of the project.
    #[arg(long, global = true, env = "OS_PROJECT_DOMAIN_NAME")]
    pub os_project_domain_name: Option<String>,

    /// Domain ID of the project.
    #[arg(long, global = true, env = "OS_PROJECT_DOMAIN_ID")]
    pub os_project_domain_id: Option<String>,

    /// Region used to pick the service endpoint from the catalog.
    #[arg(long, global = true, env = "OS_REGION_NAME")]
    pub os_region_name: Option<String>,

    /// Pre-issued token; skips password authentication.
    #[arg(long, global = true, env = "OS_AUTH_TOKEN", hide_env_values = true)]
    pub os_auth_token: Option<String>,

    /// Cache the authenticated session on disk between invocations.
    #[arg(long, global = true, env = "OS_CACHE")]
    pub os_cache: bool,

    /// dcmanager API URL; skips catalog discovery.
    #[arg(long, global = true, env = "DCMANAGER_URL")]
    pub dcmanager_url: Option<String>,

    /// dcmanager API version.
    #[arg(long, global = true, env = "DCMANAGER_API_VERSION", default_value = "v1.0")]
    pub dcmanager_api_version: String,

    /// Service type of dcmanager in the catalog.
    #[arg(long, global = true, env = "DCMANAGER_SERVICE_TYPE", default_value = "dcmanager")]
    pub dcmanager_service_type: String,

    /// Catalog interface to use.
    #[arg(long, global = true, env = "OS_ENDPOINT_TYPE", default_value = "internalURL")]
    pub os_endpoint_type: String,

    /// CA bundle used to verify the server.
    #[arg(long, global = true, env = "OS_CACERT")]
    pub os_cacert: Option<PathBuf>,

    /// Client certificate (PEM).
    #[arg(long, global = true, env = "OS_CERT")]
    pub os_cert: Option<PathBuf>,

    /// Client certificate key (PEM).
    #[arg(long, global = true, env = "OS_KEY")]
    pub os_key: Option<PathBuf>,

    /// Skip server certificate verification.
    #[arg(long, global = true, env = "DCMANAGERCLIENT_INSECURE")]
    pub insecure: bool,

    /// Show debug output.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Increase verbosity; repeat for more.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to a file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// HMAC key for request profiling.
    #[arg(long, global = true, value_name = "HMAC_KEY")]
    pub profile: Option<String>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Seconds to wait for a confirmation answer.
    #[arg(long, global = true, default_value_t = 10)]
    pub confirmation_timeout: u64,
}

/// Top-level nouns.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Alarm summaries of the system controller and subclouds.
    Alarm {
        /// Alarm subcommand to execute.
        #[command(subcommand)]
        command: AlarmCommands,
    },

    /// Subcloud lifecycle.
    Subcloud {
        /// Subcloud subcommand to execute.
        #[command(subcommand)]
        command: SubcloudCommands,
    },

    /// Subcloud deployment artifacts.
    SubcloudDeploy {
        /// Deploy artifact subcommand to execute.
        #[command(subcommand)]
        command: SubcloudDeployCommands,
    },

    /// Subcloud backup and restore.
    SubcloudBackup {
        /// Backup subcommand to execute.
        #[command(subcommand)]
        command: SubcloudBackupCommands,
    },

    /// Subcloud groups.
    SubcloudGroup {
        /// Group subcommand to execute.
        #[command(subcommand)]
        command: SubcloudGroupCommands,
    },

    /// Subcloud peer groups.
    SubcloudPeerGroup {
        /// Peer group subcommand to execute.
        #[command(subcommand)]
        command: PeerGroupCommands,
    },

    /// Peer system controllers.
    SystemPeer {
        /// System peer subcommand to execute.
        #[command(subcommand)]
        command: SystemPeerCommands,
    },

    /// Associations between peer groups and system peers.
    PeerGroupAssociation {
        /// Association subcommand to execute.
        #[command(subcommand)]
        command: AssociationCommands,
    },

    /// Per-cloud orchestration options.
    StrategyConfig {
        /// Options subcommand to execute.
        #[command(subcommand)]
        command: StrategyConfigCommands,
    },

    /// Per-subcloud progress of the active strategy.
    StrategyStep {
        /// Step subcommand to execute.
        #[command(subcommand)]
        command: StrategyStepCommands,
    },

    /// Patch orchestration.
    PatchStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: PatchStrategyCommands,
    },

    /// Platform upgrade orchestration.
    UpgradeStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: UpgradeStrategyCommands,
    },

    /// Kubernetes upgrade orchestration.
    KubeUpgradeStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: KubeUpgradeStrategyCommands,
    },

    /// Kubernetes root CA update orchestration.
    KubeRootcaUpdateStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: KubeRootcaStrategyCommands,
    },

    /// Firmware update orchestration.
    FwUpdateStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: FirmwareStrategyCommands,
    },

    /// Prestage orchestration.
    PrestageStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: PrestageStrategyCommands,
    },

    /// Software deploy orchestration.
    SwDeployStrategy {
        /// Strategy subcommand to execute.
        #[command(subcommand)]
        command: SwDeployStrategyCommands,
    },
}
