//! `subcloud` commands, plus the subcloud formatters shared by other nouns.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use dcmanager_client::utils::bool_flag;
use dcmanager_client::v1::{PrestageRequest, Subcloud};
use dcmanager_client::{DcManagerClient, Form, Transport};

use super::phased_deploy::{self, PhasedDeployCommands};
use super::{Env, ResourceCommand, Secrets, Shape, exclusive, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt, password_or_prompt};

/// Columns of subcloud listings.
pub const BASIC_COLUMNS: &[&str] = &[
    "id",
    "name",
    "management",
    "availability",
    "deploy status",
    "sync",
    "backup status",
    "prestage status",
];

/// Columns every subcloud detail view starts with.
pub const DETAIL_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "location",
    "software_version",
    "management",
    "availability",
    "deploy_status",
    "management_subnet",
    "management_start_ip",
    "management_end_ip",
    "management_gateway_ip",
    "systemcontroller_gateway_ip",
    "group_id",
    "peer_group_id",
    "created_at",
    "updated_at",
    "backup_status",
    "backup_datetime",
    "prestage_status",
    "prestage_versions",
];

const ERROR_COLUMNS: &[&str] = &["error_description"];
const NO_ERRORS: &str = "No errors present for the specified subcloud";

/// Deploy states of subclouds owned by a peer site; hidden unless `--all`.
const SECONDARY_STATES: &[&str] = &["secondary", "secondary-failed"];

/// Row of a subcloud listing.
pub fn basic_record(subcloud: Option<&Subcloud>) -> Record {
    record(BASIC_COLUMNS, subcloud, |s| {
        vec![
            s.subcloud_id.clone(),
            s.name.clone(),
            text(s.management_state.as_ref()),
            text(s.availability_status.as_ref()),
            text(s.deploy_status.as_ref()),
            text(s.sync_status.as_ref()),
            text(s.backup_status.as_ref()),
            text(s.prestage_status.as_ref()),
        ]
    })
}

/// Field/value view of one subcloud.
///
/// One `<endpoint>_sync_status` column follows per endpoint; `detail` adds the
/// runtime columns the server only reports on `/detail`.
pub fn detail_record(subcloud: Option<&Subcloud>, detail: bool) -> Record {
    let Some(s) = subcloud else {
        return Record::placeholder(DETAIL_COLUMNS);
    };
    let mut rec = Record::new(
        DETAIL_COLUMNS,
        vec![
            s.subcloud_id.clone(),
            s.name.clone(),
            text(s.description.as_ref()),
            text(s.location.as_ref()),
            text(s.software_version.as_ref()),
            text(s.management_state.as_ref()),
            text(s.availability_status.as_ref()),
            text(s.deploy_status.as_ref()),
            text(s.management_subnet.as_ref()),
            text(s.management_start_ip.as_ref()),
            text(s.management_end_ip.as_ref()),
            text(s.management_gateway_ip.as_ref()),
            text(s.systemcontroller_gateway_ip.as_ref()),
            text(s.group_id.as_ref()),
            text(s.peer_group_id.as_ref()),
            text(s.created_at.as_ref()),
            text(s.updated_at.as_ref()),
            text(s.backup_status.as_ref()),
            text(s.backup_datetime.as_ref()),
            text(s.prestage_status.as_ref()),
            text(s.prestage_versions.as_ref()),
        ],
    );
    for endpoint in &s.endpoint_sync_status {
        rec.push(
            format!("{}_sync_status", endpoint.endpoint_type),
            text(endpoint.sync_status.as_ref()),
        );
    }
    if detail {
        if let Some(ip) = &s.oam_floating_ip {
            rec.push("oam_floating_ip", ip.clone());
        }
        if let Some(status) = &s.deploy_config_sync_status {
            rec.push("deploy_config_sync_status", status.clone());
        }
        if let Some(region) = &s.region_name {
            rec.push("region_name", region.clone());
        }
    }
    rec
}

/// Subcloud subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SubcloudCommands {
    /// Add a subcloud and deploy it.
    Add(AddArgs),
    /// List subclouds.
    List(ListArgs),
    /// Show one subcloud.
    Show(ShowArgs),
    /// Show the last error reported for a subcloud.
    Errors(SubcloudRef),
    /// Update subcloud attributes or reconfigure its network.
    Update(UpdateArgs),
    /// Put a subcloud under management.
    Manage(ManageArgs),
    /// Take a subcloud out of management.
    Unmanage(UnmanageArgs),
    /// Delete a subcloud.
    Delete(DeleteArgs),
    /// Reinstall, bootstrap and deploy a subcloud again.
    Redeploy(RedeployArgs),
    /// Prestage software on a subcloud.
    Prestage(PrestageArgs),
    /// Run a subcloud deployment one phase at a time.
    Deploy {
        /// Phase to run.
        #[command(subcommand)]
        command: PhasedDeployCommands,
    },
    /// Removed; use `subcloud deploy config`.
    Reconfig(DeprecatedArgs),
    /// Removed; use `subcloud redeploy`.
    Reinstall(DeprecatedArgs),
    /// Removed; use `subcloud-backup restore`.
    Restore(DeprecatedArgs),
}

/// Arguments of removed verbs; everything is accepted and ignored.
#[derive(Args, Debug, Clone, Default)]
pub struct DeprecatedArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    args: Vec<String>,
}

/// A subcloud named by id or name.
#[derive(Args, Debug, Clone, Default)]
pub struct SubcloudRef {
    /// Name or ID of the subcloud.
    pub subcloud: String,
}

/// Arguments of `subcloud add`.
#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// IP address used to bootstrap the subcloud.
    #[arg(long)]
    pub bootstrap_address: String,

    /// YAML file with the bootstrap values.
    #[arg(long)]
    pub bootstrap_values: PathBuf,

    /// YAML file with the deploy configuration.
    #[arg(long)]
    pub deploy_config: Option<PathBuf>,

    /// YAML file with the remote install values.
    #[arg(long)]
    pub install_values: Option<PathBuf>,

    /// sysadmin password of the subcloud; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// BMC password; prompted when absent and install values are given.
    #[arg(long)]
    pub bmc_password: Option<String>,

    /// Name or ID of the subcloud group.
    #[arg(long)]
    pub group: Option<String>,

    /// Migrate the subcloud from another system controller.
    #[arg(long)]
    pub migrate: bool,

    /// Enroll a factory-installed subcloud.
    #[arg(long)]
    pub enroll: bool,

    /// cloud-init configuration archive, used with `--enroll`.
    #[arg(long)]
    pub cloud_init_config: Option<PathBuf>,

    /// Software release of the subcloud.
    #[arg(long)]
    pub release: Option<String>,

    /// Subcloud name, when it differs from the bootstrap values.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for AddArgs {
    type Resource = Subcloud;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        exclusive(self.migrate, self.enroll, "The --migrate and --enroll options are mutually exclusive")?;
        exclusive(
            self.migrate,
            self.deploy_config.is_some(),
            "The --deploy-config option is not allowed with --migrate",
        )?;
        if self.enroll && self.install_values.is_none() {
            return Err(CliError::invalid("The --install-values option is required with --enroll"));
        }
        if self.cloud_init_config.is_some() && !self.enroll {
            return Err(CliError::invalid("The --cloud-init-config option requires --enroll"));
        }
        self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        if self.install_values.is_some() {
            self.secrets.bmc = Some(password_or_prompt(prompt, self.bmc_password.as_deref(), "bmc")?);
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = Form::new()
            .text("bootstrap-address", &self.bootstrap_address)
            .text_opt("sysadmin_password", self.secrets.sysadmin.as_ref())
            .text_opt("bmc_password", self.secrets.bmc.as_ref())
            .text_opt("group_id", self.group.as_ref())
            .text_opt("release", self.release.as_ref())
            .text_opt("name", self.name.as_ref())
            .text_opt("migrate", self.migrate.then_some(bool_flag(true)))
            .text_opt("enroll", self.enroll.then_some(bool_flag(true)))
            .file("bootstrap_values", &self.bootstrap_values)?
            .file_opt("install_values", self.install_values.as_ref())?
            .file_opt("deploy_config", self.deploy_config.as_ref())?
            .file_opt("cloud_init_config", self.cloud_init_config.as_ref())?;
        client.subclouds.add(form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// Arguments of `subcloud list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Include subclouds managed by a peer site.
    #[arg(long)]
    pub all: bool,
}

impl ResourceCommand for ListArgs {
    type Resource = Subcloud;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let mut subclouds = client.subclouds.list().await?;
        if !self.all {
            subclouds.retain(|s| {
                !s.deploy_status
                    .as_deref()
                    .is_some_and(|status| SECONDARY_STATES.contains(&status))
            });
        }
        Ok(subclouds)
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        basic_record(resource)
    }
}

/// Arguments of `subcloud show`.
#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// Include runtime attributes such as the OAM floating address.
    #[arg(long)]
    pub detail: bool,
}

impl ResourceCommand for ShowArgs {
    type Resource = Subcloud;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        client.subclouds.detail(&self.subcloud, self.detail).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, self.detail)
    }
}

impl ResourceCommand for SubcloudRef {
    type Resource = Subcloud;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        client.subclouds.detail(&self.subcloud, false).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        record(ERROR_COLUMNS, resource, |s| {
            let description = s
                .error_description
                .as_deref()
                .filter(|d| !d.trim().is_empty() && *d != "No errors present")
                .unwrap_or(NO_ERRORS);
            vec![description.to_string()]
        })
    }
}

/// Arguments of `subcloud update`.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// New name of the subcloud.
    #[arg(long)]
    pub name: Option<String>,

    /// Description of the subcloud.
    #[arg(long)]
    pub description: Option<String>,

    /// Location of the subcloud.
    #[arg(long)]
    pub location: Option<String>,

    /// Name or ID of the subcloud group.
    #[arg(long)]
    pub group: Option<String>,

    /// Name or ID of the subcloud peer group.
    #[arg(long)]
    pub peer_group: Option<String>,

    /// New management subnet.
    #[arg(long)]
    pub management_subnet: Option<String>,

    /// New management start address.
    #[arg(long)]
    pub management_start_ip: Option<String>,

    /// New management end address.
    #[arg(long)]
    pub management_end_ip: Option<String>,

    /// New management gateway address.
    #[arg(long)]
    pub management_gateway_ip: Option<String>,

    /// Bootstrap address, required for network reconfiguration.
    #[arg(long)]
    pub bootstrap_address: Option<String>,

    /// YAML file with bootstrap values.
    #[arg(long)]
    pub bootstrap_values: Option<PathBuf>,

    /// YAML file with remote install values.
    #[arg(long)]
    pub install_values: Option<PathBuf>,

    /// sysadmin password; prompted when reconfiguring the network.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// BMC password; prompted when install values are given.
    #[arg(long)]
    pub bmc_password: Option<String>,

    #[arg(skip)]
    secrets: Secrets,
}

impl UpdateArgs {
    fn network_fields(&self) -> [Option<&String>; 4] {
        [
            self.management_subnet.as_ref(),
            self.management_start_ip.as_ref(),
            self.management_end_ip.as_ref(),
            self.management_gateway_ip.as_ref(),
        ]
    }

    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.group.is_none()
            && self.peer_group.is_none()
            && self.network_fields().iter().all(Option::is_none)
            && self.bootstrap_address.is_none()
            && self.bootstrap_values.is_none()
            && self.install_values.is_none()
    }
}

impl ResourceCommand for UpdateArgs {
    type Resource = Subcloud;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.is_empty() {
            return Err(CliError::invalid("Nothing to update"));
        }
        let network = self.network_fields();
        let reconfigure = network.iter().any(Option::is_some);
        if reconfigure && (network.iter().any(Option::is_none) || self.bootstrap_address.is_none()) {
            return Err(CliError::invalid(
                "The following parameters are required for subcloud network reconfiguration: \
                 --management-subnet, --management-start-ip, --management-end-ip, \
                 --management-gateway-ip, --bootstrap-address",
            ));
        }
        if reconfigure || self.sysadmin_password.is_some() {
            self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        }
        if self.install_values.is_some() {
            self.secrets.bmc = Some(password_or_prompt(prompt, self.bmc_password.as_deref(), "bmc")?);
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = Form::new()
            .text_opt("name", self.name.as_ref())
            .text_opt("description", self.description.as_ref())
            .text_opt("location", self.location.as_ref())
            .text_opt("group_id", self.group.as_ref())
            .text_opt("peer_group", self.peer_group.as_ref())
            .text_opt("management_subnet", self.management_subnet.as_ref())
            .text_opt("management_start_ip", self.management_start_ip.as_ref())
            .text_opt("management_end_ip", self.management_end_ip.as_ref())
            .text_opt("management_gateway_ip", self.management_gateway_ip.as_ref())
            .text_opt("bootstrap_address", self.bootstrap_address.as_ref())
            .text_opt("sysadmin_password", self.secrets.sysadmin.as_ref())
            .text_opt("bmc_password", self.secrets.bmc.as_ref())
            .file_opt("bootstrap_values", self.bootstrap_values.as_ref())?
            .file_opt("install_values", self.install_values.as_ref())?;
        client.subclouds.update(&self.subcloud, form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// Arguments of `subcloud manage`.
#[derive(Args, Debug, Clone, Default)]
pub struct ManageArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// Manage even if the subcloud is not fully in sync.
    #[arg(long)]
    pub force: bool,
}

impl ResourceCommand for ManageArgs {
    type Resource = Subcloud;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        client.subclouds.manage(&self.subcloud, self.force).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// Arguments of `subcloud unmanage`.
#[derive(Args, Debug, Clone, Default)]
pub struct UnmanageArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// Prepare the subcloud for migration to a peer site.
    #[arg(long)]
    pub migrate: bool,
}

impl ResourceCommand for UnmanageArgs {
    type Resource = Subcloud;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        client.subclouds.unmanage(&self.subcloud, self.migrate).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// Arguments of `subcloud delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,
}

impl ResourceCommand for DeleteArgs {
    type Resource = ();

    fn shape(&self) -> Shape {
        Shape::Silent
    }

    fn prepare(&mut self, prompt: &mut dyn Prompt, confirm: &Confirmation) -> Result<(), CliError> {
        confirm.require(prompt, &format!("delete subcloud {}", self.subcloud), self.yes)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        client.subclouds.delete(&self.subcloud).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Arguments of `subcloud redeploy`.
#[derive(Args, Debug, Clone, Default)]
pub struct RedeployArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// YAML file with remote install values.
    #[arg(long)]
    pub install_values: Option<PathBuf>,

    /// YAML file with bootstrap values.
    #[arg(long)]
    pub bootstrap_values: Option<PathBuf>,

    /// YAML file with the deploy configuration.
    #[arg(long)]
    pub deploy_config: Option<PathBuf>,

    /// sysadmin password; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// BMC password; prompted when absent.
    #[arg(long)]
    pub bmc_password: Option<String>,

    /// Software release to deploy.
    #[arg(long)]
    pub release: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for RedeployArgs {
    type Resource = Subcloud;

    fn prepare(&mut self, prompt: &mut dyn Prompt, confirm: &Confirmation) -> Result<(), CliError> {
        confirm.require(
            prompt,
            &format!("reinstall and redeploy subcloud {}", self.subcloud),
            self.yes,
        )?;
        self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        self.secrets.bmc = Some(password_or_prompt(prompt, self.bmc_password.as_deref(), "bmc")?);
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = Form::new()
            .text_opt("sysadmin_password", self.secrets.sysadmin.as_ref())
            .text_opt("bmc_password", self.secrets.bmc.as_ref())
            .text_opt("release", self.release.as_ref())
            .file_opt("install_values", self.install_values.as_ref())?
            .file_opt("bootstrap_values", self.bootstrap_values.as_ref())?
            .file_opt("deploy_config", self.deploy_config.as_ref())?;
        client.subclouds.redeploy(&self.subcloud, form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// Arguments of `subcloud prestage`.
#[derive(Args, Debug, Clone, Default)]
pub struct PrestageArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// sysadmin password; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// Prestage even if the subcloud has minor alarms.
    #[arg(long)]
    pub force: bool,

    /// Software release to prestage.
    #[arg(long)]
    pub release: Option<String>,

    /// Prestage for a subsequent reinstall.
    #[arg(long)]
    pub for_install: bool,

    /// Prestage for a subsequent software deployment.
    #[arg(long)]
    pub for_sw_deploy: bool,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for PrestageArgs {
    type Resource = Subcloud;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        exclusive(
            self.for_install,
            self.for_sw_deploy,
            "Options --for-install and --for-sw-deploy cannot be used together",
        )?;
        self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let request = PrestageRequest {
            sysadmin_password: self.secrets.sysadmin.clone().unwrap_or_default(),
            force: self.force.then(|| bool_flag(true).to_string()),
            release: self.release.clone(),
            for_install: self.for_install.then(|| bool_flag(true).to_string()),
            for_sw_deploy: self.for_sw_deploy.then(|| bool_flag(true).to_string()),
        };
        client.subclouds.prestage(&self.subcloud, &request).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

fn deprecated(verb: &str, replacement: &str) -> CliError {
    CliError::Deprecated(format!(
        "This command has been deprecated. Please use '{replacement}' instead of 'subcloud {verb}'."
    ))
}

/// Runs a subcloud subcommand.
pub async fn run<T: Transport>(command: SubcloudCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        SubcloudCommands::Add(args) => run_command(args, env).await,
        SubcloudCommands::List(args) => run_command(args, env).await,
        SubcloudCommands::Show(args) => run_command(args, env).await,
        SubcloudCommands::Errors(args) => run_command(args, env).await,
        SubcloudCommands::Update(args) => run_command(args, env).await,
        SubcloudCommands::Manage(args) => run_command(args, env).await,
        SubcloudCommands::Unmanage(args) => run_command(args, env).await,
        SubcloudCommands::Delete(args) => run_command(args, env).await,
        SubcloudCommands::Redeploy(args) => run_command(args, env).await,
        SubcloudCommands::Prestage(args) => run_command(args, env).await,
        SubcloudCommands::Deploy { command } => phased_deploy::run(command, env).await,
        SubcloudCommands::Reconfig(_) => Err(deprecated("reconfig", "subcloud deploy config")),
        SubcloudCommands::Reinstall(_) => Err(deprecated("reinstall", "subcloud redeploy")),
        SubcloudCommands::Restore(_) => Err(deprecated("restore", "subcloud-backup restore")),
    }
}
