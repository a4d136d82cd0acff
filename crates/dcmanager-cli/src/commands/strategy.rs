//! `<kind>-strategy` commands.
//!
//! Every strategy kind shares the same five verbs and one implementation.
//! Kinds differ only in their extra `create` flags and the extra columns
//! they display; each kind's clap enum converts into [`StrategyCommand`].

use clap::{Args, Subcommand};
use dcmanager_client::utils::bool_flag;
use dcmanager_client::v1::{StrategyKind, StrategyRequest, SwUpdateStrategy};
use dcmanager_client::{DcManagerClient, Transport};

use super::subcloud_group::ApplyType;
use super::{Env, ResourceCommand, exclusive, run_command};
use crate::error::CliError;
use crate::output::{Record, text};
use crate::prompt::{Confirmation, Prompt, password_or_prompt};

const COLUMNS: &[&str] = &[
    "strategy type",
    "subcloud apply type",
    "max parallel subclouds",
    "stop on failure",
    "state",
    "created_at",
    "updated_at",
];

/// Extra columns of a kind, as (column, extra-args key).
const fn extra_columns(kind: StrategyKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        StrategyKind::SwDeploy => &[("release_id", "release_id")],
        StrategyKind::Prestage => &[("prestage software version", "prestage-software-version")],
        _ => &[],
    }
}

/// Formats a strategy of `kind`; an absent strategy yields one placeholder
/// per column, extra columns included.
pub fn strategy_record(kind: StrategyKind, strategy: Option<&SwUpdateStrategy>) -> Record {
    let extras = extra_columns(kind);
    let Some(s) = strategy else {
        let columns: Vec<&str> = COLUMNS
            .iter()
            .copied()
            .chain(extras.iter().map(|(column, _)| *column))
            .collect();
        return Record::placeholder(&columns);
    };
    let mut rec = Record::new(
        COLUMNS,
        vec![
            s.strategy_type.clone(),
            text(s.subcloud_apply_type.as_ref()),
            text(s.max_parallel_subclouds.as_ref()),
            text(s.stop_on_failure.as_ref()),
            text(s.state.as_ref()),
            text(s.created_at.as_ref()),
            text(s.updated_at.as_ref()),
        ],
    );
    for (column, key) in extras {
        rec.push(*column, text(s.extra_arg(key).as_ref()));
    }
    rec
}

/// Flags accepted by every `create`.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Name of a single subcloud to update.
    pub cloud_name: Option<String>,

    /// Name or ID of the subcloud group to update.
    #[arg(long)]
    pub group: Option<String>,

    /// How subclouds are updated.
    #[arg(long, value_enum)]
    pub subcloud_apply_type: Option<ApplyType>,

    /// Subclouds updated at once.
    #[arg(long)]
    pub max_parallel_subclouds: Option<u32>,

    /// Stop the strategy on the first failed subcloud.
    #[arg(long)]
    pub stop_on_failure: bool,
}

impl CommonArgs {
    fn request(&self, kind: StrategyKind) -> StrategyRequest {
        let mut request = StrategyRequest::new(kind);
        request.cloud_name = self.cloud_name.clone();
        request.group = self.group.clone();
        request.subcloud_apply_type = self.subcloud_apply_type.map(|t| t.as_str().to_string());
        request.max_parallel_subclouds = self.max_parallel_subclouds;
        request.stop_on_failure = self.stop_on_failure.then(|| bool_flag(true).to_string());
        request
    }
}

/// `patch-strategy create` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct PatchArgs {
    /// Only upload the patches; do not apply them.
    #[arg(long)]
    pub upload_only: bool,
}

/// `upgrade-strategy create` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct UpgradeArgs {
    /// Allow the upgrade while subcloud alarms are raised.
    #[arg(long)]
    pub force: bool,
}

/// `kube-upgrade-strategy create` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct KubeUpgradeArgs {
    /// Kubernetes version to upgrade to.
    #[arg(long)]
    pub to_version: Option<String>,

    /// Allow the upgrade while subcloud alarms are raised.
    #[arg(long)]
    pub force: bool,
}

/// `kube-rootca-update-strategy create` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct KubeRootcaArgs {
    /// Subject of the generated certificate.
    #[arg(long)]
    pub subject: Option<String>,

    /// Expiry date of the generated certificate (YYYY-MM-DD).
    #[arg(long)]
    pub expiry_date: Option<String>,

    /// Certificate to use instead of generating one.
    #[arg(long)]
    pub cert_file: Option<String>,
}

/// `fw-update-strategy create` takes no extra flags.
#[derive(Args, Debug, Clone, Default)]
pub struct FirmwareArgs {}

/// `prestage-strategy create` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct PrestageArgs {
    /// sysadmin password of the subclouds; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// Prestage even if the subclouds are not in sync.
    #[arg(long)]
    pub force: bool,

    /// Release to prestage.
    #[arg(long)]
    pub release: Option<String>,

    /// Prestage for a subsequent reinstall.
    #[arg(long)]
    pub for_install: bool,

    /// Prestage for a subsequent software deployment.
    #[arg(long)]
    pub for_sw_deploy: bool,

    #[arg(skip)]
    password: Option<String>,
}

/// `sw-deploy-strategy create` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct SwDeployArgs {
    /// Release to deploy.
    #[arg(long)]
    pub release_id: Option<String>,

    /// Snapshot subclouds before deploying.
    #[arg(long)]
    pub snapshot: bool,

    /// Roll back the in-progress deployment.
    #[arg(long)]
    pub rollback: bool,

    /// Only delete the deployed release.
    #[arg(long)]
    pub delete_only: bool,

    /// Delete the release once deployed.
    #[arg(long)]
    pub with_delete: bool,
}

impl SwDeployArgs {
    fn validate(&self) -> Result<(), CliError> {
        if self.rollback {
            if self.release_id.is_some() || self.snapshot || self.delete_only || self.with_delete {
                return Err(CliError::invalid(
                    "Option --rollback cannot be used with --release-id, --snapshot, \
                     --delete-only or --with-delete",
                ));
            }
        } else if self.delete_only {
            if self.release_id.is_some() || self.snapshot {
                return Err(CliError::invalid(
                    "Option --delete-only cannot be used with --release-id or --snapshot",
                ));
            }
        } else if self.release_id.is_none() {
            return Err(CliError::invalid(
                "The --release-id option is required unless --rollback or --delete-only is given",
            ));
        }
        Ok(())
    }
}

/// Kind-specific `create` flags.
#[derive(Debug, Clone)]
pub enum Extras {
    Patch(PatchArgs),
    Upgrade(UpgradeArgs),
    KubeUpgrade(KubeUpgradeArgs),
    KubeRootca(KubeRootcaArgs),
    Firmware,
    Prestage(PrestageArgs),
    SwDeploy(SwDeployArgs),
}

impl Extras {
    fn prepare(&mut self, prompt: &mut dyn Prompt) -> Result<(), CliError> {
        match self {
            Self::KubeRootca(args) => exclusive(
                args.cert_file.is_some(),
                args.subject.is_some() || args.expiry_date.is_some(),
                "The --cert-file option cannot be used with --subject or --expiry-date",
            ),
            Self::Prestage(args) => {
                exclusive(
                    args.for_install,
                    args.for_sw_deploy,
                    "Options --for-install and --for-sw-deploy cannot be used together",
                )?;
                args.password = Some(password_or_prompt(prompt, args.sysadmin_password.as_deref(), "sysadmin")?);
                Ok(())
            }
            Self::SwDeploy(args) => args.validate(),
            Self::Patch(_) | Self::Upgrade(_) | Self::KubeUpgrade(_) | Self::Firmware => Ok(()),
        }
    }

    fn apply(&self, mut request: StrategyRequest) -> StrategyRequest {
        let flag = |set: bool| set.then_some(bool_flag(true));
        let mut put = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                request.extra.insert(key.to_string(), value.into());
            }
        };
        match self {
            Self::Patch(args) => put("upload-only", flag(args.upload_only)),
            Self::Upgrade(args) => put("force", flag(args.force)),
            Self::KubeUpgrade(args) => {
                put("to-version", args.to_version.as_deref());
                put("force", flag(args.force));
            }
            Self::KubeRootca(args) => {
                put("subject", args.subject.as_deref());
                put("expiry-date", args.expiry_date.as_deref());
                put("cert-file", args.cert_file.as_deref());
            }
            Self::Firmware => {}
            Self::Prestage(args) => {
                put("sysadmin_password", args.password.as_deref());
                put("force", flag(args.force));
                put("release", args.release.as_deref());
                put("for_install", flag(args.for_install));
                put("for_sw_deploy", flag(args.for_sw_deploy));
            }
            Self::SwDeploy(args) => {
                put("release_id", args.release_id.as_deref());
                put("snapshot", flag(args.snapshot));
                put("rollback", flag(args.rollback));
                put("delete_only", flag(args.delete_only));
                put("with_delete", flag(args.with_delete));
            }
        }
        request
    }
}

impl From<PatchArgs> for Extras {
    fn from(args: PatchArgs) -> Self {
        Self::Patch(args)
    }
}

impl From<UpgradeArgs> for Extras {
    fn from(args: UpgradeArgs) -> Self {
        Self::Upgrade(args)
    }
}

impl From<KubeUpgradeArgs> for Extras {
    fn from(args: KubeUpgradeArgs) -> Self {
        Self::KubeUpgrade(args)
    }
}

impl From<KubeRootcaArgs> for Extras {
    fn from(args: KubeRootcaArgs) -> Self {
        Self::KubeRootca(args)
    }
}

impl From<FirmwareArgs> for Extras {
    fn from(_args: FirmwareArgs) -> Self {
        Self::Firmware
    }
}

impl From<PrestageArgs> for Extras {
    fn from(args: PrestageArgs) -> Self {
        Self::Prestage(args)
    }
}

impl From<SwDeployArgs> for Extras {
    fn from(args: SwDeployArgs) -> Self {
        Self::SwDeploy(args)
    }
}

/// `create` of any kind.
#[derive(Debug, Clone)]
pub struct CreateStrategy {
    /// Kind being created.
    pub kind: StrategyKind,
    /// Flags shared by every kind.
    pub common: CommonArgs,
    /// Flags of this kind.
    pub extras: Extras,
}

impl ResourceCommand for CreateStrategy {
    type Resource = SwUpdateStrategy;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        exclusive(
            self.common.cloud_name.is_some(),
            self.common.group.is_some(),
            "The cloud_name and group options are mutually exclusive",
        )?;
        self.extras.prepare(prompt)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SwUpdateStrategy>> {
        let request = self.extras.apply(self.common.request(self.kind));
        client.strategies.create(&request).await
    }

    fn format(&self, resource: Option<&SwUpdateStrategy>) -> Record {
        strategy_record(self.kind, resource)
    }
}

/// Verbs that take no arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Show,
    Delete,
    Apply,
    Abort,
}

/// `show`, `delete`, `apply` or `abort` of any kind.
#[derive(Debug, Clone, Copy)]
pub struct StrategyAction {
    /// Kind acted upon.
    pub kind: StrategyKind,
    /// Verb.
    pub action: Action,
}

impl ResourceCommand for StrategyAction {
    type Resource = SwUpdateStrategy;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SwUpdateStrategy>> {
        match self.action {
            Action::Show => client.strategies.detail(self.kind).await,
            Action::Delete => client.strategies.delete(self.kind).await,
            Action::Apply => client.strategies.apply(self.kind).await,
            Action::Abort => client.strategies.abort(self.kind).await,
        }
    }

    fn format(&self, resource: Option<&SwUpdateStrategy>) -> Record {
        strategy_record(self.kind, resource)
    }
}

/// A strategy verb bound to its kind.
#[derive(Debug, Clone)]
pub enum StrategyCommand {
    /// `create`.
    Create(CreateStrategy),
    /// Any other verb.
    Action(StrategyAction),
}

macro_rules! strategy_commands {
    ($($(#[$doc:meta])* $commands:ident, $create:ident, $extras:ty, $kind:ident;)+) => {$(
        $(#[$doc])*
        #[derive(Subcommand, Debug, Clone)]
        pub enum $commands {
            /// Create the strategy.
            Create($create),
            /// Show the strategy.
            Show,
            /// Delete the strategy.
            Delete,
            /// Apply the strategy.
            Apply,
            /// Abort the strategy.
            Abort,
        }

        #[doc = concat!("Arguments of `", stringify!($commands), "::Create`.")]
        #[derive(Args, Debug, Clone, Default)]
        pub struct $create {
            /// Flags shared by every kind.
            #[command(flatten)]
            pub common: CommonArgs,
            /// Flags of this kind.
            #[command(flatten)]
            pub extras: $extras,
        }

        impl From<$commands> for StrategyCommand {
            fn from(command: $commands) -> Self {
                let kind = StrategyKind::$kind;
                let action = match command {
                    $commands::Create(args) => {
                        return Self::Create(CreateStrategy {
                            kind,
                            common: args.common,
                            extras: args.extras.into(),
                        });
                    }
                    $commands::Show => Action::Show,
                    $commands::Delete => Action::Delete,
                    $commands::Apply => Action::Apply,
                    $commands::Abort => Action::Abort,
                };
                Self::Action(StrategyAction { kind, action })
            }
        }
    )+};
}

strategy_commands! {
    /// Patch strategy verbs.
    PatchStrategyCommands, PatchCreateArgs, PatchArgs, Patch;
    /// Upgrade strategy verbs.
    UpgradeStrategyCommands, UpgradeCreateArgs, UpgradeArgs, Upgrade;
    /// Kubernetes upgrade strategy verbs.
    KubeUpgradeStrategyCommands, KubeUpgradeCreateArgs, KubeUpgradeArgs, KubeUpgrade;
    /// Kubernetes root CA update strategy verbs.
    KubeRootcaStrategyCommands, KubeRootcaCreateArgs, KubeRootcaArgs, KubeRootcaUpdate;
    /// Firmware update strategy verbs.
    FirmwareStrategyCommands, FirmwareCreateArgs, FirmwareArgs, Firmware;
    /// Prestage strategy verbs.
    PrestageStrategyCommands, PrestageCreateArgs, PrestageArgs, Prestage;
    /// Software deploy strategy verbs.
    SwDeployStrategyCommands, SwDeployCreateArgs, SwDeployArgs, SwDeploy;
}

/// Runs a strategy verb.
pub async fn run<T: Transport>(command: StrategyCommand, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        StrategyCommand::Create(create) => run_command(create, env).await,
        StrategyCommand::Action(action) => run_command(action, env).await,
    }
}
