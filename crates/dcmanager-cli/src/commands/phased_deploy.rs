//! `subcloud deploy` commands: phased subcloud deployment.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use dcmanager_client::v1::{DeployPhase, Subcloud};
use dcmanager_client::{DcManagerClient, Form, Transport};

use super::subcloud::detail_record;
use super::{Env, ResourceCommand, Secrets, run_command};
use crate::error::CliError;
use crate::output::Record;
use crate::prompt::{Confirmation, Prompt, password_or_prompt};

/// Phased deployment subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum PhasedDeployCommands {
    /// Create the subcloud record without deploying it.
    Create(CreateArgs),
    /// Install the subcloud.
    Install(InstallArgs),
    /// Bootstrap the subcloud.
    Bootstrap(BootstrapArgs),
    /// Apply the deploy configuration.
    Config(ConfigArgs),
    /// Mark the deployment complete.
    Complete(SubcloudArg),
    /// Abort the running phase.
    Abort(SubcloudArg),
    /// Resume the deployment from the failed or aborted phase.
    Resume(ResumeArgs),
    /// Enroll a factory-installed subcloud.
    Enroll(EnrollArgs),
}

/// Arguments of `subcloud deploy create`.
#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
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

    /// BMC password; prompted when absent and install values are given.
    #[arg(long)]
    pub bmc_password: Option<String>,

    /// Name or ID of the subcloud group.
    #[arg(long)]
    pub group: Option<String>,

    /// Software release of the subcloud.
    #[arg(long)]
    pub release: Option<String>,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for CreateArgs {
    type Resource = Subcloud;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.install_values.is_some() {
            self.secrets.bmc = Some(password_or_prompt(prompt, self.bmc_password.as_deref(), "bmc")?);
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = Form::new()
            .text("bootstrap-address", &self.bootstrap_address)
            .text_opt("bmc_password", self.secrets.bmc.as_ref())
            .text_opt("group_id", self.group.as_ref())
            .text_opt("release", self.release.as_ref())
            .file("bootstrap_values", &self.bootstrap_values)?
            .file_opt("install_values", self.install_values.as_ref())?
            .file_opt("deploy_config", self.deploy_config.as_ref())?;
        client.phased_deploys.create(form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// The subcloud a phase acts on.
#[derive(Args, Debug, Clone, Default)]
pub struct SubcloudArg {
    /// Name or ID of the subcloud.
    pub subcloud: String,
}

/// Subcloud plus the sysadmin password every running phase needs.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Name or ID of the subcloud.
    pub subcloud: String,

    /// sysadmin password; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,
}

/// Bootstrap inputs.
#[derive(Args, Debug, Clone, Default)]
pub struct BootstrapFlags {
    /// IP address used to bootstrap the subcloud.
    #[arg(long)]
    pub bootstrap_address: Option<String>,

    /// YAML file with the bootstrap values.
    #[arg(long)]
    pub bootstrap_values: Option<PathBuf>,
}

/// Remote install inputs.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallFlags {
    /// YAML file with the remote install values.
    #[arg(long)]
    pub install_values: Option<PathBuf>,

    /// BMC password; prompted when the phase installs.
    #[arg(long)]
    pub bmc_password: Option<String>,

    /// Software release to deploy.
    #[arg(long)]
    pub release: Option<String>,
}

/// Arguments of `subcloud deploy install`.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Subcloud and sysadmin password.
    #[command(flatten)]
    pub target: TargetArgs,
    /// Remote install inputs.
    #[command(flatten)]
    pub install: InstallFlags,
}

/// Arguments of `subcloud deploy bootstrap`.
#[derive(Args, Debug, Clone, Default)]
pub struct BootstrapArgs {
    /// Subcloud and sysadmin password.
    #[command(flatten)]
    pub target: TargetArgs,
    /// Bootstrap inputs.
    #[command(flatten)]
    pub bootstrap: BootstrapFlags,
}

/// Arguments of `subcloud deploy config`.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Subcloud and sysadmin password.
    #[command(flatten)]
    pub target: TargetArgs,

    /// YAML file with the deploy configuration.
    #[arg(long)]
    pub deploy_config: Option<PathBuf>,
}

/// Arguments of `subcloud deploy resume`.
#[derive(Args, Debug, Clone, Default)]
pub struct ResumeArgs {
    /// Subcloud and sysadmin password.
    #[command(flatten)]
    pub target: TargetArgs,
    /// Bootstrap inputs.
    #[command(flatten)]
    pub bootstrap: BootstrapFlags,
    /// Remote install inputs.
    #[command(flatten)]
    pub install: InstallFlags,

    /// YAML file with the deploy configuration.
    #[arg(long)]
    pub deploy_config: Option<PathBuf>,
}

/// Arguments of `subcloud deploy enroll`.
#[derive(Args, Debug, Clone, Default)]
pub struct EnrollArgs {
    /// Subcloud and sysadmin password.
    #[command(flatten)]
    pub target: TargetArgs,
    /// Bootstrap inputs.
    #[command(flatten)]
    pub bootstrap: BootstrapFlags,
    /// Remote install inputs.
    #[command(flatten)]
    pub install: InstallFlags,

    /// cloud-init configuration archive.
    #[arg(long)]
    pub cloud_init_config: Option<PathBuf>,
}

/// One phase request, built from any phase's arguments.
#[derive(Debug, Clone)]
struct PhaseRun {
    phase: DeployPhase,
    subcloud: String,
    sysadmin_password: Option<String>,
    bootstrap: BootstrapFlags,
    install: InstallFlags,
    deploy_config: Option<PathBuf>,
    cloud_init_config: Option<PathBuf>,
    secrets: Secrets,
}

impl PhaseRun {
    fn new(phase: DeployPhase, target: TargetArgs) -> Self {
        Self {
            phase,
            subcloud: target.subcloud,
            sysadmin_password: target.sysadmin_password,
            bootstrap: BootstrapFlags::default(),
            install: InstallFlags::default(),
            deploy_config: None,
            cloud_init_config: None,
            secrets: Secrets::default(),
        }
    }

    fn bare(phase: DeployPhase, arg: SubcloudArg) -> Self {
        Self::new(phase, TargetArgs { subcloud: arg.subcloud, sysadmin_password: None })
    }

    const fn needs_sysadmin(&self) -> bool {
        !matches!(self.phase, DeployPhase::Complete | DeployPhase::Abort)
    }

    const fn installs(&self) -> bool {
        match self.phase {
            DeployPhase::Install | DeployPhase::Enroll => true,
            DeployPhase::Resume => self.install.install_values.is_some(),
            _ => false,
        }
    }
}

impl From<InstallArgs> for PhaseRun {
    fn from(args: InstallArgs) -> Self {
        Self { install: args.install, ..Self::new(DeployPhase::Install, args.target) }
    }
}

impl From<BootstrapArgs> for PhaseRun {
    fn from(args: BootstrapArgs) -> Self {
        Self { bootstrap: args.bootstrap, ..Self::new(DeployPhase::Bootstrap, args.target) }
    }
}

impl From<ConfigArgs> for PhaseRun {
    fn from(args: ConfigArgs) -> Self {
        Self { deploy_config: args.deploy_config, ..Self::new(DeployPhase::Config, args.target) }
    }
}

impl From<ResumeArgs> for PhaseRun {
    fn from(args: ResumeArgs) -> Self {
        Self {
            bootstrap: args.bootstrap,
            install: args.install,
            deploy_config: args.deploy_config,
            ..Self::new(DeployPhase::Resume, args.target)
        }
    }
}

impl From<EnrollArgs> for PhaseRun {
    fn from(args: EnrollArgs) -> Self {
        Self {
            bootstrap: args.bootstrap,
            install: args.install,
            cloud_init_config: args.cloud_init_config,
            ..Self::new(DeployPhase::Enroll, args.target)
        }
    }
}

impl ResourceCommand for PhaseRun {
    type Resource = Subcloud;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.needs_sysadmin() {
            self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        }
        if self.installs() {
            self.secrets.bmc = Some(password_or_prompt(prompt, self.install.bmc_password.as_deref(), "bmc")?);
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = Form::new()
            .text_opt("bootstrap-address", self.bootstrap.bootstrap_address.as_ref())
            .text_opt("sysadmin_password", self.secrets.sysadmin.as_ref())
            .text_opt("bmc_password", self.secrets.bmc.as_ref())
            .text_opt("release", self.install.release.as_ref())
            .file_opt("bootstrap_values", self.bootstrap.bootstrap_values.as_ref())?
            .file_opt("install_values", self.install.install_values.as_ref())?
            .file_opt("deploy_config", self.deploy_config.as_ref())?
            .file_opt("cloud_init_config", self.cloud_init_config.as_ref())?;
        client.phased_deploys.run(&self.subcloud, self.phase, form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        detail_record(resource, false)
    }
}

/// Runs a phased deployment subcommand.
pub async fn run<T: Transport>(command: PhasedDeployCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    let phase = match command {
        PhasedDeployCommands::Create(args) => return run_command(args, env).await,
        PhasedDeployCommands::Install(args) => PhaseRun::from(args),
        PhasedDeployCommands::Bootstrap(args) => PhaseRun::from(args),
        PhasedDeployCommands::Config(args) => PhaseRun::from(args),
        PhasedDeployCommands::Complete(arg) => PhaseRun::bare(DeployPhase::Complete, arg),
        PhasedDeployCommands::Abort(arg) => PhaseRun::bare(DeployPhase::Abort, arg),
        PhasedDeployCommands::Resume(args) => PhaseRun::from(args),
        PhasedDeployCommands::Enroll(args) => PhaseRun::from(args),
    };
    run_command(phase, env).await
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dcmanager_client::{Body, Method};
    use serde_json::json;
    use test_case::test_case;

    use super::*;
    use crate::commands::harness::Harness;
    use crate::prompt::ScriptedPrompt;

    #[tokio::test]
    async fn create_posts_bootstrap_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"name: subcloud1\n").expect("write");
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 3, "name": "subcloud1", "deploy-status": "not-deployed"}));

        h.run(&[
            "subcloud", "deploy", "create",
            "--bootstrap-address", "10.10.10.12",
            "--bootstrap-values", file.path().to_str().expect("path"),
        ])
        .await
        .expect("runs");

        let sent = h.fake().last_request().expect("request");
        assert_eq!((sent.method, sent.path.as_str()), (Method::Post, "/phased-subcloud-deploy"));
        let Body::Multipart(form) = sent.body else { panic!("expected multipart") };
        assert_eq!(form.files()[0].contents, b"name: subcloud1\n");
    }

    #[test_case("install", "install" ; "install")]
    #[test_case("bootstrap", "bootstrap" ; "bootstrap")]
    #[test_case("config", "configure" ; "config maps to configure")]
    #[test_case("resume", "resume" ; "resume")]
    #[tokio::test]
    async fn phases_patch_their_path(verb: &str, segment: &str) {
        let mut h = Harness::new();
        h.prompt = ScriptedPrompt::new(["bmc", "bmc"]);
        h.fake().push_json(json!({"id": 3, "name": "subcloud1"}));

        h.run(&["subcloud", "deploy", verb, "subcloud1", "--sysadmin-password", "pw"])
            .await
            .expect("runs");

        let sent = h.fake().last_request().expect("request");
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.path, format!("/phased-subcloud-deploy/subcloud1/{segment}"));
    }

    #[tokio::test]
    async fn complete_sends_no_body() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 3, "name": "subcloud1", "deploy-status": "complete"}));

        h.run(&["subcloud", "deploy", "complete", "subcloud1"]).await.expect("runs");

        let sent = h.fake().last_request().expect("request");
        assert_eq!(sent.path, "/phased-subcloud-deploy/subcloud1/complete");
        assert_eq!(sent.body, Body::Empty);
        assert!(h.prompt.asked().is_empty());
    }

    #[test_case(&["bootstrap", "subcloud1", "--deploy-config", "c.yaml"] ; "bootstrap has no deploy config")]
    #[test_case(&["abort", "subcloud1", "--release", "24.09"] ; "abort takes only the subcloud")]
    #[test_case(&["complete", "subcloud1", "--sysadmin-password", "pw"] ; "complete needs no password")]
    #[test_case(&["config", "subcloud1", "--install-values", "i.yaml"] ; "config has no install values")]
    #[test_case(&["enroll", "subcloud1", "--deploy-config", "c.yaml"] ; "enroll has no deploy config")]
    #[tokio::test]
    async fn phase_parser_rejects_foreign_flags(args: &[&str]) {
        let mut h = Harness::new();
        let argv: Vec<&str> = ["subcloud", "deploy"].into_iter().chain(args.iter().copied()).collect();

        let err = h.run(&argv).await.expect_err("parse error");

        assert!(err.to_string().contains("unexpected argument"), "{err}");
        assert_eq!(h.fake().request_count(), 0);
    }

    #[test_case("complete", &[] ; "complete")]
    #[test_case("abort", &[] ; "abort")]
    #[test_case("install", &["--install-values", "--bmc-password", "--release", "--sysadmin-password"] ; "install")]
    #[test_case("bootstrap", &["--bootstrap-address", "--bootstrap-values", "--sysadmin-password"] ; "bootstrap")]
    #[test_case("config", &["--deploy-config", "--sysadmin-password"] ; "config")]
    fn phase_advertises_only_its_flags(verb: &str, expected: &[&str]) {
        use clap::CommandFactory;

        let cli = crate::cli::Cli::command();
        let phase = cli
            .find_subcommand("subcloud")
            .and_then(|c| c.find_subcommand("deploy"))
            .and_then(|c| c.find_subcommand(verb))
            .expect("phase exists");
        let mut longs: Vec<String> = phase
            .get_arguments()
            .filter(|a| !a.is_global_set())
            .filter_map(|a| a.get_long().map(|l| format!("--{l}")))
            .filter(|l| l != "--help")
            .collect();
        longs.sort();
        let mut expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
        expected.sort();
        assert_eq!(longs, expected);
    }

    #[tokio::test]
    async fn resume_with_install_values_prompts_for_bmc() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"bmc_address: 10.0.0.1\n").expect("write");
        let mut h = Harness::new();
        h.prompt = ScriptedPrompt::new(["bmcpw", "bmcpw"]);
        h.fake().push_json(json!({"id": 3, "name": "subcloud1"}));

        h.run(&[
            "subcloud", "deploy", "resume", "subcloud1",
            "--sysadmin-password", "pw",
            "--install-values", file.path().to_str().expect("path"),
        ])
        .await
        .expect("runs");

        assert_eq!(h.prompt.asked(), ["Enter the bmc password: ", "Re-enter bmc password to confirm: "]);
        assert_eq!(h.fake().last_request().expect("request").path, "/phased-subcloud-deploy/subcloud1/resume");
    }
}
