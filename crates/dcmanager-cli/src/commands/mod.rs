//! Command implementations.
//!
//! Every verb is a clap argument struct implementing [`ResourceCommand`]:
//! `prepare` validates flags and collects interactive input, `resources`
//! calls the API and `format` turns each returned resource into a [`Record`].
//! [`execute`] ties the steps together and picks the rendering from
//! [`ResourceCommand::shape`].

pub mod alarm;
pub mod association;
pub mod peer_group;
pub mod phased_deploy;
pub mod strategy;
pub mod strategy_config;
pub mod strategy_step;
pub mod subcloud;
pub mod subcloud_backup;
pub mod subcloud_deploy;
pub mod subcloud_group;
pub mod system_peer;

use std::future::Future;
use std::io::Write;

use dcmanager_client::{DcManagerClient, Transport};
use tracing::{debug, warn};

use crate::cli::Commands;
use crate::error::CliError;
use crate::output::{Listing, OutputFormat, Record};
use crate::prompt::{Confirmation, Prompt};

/// How a command's resources are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// One row per resource.
    List,
    /// The first resource as field/value pairs.
    One,
    /// Nothing is printed.
    Silent,
}

/// A single CLI verb.
pub trait ResourceCommand {
    /// What the API returns for this verb.
    type Resource;

    /// Rendering of the result.
    fn shape(&self) -> Shape {
        Shape::One
    }

    /// Validates flags and gathers interactive input. Runs before any request.
    fn prepare(&mut self, _prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        Ok(())
    }

    /// Performs the API calls.
    fn resources<T: Transport>(
        &self,
        client: &DcManagerClient<T>,
    ) -> impl Future<Output = dcmanager_client::Result<Vec<Self::Resource>>>;

    /// Columns and values of one resource; `None` yields placeholders.
    fn format(&self, resource: Option<&Self::Resource>) -> Record;
}

/// What a command runs against.
pub struct Env<'a, T> {
    /// API client.
    pub client: &'a DcManagerClient<T>,
    /// Where output goes.
    pub out: &'a mut dyn Write,
    /// Output format.
    pub output: OutputFormat,
    /// Source of interactive answers.
    pub prompt: &'a mut dyn Prompt,
    /// Confirmation gate for destructive verbs.
    pub confirm: Confirmation,
}

/// Prepares and runs `command`, returning what it would print.
pub async fn execute<C, T>(mut command: C, env: &mut Env<'_, T>) -> Result<Listing, CliError>
where
    C: ResourceCommand,
    T: Transport,
{
    command.prepare(&mut *env.prompt, &env.confirm)?;
    let resources = with_auth_retry(&command, env.client).await?;
    Ok(render(&command, &resources))
}

/// Runs `command` and writes its output.
pub async fn run_command<C, T>(command: C, env: &mut Env<'_, T>) -> Result<(), CliError>
where
    C: ResourceCommand,
    T: Transport,
{
    let listing = execute(command, env).await?;
    env.output.write(&mut *env.out, &listing)
}

/// Calls the API; an authentication failure triggers one re-authentication
/// and one retry.
async fn with_auth_retry<C, T>(
    command: &C,
    client: &DcManagerClient<T>,
) -> Result<Vec<C::Resource>, CliError>
where
    C: ResourceCommand,
    T: Transport,
{
    match command.resources(client).await {
        Err(err) if err.is_auth_failure() => {
            warn!(error = %err, "request was not authorized, re-authenticating");
            if let Err(reauth) = client.reauthenticate().await {
                debug!(error = %reauth, "re-authentication failed");
                return Err(err.into());
            }
            Ok(command.resources(client).await?)
        }
        result => Ok(result?),
    }
}

fn render<C: ResourceCommand>(command: &C, resources: &[C::Resource]) -> Listing {
    match command.shape() {
        Shape::List => Listing::rows(
            resources.iter().map(|r| command.format(Some(r))).collect(),
            command.format(None),
        ),
        Shape::One => Listing::Fields(command.format(resources.first())),
        Shape::Silent => Listing::Nothing,
    }
}

/// Passwords collected by `prepare`, already base64-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    /// sysadmin password of the subcloud.
    pub sysadmin: Option<String>,
    /// BMC password used for remote install.
    pub bmc: Option<String>,
}

/// Record of a verb that prints nothing.
#[must_use]
pub fn no_columns() -> Record {
    Record::new(&[], Vec::new())
}

/// Fails when both exclusive options are set.
pub(crate) fn exclusive(a: bool, b: bool, message: &str) -> Result<(), CliError> {
    if a && b {
        return Err(CliError::invalid(message));
    }
    Ok(())
}

/// Dispatches a parsed noun to its verbs.
pub async fn dispatch<T: Transport>(command: Commands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        Commands::Alarm { command } => alarm::run(command, env).await,
        Commands::Subcloud { command } => subcloud::run(command, env).await,
        Commands::SubcloudDeploy { command } => subcloud_deploy::run(command, env).await,
        Commands::SubcloudBackup { command } => subcloud_backup::run(command, env).await,
        Commands::SubcloudGroup { command } => subcloud_group::run(command, env).await,
        Commands::SubcloudPeerGroup { command } => peer_group::run(command, env).await,
        Commands::SystemPeer { command } => system_peer::run(command, env).await,
        Commands::PeerGroupAssociation { command } => association::run(command, env).await,
        Commands::StrategyConfig { command } => strategy_config::run(command, env).await,
        Commands::StrategyStep { command } => strategy_step::run(command, env).await,
        Commands::PatchStrategy { command } => strategy::run(command.into(), env).await,
        Commands::UpgradeStrategy { command } => strategy::run(command.into(), env).await,
        Commands::KubeUpgradeStrategy { command } => strategy::run(command.into(), env).await,
        Commands::KubeRootcaUpdateStrategy { command } => strategy::run(command.into(), env).await,
        Commands::FwUpdateStrategy { command } => strategy::run(command.into(), env).await,
        Commands::PrestageStrategy { command } => strategy::run(command.into(), env).await,
        Commands::SwDeployStrategy { command } => strategy::run(command.into(), env).await,
    }
}

#[cfg(test)]
pub(crate) mod harness {
    //! Runs parsed command lines against a [`FakeTransport`].

    use clap::Parser;
    use dcmanager_client::testing::FakeTransport;
    use dcmanager_client::DcManagerClient;

    use super::{Env, dispatch};
    use crate::cli::{Cli, Format};
    use crate::error::CliError;
    use crate::output::OutputFormat;
    use crate::prompt::{Confirmation, ScriptedPrompt};

    pub(crate) struct Harness {
        pub client: DcManagerClient<FakeTransport>,
        pub prompt: ScriptedPrompt,
        pub confirm: Confirmation,
        pub format: Format,
    }

    impl Harness {
        pub(crate) fn new() -> Self {
            Self {
                client: DcManagerClient::new(FakeTransport::new()),
                prompt: ScriptedPrompt::default(),
                confirm: Confirmation::disabled(),
                format: Format::Value,
            }
        }

        pub(crate) fn fake(&self) -> &FakeTransport {
            self.client.transport()
        }

        /// Parses `args` after the program name and runs them; returns stdout.
        pub(crate) async fn run(&mut self, args: &[&str]) -> Result<String, CliError> {
            let argv = std::iter::once("dcmanager").chain(args.iter().copied());
            let cli = Cli::try_parse_from(argv).map_err(|e| CliError::invalid(e.to_string()))?;
            let mut out = Vec::new();
            let mut env = Env {
                client: &self.client,
                out: &mut out,
                output: OutputFormat::new(self.format),
                prompt: &mut self.prompt,
                confirm: self.confirm,
            };
            dispatch(cli.command, &mut env).await?;
            Ok(String::from_utf8(out).expect("utf-8 output"))
        }
    }
}

#[cfg(test)]
mod tests {
    use dcmanager_client::ClientError;
    use serde_json::json;

    use super::harness::Harness;
    use super::*;

    #[tokio::test]
    async fn auth_failure_retries_once() {
        let mut h = Harness::new();
        h.fake()
            .push_status(401, "")
            .push_json(json!({"alarm_summary": [{"region_name": "subcloud1"}]}));

        let out = h.run(&["alarm", "summary"]).await.expect("retried");

        assert!(out.starts_with("subcloud1"));
        assert_eq!(h.fake().reauth_count(), 1);
        assert_eq!(h.fake().request_count(), 2);
    }

    #[tokio::test]
    async fn second_auth_failure_propagates() {
        let mut h = Harness::new();
        h.fake().push_status(403, "").push_status(403, "");

        let err = h.run(&["alarm", "summary"]).await.expect_err("fails");

        assert!(matches!(err, CliError::Client(ClientError::Api { code: 403, .. })));
        assert_eq!(h.fake().reauth_count(), 1);
        assert_eq!(h.fake().request_count(), 2);
    }

    #[tokio::test]
    async fn failed_reauthentication_keeps_original_error() {
        let mut h = Harness::new();
        h.fake().push_status(401, "");
        h.fake().fail_reauth(ClientError::Auth("token mode".into()));

        let err = h.run(&["alarm", "summary"]).await.expect_err("fails");

        assert!(matches!(err, CliError::Client(ClientError::Api { code: 401, .. })));
        assert_eq!(h.fake().request_count(), 1);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let mut h = Harness::new();
        h.fake().push_status(500, "");

        let err = h.run(&["alarm", "summary"]).await.expect_err("fails");

        assert!(matches!(err, CliError::Client(ClientError::Api { code: 500, .. })));
        assert_eq!(h.fake().reauth_count(), 0);
    }

    #[test]
    fn exclusive_rejects_both() {
        assert!(exclusive(true, false, "x").is_ok());
        assert!(matches!(exclusive(true, true, "x"), Err(CliError::InvalidArgument(_))));
    }
}
