//! `system-peer` commands.

use clap::{Args, Subcommand, ValueEnum};
use dcmanager_client::utils::encode_password;
use dcmanager_client::v1::{SubcloudPeerGroup, SystemPeer, SystemPeerRequest};
use dcmanager_client::{DcManagerClient, Transport};

use super::peer_group::list_record as peer_group_record;
use super::{Env, ResourceCommand, Shape, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt, password_or_prompt};

const LIST_COLUMNS: &[&str] = &[
    "id",
    "peer uuid",
    "peer name",
    "manager endpoint",
    "controller gateway address",
];

const DETAIL_COLUMNS: &[&str] = &[
    "id",
    "peer uuid",
    "peer name",
    "manager endpoint",
    "manager username",
    "controller gateway address",
    "administrative state",
    "heartbeat interval",
    "heartbeat failure threshold",
    "heartbeat failure policy",
    "heartbeat maintenance timeout",
    "availability state",
    "created_at",
    "updated_at",
];

fn list_record(peer: Option<&SystemPeer>) -> Record {
    record(LIST_COLUMNS, peer, |p| {
        vec![
            p.peer_id.clone(),
            text(p.peer_uuid.as_ref()),
            p.peer_name.clone(),
            text(p.manager_endpoint.as_ref()),
            text(p.peer_controller_gateway_address.as_ref()),
        ]
    })
}

fn detail_record(peer: Option<&SystemPeer>) -> Record {
    record(DETAIL_COLUMNS, peer, |p| {
        vec![
            p.peer_id.clone(),
            text(p.peer_uuid.as_ref()),
            p.peer_name.clone(),
            text(p.manager_endpoint.as_ref()),
            text(p.manager_username.as_ref()),
            text(p.peer_controller_gateway_address.as_ref()),
            text(p.administrative_state.as_ref()),
            text(p.heartbeat_interval.as_ref()),
            text(p.heartbeat_failure_threshold.as_ref()),
            text(p.heartbeat_failure_policy.as_ref()),
            text(p.heartbeat_maintenance_timeout.as_ref()),
            text(p.availability_state.as_ref()),
            text(p.created_at.as_ref()),
            text(p.updated_at.as_ref()),
        ]
    })
}

/// Action taken once a peer misses enough heartbeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicy {
    /// Raise an alarm only.
    #[default]
    Alarm,
    /// Rehome the peer's subclouds here.
    Rehome,
    /// Hand the decision to the peer group leader.
    Delegate,
}

impl FailurePolicy {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Alarm => "alarm",
            Self::Rehome => "rehome",
            Self::Delegate => "delegate",
        }
    }
}

/// Administrative state of a system peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdminState {
    /// Heartbeats are exchanged.
    Enabled,
    /// The peer is ignored.
    Disabled,
}

impl AdminState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// System peer subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SystemPeerCommands {
    /// Add a system peer.
    Add(AddArgs),
    /// List system peers.
    List(ListArgs),
    /// Show one system peer.
    Show(PeerRef),
    /// Update a system peer.
    Update(UpdateArgs),
    /// Delete a system peer.
    Delete(DeleteArgs),
    /// List the peer groups led by a system peer.
    ListSubcloudPeerGroups(ListPeerGroupsArgs),
}

/// Arguments of `system-peer add`.
#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// UUID of the peer system.
    #[arg(long)]
    pub peer_uuid: String,

    /// Name of the peer system.
    #[arg(long)]
    pub peer_name: String,

    /// Keystone URL of the peer's system controller.
    #[arg(long)]
    pub manager_endpoint: String,

    /// Administrative user on the peer.
    #[arg(long, default_value = "admin")]
    pub manager_username: String,

    /// Password of the administrative user; prompted when absent.
    #[arg(long)]
    pub manager_password: Option<String>,

    /// Gateway towards the peer's system controller.
    #[arg(long)]
    pub peer_controller_gateway_address: String,

    /// Administrative state of the peer.
    #[arg(long, value_enum)]
    pub administrative_state: Option<AdminState>,

    /// Seconds between heartbeats.
    #[arg(long, default_value_t = 60)]
    pub heartbeat_interval: u32,

    /// Missed heartbeats before the peer is declared failed.
    #[arg(long, default_value_t = 3)]
    pub heartbeat_failure_threshold: u32,

    /// Action taken on heartbeat failure.
    #[arg(long, value_enum, default_value = "alarm")]
    pub heartbeat_failure_policy: FailurePolicy,

    /// Seconds a failed peer may stay in maintenance.
    #[arg(long, default_value_t = 600)]
    pub heartbeat_maintenance_timeout: u32,

    #[arg(skip)]
    password: Option<String>,
}

impl ResourceCommand for AddArgs {
    type Resource = SystemPeer;

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        self.password = Some(password_or_prompt(prompt, self.manager_password.as_deref(), "manager")?);
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SystemPeer>> {
        let request = SystemPeerRequest {
            peer_uuid: Some(self.peer_uuid.clone()),
            peer_name: Some(self.peer_name.clone()),
            manager_endpoint: Some(self.manager_endpoint.clone()),
            manager_username: Some(self.manager_username.clone()),
            manager_password: self.password.clone(),
            peer_controller_gateway_address: Some(self.peer_controller_gateway_address.clone()),
            administrative_state: self.administrative_state.map(|s| s.as_str().to_string()),
            heartbeat_interval: Some(self.heartbeat_interval),
            heartbeat_failure_threshold: Some(self.heartbeat_failure_threshold),
            heartbeat_failure_policy: Some(self.heartbeat_failure_policy.as_str().to_string()),
            heartbeat_maintenance_timeout: Some(self.heartbeat_maintenance_timeout),
        };
        client.system_peers.add(&request).await
    }

    fn format(&self, resource: Option<&SystemPeer>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `system-peer list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {}

impl ResourceCommand for ListArgs {
    type Resource = SystemPeer;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SystemPeer>> {
        client.system_peers.list().await
    }

    fn format(&self, resource: Option<&SystemPeer>) -> Record {
        list_record(resource)
    }
}

/// A system peer named by id, UUID or name.
#[derive(Args, Debug, Clone, Default)]
pub struct PeerRef {
    /// Name, UUID or ID of the system peer.
    pub peer: String,
}

impl ResourceCommand for PeerRef {
    type Resource = SystemPeer;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SystemPeer>> {
        client.system_peers.detail(&self.peer).await
    }

    fn format(&self, resource: Option<&SystemPeer>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `system-peer update`.
///
/// Unlike `add`, nothing is defaulted or prompted: only given flags are sent.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Name, UUID or ID of the system peer.
    pub peer: String,

    /// New UUID of the peer system.
    #[arg(long)]
    pub peer_uuid: Option<String>,

    /// New name of the peer system.
    #[arg(long)]
    pub peer_name: Option<String>,

    /// Keystone URL of the peer's system controller.
    #[arg(long)]
    pub manager_endpoint: Option<String>,

    /// Administrative user on the peer.
    #[arg(long)]
    pub manager_username: Option<String>,

    /// Password of the administrative user.
    #[arg(long)]
    pub manager_password: Option<String>,

    /// Gateway towards the peer's system controller.
    #[arg(long)]
    pub peer_controller_gateway_address: Option<String>,

    /// Administrative state of the peer.
    #[arg(long, value_enum)]
    pub administrative_state: Option<AdminState>,

    /// Seconds between heartbeats.
    #[arg(long)]
    pub heartbeat_interval: Option<u32>,

    /// Missed heartbeats before the peer is declared failed.
    #[arg(long)]
    pub heartbeat_failure_threshold: Option<u32>,

    /// Action taken on heartbeat failure.
    #[arg(long, value_enum)]
    pub heartbeat_failure_policy: Option<FailurePolicy>,

    /// Seconds a failed peer may stay in maintenance.
    #[arg(long)]
    pub heartbeat_maintenance_timeout: Option<u32>,
}

impl UpdateArgs {
    fn request(&self) -> SystemPeerRequest {
        SystemPeerRequest {
            peer_uuid: self.peer_uuid.clone(),
            peer_name: self.peer_name.clone(),
            manager_endpoint: self.manager_endpoint.clone(),
            manager_username: self.manager_username.clone(),
            manager_password: self.manager_password.as_deref().map(encode_password),
            peer_controller_gateway_address: self.peer_controller_gateway_address.clone(),
            administrative_state: self.administrative_state.map(|s| s.as_str().to_string()),
            heartbeat_interval: self.heartbeat_interval,
            heartbeat_failure_threshold: self.heartbeat_failure_threshold,
            heartbeat_failure_policy: self.heartbeat_failure_policy.map(|p| p.as_str().to_string()),
            heartbeat_maintenance_timeout: self.heartbeat_maintenance_timeout,
        }
    }
}

impl ResourceCommand for UpdateArgs {
    type Resource = SystemPeer;

    fn prepare(&mut self, _prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.request().is_empty() {
            return Err(CliError::invalid("Nothing to update"));
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SystemPeer>> {
        client.system_peers.update(&self.peer, &self.request()).await
    }

    fn format(&self, resource: Option<&SystemPeer>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `system-peer delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Name, UUID or ID of the system peer.
    pub peer: String,

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
        confirm.require(prompt, &format!("delete system peer {}", self.peer), self.yes)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        client.system_peers.delete(&self.peer).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Arguments of `system-peer list-subcloud-peer-groups`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListPeerGroupsArgs {
    /// Name, UUID or ID of the system peer.
    pub peer: String,
}

impl ResourceCommand for ListPeerGroupsArgs {
    type Resource = SubcloudPeerGroup;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudPeerGroup>> {
        client.system_peers.list_peer_groups(&self.peer).await
    }

    fn format(&self, resource: Option<&SubcloudPeerGroup>) -> Record {
        peer_group_record(resource)
    }
}

/// Runs a system peer subcommand.
pub async fn run<T: Transport>(command: SystemPeerCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        SystemPeerCommands::Add(args) => run_command(args, env).await,
        SystemPeerCommands::List(args) => run_command(args, env).await,
        SystemPeerCommands::Show(args) => run_command(args, env).await,
        SystemPeerCommands::Update(args) => run_command(args, env).await,
        SystemPeerCommands::Delete(args) => run_command(args, env).await,
        SystemPeerCommands::ListSubcloudPeerGroups(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use dcmanager_client::Body;
    use serde_json::{Value, json};

    use super::*;
    use crate::cli::Format;
    use crate::commands::harness::Harness;
    use crate::prompt::ScriptedPrompt;

    const ADD: &[&str] = &[
        "system-peer",
        "add",
        "--peer-uuid",
        "9a2b6d2e-5d8c-4c1b-a3f0-6f1b1e6a0c11",
        "--peer-name",
        "dc-west",
        "--manager-endpoint",
        "https://10.10.10.2:5000/v3",
        "--peer-controller-gateway-address",
        "10.10.10.1",
    ];

    #[tokio::test]
    async fn add_prompts_for_manager_password_and_fills_defaults() {
        let mut h = Harness::new();
        h.prompt = ScriptedPrompt::new(["secret", "secret"]);
        h.fake().push_json(json!({"id": 1, "peer-name": "dc-west"}));

        h.run(ADD).await.expect("runs");

        assert_eq!(h.prompt.asked()[0], "Enter the manager password: ");
        let Body::Json(body) = h.fake().last_request().expect("request").body else {
            panic!("expected json body");
        };
        assert_eq!(body["manager-password"], "c2VjcmV0");
        assert_eq!(body["manager-username"], "admin");
        assert_eq!(body["heartbeat-interval"], 60);
        assert_eq!(body["heartbeat-failure-threshold"], 3);
        assert_eq!(body["heartbeat-failure-policy"], "alarm");
        assert_eq!(body["heartbeat-maintenance-timeout"], 600);
        assert!(body.get("administrative-state").is_none());
    }

    #[tokio::test]
    async fn add_requires_gateway_address() {
        let mut h = Harness::new();
        let err = h.run(&ADD[..ADD.len() - 2]).await.expect_err("missing flag");
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn update_sends_only_given_fields() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 1, "peer-name": "dc-west"}));

        h.run(&["system-peer", "update", "dc-west", "--heartbeat-failure-policy", "rehome", "--manager-password", "pw"])
            .await
            .expect("runs");

        assert_eq!(
            h.fake().last_request().expect("request").body,
            Body::Json(json!({"manager-password": "cHc=", "heartbeat-failure-policy": "rehome"}))
        );
    }

    #[tokio::test]
    async fn update_without_changes_fails() {
        let mut h = Harness::new();
        let err = h.run(&["system-peer", "update", "dc-west"]).await.expect_err("invalid");
        assert_eq!(err.to_string(), "Nothing to update");
    }

    #[tokio::test]
    async fn show_renders_detail_fields() {
        let mut h = Harness::new();
        h.format = Format::Json;
        h.fake().push_json(json!({
            "id": 4, "peer-uuid": "u", "peer-name": "dc-west", "heartbeat-interval": 60,
            "availability-state": "available"
        }));

        let out = h.run(&["system-peer", "show", "4"]).await.expect("runs");
        let fields: Value = serde_json::from_str(&out).expect("json");

        assert_eq!(fields["heartbeat interval"], "60");
        assert_eq!(fields["availability state"], "available");
        assert_eq!(fields["manager username"], "");
    }

    #[tokio::test]
    async fn list_subcloud_peer_groups_hits_nested_path() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"subcloud_peer_groups": [{"id": 2, "peer_group_name": "pg"}]}));

        let out = h.run(&["system-peer", "list-subcloud-peer-groups", "dc-west"]).await.expect("runs");

        assert!(out.starts_with("2 pg"));
        assert_eq!(
            h.fake().last_request().expect("request").path,
            "/system-peers/dc-west/subcloud-peer-groups"
        );
    }
}
