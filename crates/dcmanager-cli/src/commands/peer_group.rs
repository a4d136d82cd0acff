//! `subcloud-peer-group` commands.

use clap::{Args, Subcommand, ValueEnum};
use dcmanager_client::v1::{PeerGroupRequest, PeerGroupStatus, Subcloud, SubcloudPeerGroup};
use dcmanager_client::{DcManagerClient, Transport};

use super::subcloud::basic_record;
use super::{Env, ResourceCommand, Secrets, Shape, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt, password_or_prompt};

/// Columns of peer group listings.
pub const LIST_COLUMNS: &[&str] = &[
    "id",
    "peer_group_name",
    "group_priority",
    "group_state",
    "system_leader_id",
    "system_leader_name",
    "max_subcloud_rehoming",
];

const DETAIL_COLUMNS: &[&str] = &[
    "id",
    "peer_group_name",
    "group_priority",
    "group_state",
    "system_leader_id",
    "system_leader_name",
    "max_subcloud_rehoming",
    "created_at",
    "updated_at",
];

const STATUS_COLUMNS: &[&str] = &[
    "peer_group_id",
    "peer_group_name",
    "total_subclouds",
    "complete",
    "waiting_for_migrate",
    "rehoming",
    "rehome_failed",
    "managed",
    "unmanaged",
];

/// Row of a peer group listing.
pub fn list_record(group: Option<&SubcloudPeerGroup>) -> Record {
    record(LIST_COLUMNS, group, |g| {
        vec![
            g.peer_group_id.clone(),
            g.peer_group_name.clone(),
            text(g.group_priority.as_ref()),
            text(g.group_state.as_ref()),
            text(g.system_leader_id.as_ref()),
            text(g.system_leader_name.as_ref()),
            text(g.max_subcloud_rehoming.as_ref()),
        ]
    })
}

fn detail_record(group: Option<&SubcloudPeerGroup>) -> Record {
    let Some(g) = group else {
        return Record::placeholder(DETAIL_COLUMNS);
    };
    let mut rec = list_record(Some(g));
    rec.push("created_at", text(g.created_at.as_ref()));
    rec.push("updated_at", text(g.updated_at.as_ref()));
    rec
}

fn status_record(status: Option<&PeerGroupStatus>) -> Record {
    record(STATUS_COLUMNS, status, |s| {
        vec![
            s.peer_group_id.clone(),
            s.peer_group_name.clone(),
            text(s.total_subclouds.as_ref()),
            text(s.complete.as_ref()),
            text(s.waiting_for_migrate.as_ref()),
            text(s.rehoming.as_ref()),
            text(s.rehome_failed.as_ref()),
            text(s.managed.as_ref()),
            text(s.unmanaged.as_ref()),
        ]
    })
}

/// Administrative state of a peer group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupState {
    /// The group takes part in rehoming.
    Enabled,
    /// The group is ignored by rehoming.
    Disabled,
}

impl GroupState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// Peer group subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum PeerGroupCommands {
    /// Add a subcloud peer group.
    Add(AddArgs),
    /// List subcloud peer groups.
    List(ListArgs),
    /// Show one subcloud peer group.
    Show(PeerGroupRef),
    /// Update a subcloud peer group.
    Update(UpdateArgs),
    /// Delete a subcloud peer group.
    Delete(DeleteArgs),
    /// List the subclouds of a peer group.
    ListSubclouds(ListSubcloudsArgs),
    /// Migrate a peer group's subclouds to this system.
    Migrate(MigrateArgs),
    /// Show rehoming progress of a peer group.
    Status(StatusArgs),
}

/// Arguments of `subcloud-peer-group add`.
#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Name of the peer group.
    #[arg(long)]
    pub peer_group_name: String,

    /// Priority of this site for the group.
    #[arg(long)]
    pub group_priority: Option<u32>,

    /// Administrative state of the group.
    #[arg(long, value_enum)]
    pub group_state: Option<GroupState>,

    /// Subclouds rehomed at once.
    #[arg(long)]
    pub max_subcloud_rehoming: Option<u32>,
}

impl ResourceCommand for AddArgs {
    type Resource = SubcloudPeerGroup;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudPeerGroup>> {
        let request = PeerGroupRequest {
            peer_group_name: Some(self.peer_group_name.clone()),
            group_priority: self.group_priority,
            group_state: self.group_state.map(|s| s.as_str().to_string()),
            max_subcloud_rehoming: self.max_subcloud_rehoming,
        };
        client.subcloud_peer_groups.add(&request).await
    }

    fn format(&self, resource: Option<&SubcloudPeerGroup>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `subcloud-peer-group list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {}

impl ResourceCommand for ListArgs {
    type Resource = SubcloudPeerGroup;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudPeerGroup>> {
        client.subcloud_peer_groups.list().await
    }

    fn format(&self, resource: Option<&SubcloudPeerGroup>) -> Record {
        list_record(resource)
    }
}

/// A peer group named by id or name.
#[derive(Args, Debug, Clone, Default)]
pub struct PeerGroupRef {
    /// Name or ID of the subcloud peer group.
    pub group: String,
}

impl ResourceCommand for PeerGroupRef {
    type Resource = SubcloudPeerGroup;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudPeerGroup>> {
        client.subcloud_peer_groups.detail(&self.group).await
    }

    fn format(&self, resource: Option<&SubcloudPeerGroup>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `subcloud-peer-group update`.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Name or ID of the subcloud peer group.
    pub group: String,

    /// New name of the group.
    #[arg(long)]
    pub peer_group_name: Option<String>,

    /// Priority of this site for the group.
    #[arg(long)]
    pub group_priority: Option<u32>,

    /// Administrative state of the group.
    #[arg(long, value_enum)]
    pub group_state: Option<GroupState>,

    /// Subclouds rehomed at once.
    #[arg(long)]
    pub max_subcloud_rehoming: Option<u32>,
}

impl UpdateArgs {
    fn request(&self) -> PeerGroupRequest {
        PeerGroupRequest {
            peer_group_name: self.peer_group_name.clone(),
            group_priority: self.group_priority,
            group_state: self.group_state.map(|s| s.as_str().to_string()),
            max_subcloud_rehoming: self.max_subcloud_rehoming,
        }
    }
}

impl ResourceCommand for UpdateArgs {
    type Resource = SubcloudPeerGroup;

    fn prepare(&mut self, _prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.request().is_empty() {
            return Err(CliError::invalid("Nothing to update"));
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudPeerGroup>> {
        client.subcloud_peer_groups.update(&self.group, &self.request()).await
    }

    fn format(&self, resource: Option<&SubcloudPeerGroup>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `subcloud-peer-group delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Name or ID of the subcloud peer group.
    pub group: String,

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
        confirm.require(prompt, &format!("delete subcloud peer group {}", self.group), self.yes)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        client.subcloud_peer_groups.delete(&self.group).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Arguments of `subcloud-peer-group list-subclouds`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListSubcloudsArgs {
    /// Name or ID of the subcloud peer group.
    pub group: String,
}

impl ResourceCommand for ListSubcloudsArgs {
    type Resource = Subcloud;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        client.subcloud_peer_groups.list_subclouds(&self.group).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        basic_record(resource)
    }
}

/// Arguments of `subcloud-peer-group migrate`.
#[derive(Args, Debug, Clone, Default)]
pub struct MigrateArgs {
    /// Name or ID of the subcloud peer group.
    pub group: String,

    /// sysadmin password of the subclouds; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for MigrateArgs {
    type Resource = Subcloud;

    fn shape(&self) -> Shape {
        Shape::List
    }

    fn prepare(&mut self, prompt: &mut dyn Prompt, confirm: &Confirmation) -> Result<(), CliError> {
        confirm.require(
            prompt,
            &format!("migrate every subcloud of peer group {} to this system", self.group),
            self.yes,
        )?;
        self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let password = self.secrets.sysadmin.as_deref().unwrap_or_default();
        client.subcloud_peer_groups.migrate(&self.group, password).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        basic_record(resource)
    }
}

/// Arguments of `subcloud-peer-group status`.
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    /// Name or ID of the subcloud peer group.
    pub group: String,
}

impl ResourceCommand for StatusArgs {
    type Resource = PeerGroupStatus;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<PeerGroupStatus>> {
        client.subcloud_peer_groups.status(&self.group).await
    }

    fn format(&self, resource: Option<&PeerGroupStatus>) -> Record {
        status_record(resource)
    }
}

/// Runs a peer group subcommand.
pub async fn run<T: Transport>(command: PeerGroupCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        PeerGroupCommands::Add(args) => run_command(args, env).await,
        PeerGroupCommands::List(args) => run_command(args, env).await,
        PeerGroupCommands::Show(args) => run_command(args, env).await,
        PeerGroupCommands::Update(args) => run_command(args, env).await,
        PeerGroupCommands::Delete(args) => run_command(args, env).await,
        PeerGroupCommands::ListSubclouds(args) => run_command(args, env).await,
        PeerGroupCommands::Migrate(args) => run_command(args, env).await,
        PeerGroupCommands::Status(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dcmanager_client::{Body, Method};
    use serde_json::{Value, json};
    use test_case::test_case;

    use super::*;
    use crate::cli::Format;
    use crate::commands::harness::Harness;
    use crate::prompt::ScriptedPrompt;

    #[tokio::test]
    async fn add_uses_hyphenated_keys() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 1, "peer-group-name": "pg1", "group-priority": 0}));

        h.run(&["subcloud-peer-group", "add", "--peer-group-name", "pg1", "--group-state", "enabled", "--max-subcloud-rehoming", "10"])
            .await
            .expect("runs");

        assert_eq!(
            h.fake().last_request().expect("request").body,
            Body::Json(json!({"peer-group-name": "pg1", "group-state": "enabled", "max-subcloud-rehoming": 10}))
        );
    }

    #[tokio::test]
    async fn migrate_confirms_then_sends_encoded_password() {
        let mut h = Harness::new();
        h.confirm = Confirmation::new(true, Duration::from_secs(1));
        h.prompt = ScriptedPrompt::new(["yes", "pw", "pw"]);
        h.fake().push_json(json!({"subclouds": [{"id": 1, "name": "s1", "deploy-status": "rehome-pending"}]}));

        let out = h.run(&["subcloud-peer-group", "migrate", "pg1"]).await.expect("runs");

        assert!(out.starts_with("1 s1"));
        let sent = h.fake().last_request().expect("request");
        assert_eq!((sent.method, sent.path.as_str()), (Method::Patch, "/subcloud-peer-groups/pg1/migrate"));
        assert_eq!(sent.body, Body::Json(json!({"sysadmin_password": "cHc="})));
    }

    #[tokio::test]
    async fn migrate_timeout_sends_nothing() {
        let mut h = Harness::new();
        h.confirm = Confirmation::new(true, Duration::from_secs(1));
        h.prompt = ScriptedPrompt::default().then_timeout();

        let err = h.run(&["subcloud-peer-group", "migrate", "pg1"]).await.expect_err("timed out");

        assert!(matches!(err, CliError::Confirmation(_)));
        assert_eq!(h.fake().request_count(), 0);
    }

    #[tokio::test]
    async fn status_shows_counters() {
        let mut h = Harness::new();
        h.format = Format::Json;
        h.fake().push_json(json!({
            "peer_group_id": 1, "peer_group_name": "pg1", "total_subclouds": 3, "complete": 1,
            "waiting_for_migrate": 1, "rehoming": 1, "rehome_failed": 0, "managed": 1, "unmanaged": 2
        }));

        let out = h.run(&["subcloud-peer-group", "status", "pg1"]).await.expect("runs");
        let fields: Value = serde_json::from_str(&out).expect("json");

        assert_eq!(fields["total_subclouds"], "3");
        assert_eq!(fields["unmanaged"], "2");
    }

    #[test_case(detail_record(None), DETAIL_COLUMNS.len() ; "detail")]
    #[test_case(list_record(None), LIST_COLUMNS.len() ; "list")]
    #[test_case(status_record(None), STATUS_COLUMNS.len() ; "status")]
    fn absent_peer_group_formats_as_placeholders(rec: Record, columns: usize) {
        assert_eq!(rec.len(), columns);
        assert!(rec.values.iter().all(|v| v == "<none>"));
    }
}
