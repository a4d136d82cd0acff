//! `peer-group-association` commands.

use clap::{Args, Subcommand};
use dcmanager_client::v1::{AssociationRequest, PeerGroupAssociation};
use dcmanager_client::{DcManagerClient, Transport};

use super::{Env, ResourceCommand, Shape, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt};

const LIST_COLUMNS: &[&str] = &[
    "id",
    "peer_group_id",
    "system_peer_id",
    "type",
    "sync_status",
    "peer_group_priority",
];

const DETAIL_COLUMNS: &[&str] = &[
    "id",
    "peer_group_id",
    "system_peer_id",
    "association_type",
    "sync_status",
    "peer_group_priority",
    "sync_message",
    "created_at",
    "updated_at",
];

fn list_record(association: Option<&PeerGroupAssociation>) -> Record {
    record(LIST_COLUMNS, association, |a| {
        vec![
            a.association_id.clone(),
            text(a.peer_group_id.as_ref()),
            text(a.system_peer_id.as_ref()),
            text(a.association_type.as_ref()),
            text(a.sync_status.as_ref()),
            text(a.peer_group_priority.as_ref()),
        ]
    })
}

fn detail_record(association: Option<&PeerGroupAssociation>) -> Record {
    record(DETAIL_COLUMNS, association, |a| {
        vec![
            a.association_id.clone(),
            text(a.peer_group_id.as_ref()),
            text(a.system_peer_id.as_ref()),
            text(a.association_type.as_ref()),
            text(a.sync_status.as_ref()),
            text(a.peer_group_priority.as_ref()),
            text(a.sync_message.as_ref()),
            text(a.created_at.as_ref()),
            text(a.updated_at.as_ref()),
        ]
    })
}

/// Association subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AssociationCommands {
    /// Associate a subcloud peer group with a system peer.
    Add(AddArgs),
    /// List associations.
    List(ListArgs),
    /// Show one association.
    Show(AssociationRef),
    /// Change the priority of an association.
    Update(UpdateArgs),
    /// Delete an association.
    Delete(DeleteArgs),
    /// Push the peer group to the associated system peer.
    Sync(SyncArgs),
}

/// Arguments of `peer-group-association add`.
#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// ID of the subcloud peer group.
    #[arg(long)]
    pub peer_group_id: u32,

    /// ID of the system peer.
    #[arg(long)]
    pub system_peer_id: u32,

    /// Priority of the peer group on the system peer.
    #[arg(long)]
    pub peer_group_priority: Option<u32>,
}

impl ResourceCommand for AddArgs {
    type Resource = PeerGroupAssociation;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<PeerGroupAssociation>> {
        let request = AssociationRequest {
            peer_group_id: Some(self.peer_group_id),
            system_peer_id: Some(self.system_peer_id),
            peer_group_priority: self.peer_group_priority,
        };
        client.peer_group_associations.add(&request).await
    }

    fn format(&self, resource: Option<&PeerGroupAssociation>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `peer-group-association list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {}

impl ResourceCommand for ListArgs {
    type Resource = PeerGroupAssociation;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<PeerGroupAssociation>> {
        client.peer_group_associations.list().await
    }

    fn format(&self, resource: Option<&PeerGroupAssociation>) -> Record {
        list_record(resource)
    }
}

/// An association named by id.
#[derive(Args, Debug, Clone, Default)]
pub struct AssociationRef {
    /// ID of the association.
    pub id: String,
}

impl ResourceCommand for AssociationRef {
    type Resource = PeerGroupAssociation;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<PeerGroupAssociation>> {
        client.peer_group_associations.detail(&self.id).await
    }

    fn format(&self, resource: Option<&PeerGroupAssociation>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `peer-group-association update`.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// ID of the association.
    pub id: String,

    /// New priority of the peer group on the system peer.
    #[arg(long)]
    pub peer_group_priority: u32,
}

impl ResourceCommand for UpdateArgs {
    type Resource = PeerGroupAssociation;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<PeerGroupAssociation>> {
        let request = AssociationRequest {
            peer_group_priority: Some(self.peer_group_priority),
            ..AssociationRequest::default()
        };
        client.peer_group_associations.update(&self.id, &request).await
    }

    fn format(&self, resource: Option<&PeerGroupAssociation>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `peer-group-association delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// ID of the association.
    pub id: String,

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
        confirm.require(prompt, &format!("delete peer group association {}", self.id), self.yes)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        client.peer_group_associations.delete(&self.id).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Arguments of `peer-group-association sync`.
#[derive(Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// ID of the association.
    pub id: String,
}

impl ResourceCommand for SyncArgs {
    type Resource = PeerGroupAssociation;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<PeerGroupAssociation>> {
        client.peer_group_associations.sync(&self.id).await
    }

    fn format(&self, resource: Option<&PeerGroupAssociation>) -> Record {
        detail_record(resource)
    }
}

/// Runs an association subcommand.
pub async fn run<T: Transport>(command: AssociationCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        AssociationCommands::Add(args) => run_command(args, env).await,
        AssociationCommands::List(args) => run_command(args, env).await,
        AssociationCommands::Show(args) => run_command(args, env).await,
        AssociationCommands::Update(args) => run_command(args, env).await,
        AssociationCommands::Delete(args) => run_command(args, env).await,
        AssociationCommands::Sync(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dcmanager_client::{Body, Method};
    use serde_json::json;

    use super::*;
    use crate::commands::harness::Harness;
    use crate::prompt::ScriptedPrompt;

    #[tokio::test]
    async fn add_sends_numeric_ids() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 5, "peer_group_id": 1, "system_peer_id": 2}));

        h.run(&["peer-group-association", "add", "--peer-group-id", "1", "--system-peer-id", "2", "--peer-group-priority", "3"])
            .await
            .expect("runs");

        assert_eq!(
            h.fake().last_request().expect("request").body,
            Body::Json(json!({"peer_group_id": 1, "system_peer_id": 2, "peer_group_priority": 3}))
        );
    }

    #[tokio::test]
    async fn add_rejects_non_numeric_id() {
        let mut h = Harness::new();
        let err = h
            .run(&["peer-group-association", "add", "--peer-group-id", "pg", "--system-peer-id", "2"])
            .await
            .expect_err("not a number");
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn list_shows_short_type_column() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"peer_group_associations": [{
            "id": 5, "peer_group_id": 1, "system_peer_id": 2, "association_type": "primary",
            "sync_status": "in-sync", "peer_group_priority": 2, "sync_message": "ok"
        }]}));

        let out = h.run(&["peer-group-association", "list"]).await.expect("runs");

        assert_eq!(out, "5 1 2 primary in-sync 2\n");
    }

    #[tokio::test]
    async fn sync_patches_nested_path() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 5, "sync_status": "syncing"}));

        let out = h.run(&["peer-group-association", "sync", "5"]).await.expect("runs");

        assert_eq!(out.lines().nth(4), Some("syncing"));
        let sent = h.fake().last_request().expect("request");
        assert_eq!((sent.method, sent.path.as_str()), (Method::Patch, "/peer-group-associations/5/sync"));
    }

    #[tokio::test]
    async fn delete_declined_sends_nothing() {
        let mut h = Harness::new();
        h.confirm = Confirmation::new(true, Duration::from_secs(1));
        h.prompt = ScriptedPrompt::new(["no"]);

        let err = h.run(&["peer-group-association", "delete", "5"]).await.expect_err("declined");

        assert_eq!(err.to_string(), "Operation cancelled by the user");
        assert_eq!(h.fake().request_count(), 0);
    }

    #[tokio::test]
    async fn update_sends_priority_only() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"id": 5}));

        h.run(&["peer-group-association", "update", "5", "--peer-group-priority", "9"]).await.expect("runs");

        assert_eq!(h.fake().last_request().expect("request").body, Body::Json(json!({"peer_group_priority": 9})));
    }
}
