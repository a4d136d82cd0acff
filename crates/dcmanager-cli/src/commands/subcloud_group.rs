//! `subcloud-group` commands.

use clap::{Args, Subcommand, ValueEnum};
use dcmanager_client::v1::{Subcloud, SubcloudGroup, SubcloudGroupRequest};
use dcmanager_client::{DcManagerClient, Transport};

use super::subcloud::basic_record;
use super::{Env, ResourceCommand, Shape, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt};

const LIST_COLUMNS: &[&str] = &["id", "name", "description"];

const DETAIL_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "update apply type",
    "max parallel subclouds",
    "created_at",
    "updated_at",
];

fn list_record(group: Option<&SubcloudGroup>) -> Record {
    record(LIST_COLUMNS, group, |g| {
        vec![g.group_id.clone(), g.name.clone(), text(g.description.as_ref())]
    })
}

fn detail_record(group: Option<&SubcloudGroup>) -> Record {
    record(DETAIL_COLUMNS, group, |g| {
        vec![
            g.group_id.clone(),
            g.name.clone(),
            text(g.description.as_ref()),
            text(g.update_apply_type.as_ref()),
            text(g.max_parallel_subclouds.as_ref()),
            text(g.created_at.as_ref()),
            text(g.updated_at.as_ref()),
        ]
    })
}

/// How a group's subclouds are updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ApplyType {
    /// Update subclouds concurrently.
    Parallel,
    /// Update subclouds one at a time.
    Serial,
}

impl ApplyType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Serial => "serial",
        }
    }
}

/// Group subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SubcloudGroupCommands {
    /// Add a subcloud group.
    Add(AddArgs),
    /// List subcloud groups.
    List(ListArgs),
    /// Show one subcloud group.
    Show(GroupRef),
    /// Update a subcloud group.
    Update(UpdateArgs),
    /// Delete a subcloud group.
    Delete(DeleteArgs),
    /// List the subclouds of a group.
    ListSubclouds(ListSubcloudsArgs),
}

/// Arguments of `subcloud-group add`.
#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Name of the group.
    #[arg(long)]
    pub name: String,

    /// Description of the group.
    #[arg(long)]
    pub description: Option<String>,

    /// How the group's subclouds are updated.
    #[arg(long, value_enum)]
    pub update_apply_type: Option<ApplyType>,

    /// Subclouds updated at once.
    #[arg(long)]
    pub max_parallel_subclouds: Option<u32>,
}

impl ResourceCommand for AddArgs {
    type Resource = SubcloudGroup;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudGroup>> {
        let request = SubcloudGroupRequest {
            name: Some(self.name.clone()),
            description: self.description.clone(),
            update_apply_type: self.update_apply_type.map(|t| t.as_str().to_string()),
            max_parallel_subclouds: self.max_parallel_subclouds,
        };
        client.subcloud_groups.add(&request).await
    }

    fn format(&self, resource: Option<&SubcloudGroup>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `subcloud-group list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {}

impl ResourceCommand for ListArgs {
    type Resource = SubcloudGroup;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudGroup>> {
        client.subcloud_groups.list().await
    }

    fn format(&self, resource: Option<&SubcloudGroup>) -> Record {
        list_record(resource)
    }
}

/// A group named by id or name.
#[derive(Args, Debug, Clone, Default)]
pub struct GroupRef {
    /// Name or ID of the subcloud group.
    pub group: String,
}

impl ResourceCommand for GroupRef {
    type Resource = SubcloudGroup;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudGroup>> {
        client.subcloud_groups.detail(&self.group).await
    }

    fn format(&self, resource: Option<&SubcloudGroup>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `subcloud-group update`.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Name or ID of the subcloud group.
    pub group: String,

    /// New name of the group.
    #[arg(long)]
    pub name: Option<String>,

    /// New description of the group.
    #[arg(long)]
    pub description: Option<String>,

    /// How the group's subclouds are updated.
    #[arg(long, value_enum)]
    pub update_apply_type: Option<ApplyType>,

    /// Subclouds updated at once.
    #[arg(long)]
    pub max_parallel_subclouds: Option<u32>,
}

impl UpdateArgs {
    fn request(&self) -> SubcloudGroupRequest {
        SubcloudGroupRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            update_apply_type: self.update_apply_type.map(|t| t.as_str().to_string()),
            max_parallel_subclouds: self.max_parallel_subclouds,
        }
    }
}

impl ResourceCommand for UpdateArgs {
    type Resource = SubcloudGroup;

    fn prepare(&mut self, _prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.request().is_empty() {
            return Err(CliError::invalid("Nothing to update"));
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudGroup>> {
        client.subcloud_groups.update(&self.group, &self.request()).await
    }

    fn format(&self, resource: Option<&SubcloudGroup>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `subcloud-group delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Name or ID of the subcloud group.
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
        confirm.require(prompt, &format!("delete subcloud group {}", self.group), self.yes)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        client.subcloud_groups.delete(&self.group).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Arguments of `subcloud-group list-subclouds`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListSubcloudsArgs {
    /// Name or ID of the subcloud group.
    pub group: String,
}

impl ResourceCommand for ListSubcloudsArgs {
    type Resource = Subcloud;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        client.subcloud_groups.list_subclouds(&self.group).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        basic_record(resource)
    }
}

/// Runs a group subcommand.
pub async fn run<T: Transport>(command: SubcloudGroupCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        SubcloudGroupCommands::Add(args) => run_command(args, env).await,
        SubcloudGroupCommands::List(args) => run_command(args, env).await,
        SubcloudGroupCommands::Show(args) => run_command(args, env).await,
        SubcloudGroupCommands::Update(args) => run_command(args, env).await,
        SubcloudGroupCommands::Delete(args) => run_command(args, env).await,
        SubcloudGroupCommands::ListSubclouds(args) => run_command(args, env).await,
    }
}
