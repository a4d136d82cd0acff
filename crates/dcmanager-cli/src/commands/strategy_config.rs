//! `strategy-config` commands: per-cloud strategy options.

use clap::{Args, Subcommand, ValueEnum};
use dcmanager_client::v1::{SwUpdateOptions, SwUpdateOptionsRequest};
use dcmanager_client::{DcManagerClient, Transport};

use super::subcloud_group::ApplyType;
use super::{Env, ResourceCommand, Shape, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt};

/// Shown instead of the cloud name of the system-wide defaults.
const ALL_CLOUDS_DEFAULT: &str = "all clouds default";

const LIST_COLUMNS: &[&str] = &[
    "cloud",
    "storage apply type",
    "worker apply type",
    "max parallel workers",
    "alarm restriction type",
    "default instance action",
];

const DETAIL_COLUMNS: &[&str] = &[
    "cloud",
    "storage apply type",
    "worker apply type",
    "max parallel workers",
    "alarm restriction type",
    "default instance action",
    "created_at",
    "updated_at",
];

fn cloud_label(options: &SwUpdateOptions) -> String {
    if options.is_default() {
        ALL_CLOUDS_DEFAULT.to_string()
    } else {
        options.name.clone()
    }
}

fn option_values(o: &SwUpdateOptions) -> Vec<String> {
    vec![
        cloud_label(o),
        text(o.storage_apply_type.as_ref()),
        text(o.worker_apply_type.as_ref()),
        text(o.max_parallel_workers.as_ref()),
        text(o.alarm_restriction_type.as_ref()),
        text(o.default_instance_action.as_ref()),
    ]
}

fn list_record(options: Option<&SwUpdateOptions>) -> Record {
    record(LIST_COLUMNS, options, option_values)
}

fn detail_record(options: Option<&SwUpdateOptions>) -> Record {
    record(DETAIL_COLUMNS, options, |o| {
        let mut values = option_values(o);
        values.push(text(o.created_at.as_ref()));
        values.push(text(o.updated_at.as_ref()));
        values
    })
}

/// Alarms that block a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlarmRestriction {
    /// Any alarm blocks.
    Strict,
    /// Only management-affecting alarms block.
    Relaxed,
}

impl AlarmRestriction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
        }
    }
}

/// What happens to instances on a host being updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InstanceAction {
    /// Stop and restart instances in place.
    StopStart,
    /// Migrate instances away.
    Migrate,
}

impl InstanceAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::StopStart => "stop-start",
            Self::Migrate => "migrate",
        }
    }
}

/// Strategy options subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StrategyConfigCommands {
    /// Set the options of a cloud, or the defaults.
    Update(UpdateArgs),
    /// List the options of every cloud.
    List(ListArgs),
    /// Show the options of a cloud, or the defaults.
    Show(ShowArgs),
    /// Drop the options of a cloud so the defaults apply.
    Delete(DeleteArgs),
}

/// Arguments of `strategy-config update`.
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Subcloud name; omit to update the defaults.
    pub cloud_name: Option<String>,

    /// How storage hosts are updated.
    #[arg(long, value_enum)]
    pub storage_apply_type: ApplyType,

    /// How worker hosts are updated.
    #[arg(long, value_enum)]
    pub worker_apply_type: ApplyType,

    /// Worker hosts updated at once.
    #[arg(long)]
    pub max_parallel_workers: u32,

    /// Alarms that block the strategy.
    #[arg(long, value_enum)]
    pub alarm_restriction_type: AlarmRestriction,

    /// What happens to instances on updated hosts.
    #[arg(long, value_enum)]
    pub default_instance_action: InstanceAction,
}

impl ResourceCommand for UpdateArgs {
    type Resource = SwUpdateOptions;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SwUpdateOptions>> {
        let request = SwUpdateOptionsRequest {
            storage_apply_type: self.storage_apply_type.as_str().to_string(),
            worker_apply_type: self.worker_apply_type.as_str().to_string(),
            max_parallel_workers: self.max_parallel_workers,
            alarm_restriction_type: self.alarm_restriction_type.as_str().to_string(),
            default_instance_action: self.default_instance_action.as_str().to_string(),
        };
        client
            .sw_update_options
            .update(self.cloud_name.as_deref(), &request)
            .await
    }

    fn format(&self, resource: Option<&SwUpdateOptions>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `strategy-config list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {}

impl ResourceCommand for ListArgs {
    type Resource = SwUpdateOptions;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SwUpdateOptions>> {
        client.sw_update_options.list().await
    }

    fn format(&self, resource: Option<&SwUpdateOptions>) -> Record {
        list_record(resource)
    }
}

/// Arguments of `strategy-config show`.
#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Subcloud name; omit to show the defaults.
    pub cloud_name: Option<String>,
}

impl ResourceCommand for ShowArgs {
    type Resource = SwUpdateOptions;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SwUpdateOptions>> {
        client.sw_update_options.detail(self.cloud_name.as_deref()).await
    }

    fn format(&self, resource: Option<&SwUpdateOptions>) -> Record {
        detail_record(resource)
    }
}

/// Arguments of `strategy-config delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Subcloud whose options are dropped.
    pub cloud_name: String,
}

impl ResourceCommand for DeleteArgs {
    type Resource = ();

    fn shape(&self) -> Shape {
        Shape::Silent
    }

    fn prepare(&mut self, _prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.cloud_name.trim().is_empty() {
            return Err(CliError::invalid("A cloud name is required; the defaults cannot be deleted"));
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        client.sw_update_options.delete(&self.cloud_name).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Runs a strategy options subcommand.
pub async fn run<T: Transport>(command: StrategyConfigCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        StrategyConfigCommands::Update(args) => run_command(args, env).await,
        StrategyConfigCommands::List(args) => run_command(args, env).await,
        StrategyConfigCommands::Show(args) => run_command(args, env).await,
        StrategyConfigCommands::Delete(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use dcmanager_client::{Body, Method};
    use serde_json::json;

    use super::*;
    use crate::commands::harness::Harness;

    const UPDATE: &[&str] = &[
        "--storage-apply-type",
        "parallel",
        "--worker-apply-type",
        "serial",
        "--max-parallel-workers",
        "4",
        "--alarm-restriction-type",
        "relaxed",
        "--default-instance-action",
        "stop-start",
    ];

    #[tokio::test]
    async fn update_without_cloud_targets_defaults() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"name": "RegionOne", "storage-apply-type": "parallel"}));

        let mut argv = vec!["strategy-config", "update"];
        argv.extend_from_slice(UPDATE);
        let out = h.run(&argv).await.expect("runs");

        assert_eq!(out.lines().next(), Some(ALL_CLOUDS_DEFAULT));
        let sent = h.fake().last_request().expect("request");
        assert_eq!((sent.method, sent.path.as_str()), (Method::Post, "/sw-update-options/RegionOne"));
        assert_eq!(
            sent.body,
            Body::Json(json!({
                "storage-apply-type": "parallel",
                "worker-apply-type": "serial",
                "max-parallel-workers": 4,
                "alarm-restriction-type": "relaxed",
                "default-instance-action": "stop-start"
            }))
        );
    }

    #[tokio::test]
    async fn update_requires_every_option() {
        let mut h = Harness::new();
        let err = h
            .run(&["strategy-config", "update", "subcloud1", "--max-parallel-workers", "2"])
            .await
            .expect_err("missing options");
        assert!(matches!(err, CliError::InvalidArgument(_)));
        assert_eq!(h.fake().request_count(), 0);
    }

    #[tokio::test]
    async fn list_labels_defaults_and_keeps_subcloud_names() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"sw-update-options": [
            {"name": "RegionOne", "storage-apply-type": "parallel", "worker-apply-type": "parallel",
             "max-parallel-workers": 10, "alarm-restriction-type": "relaxed", "default-instance-action": "migrate"},
            {"name": "subcloud1", "storage-apply-type": "serial"}
        ]}));

        let out = h.run(&["strategy-config", "list"]).await.expect("runs");

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "all clouds default parallel parallel 10 relaxed migrate");
        assert!(lines[1].starts_with("subcloud1 serial"));
    }

    #[tokio::test]
    async fn show_named_cloud() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"name": "subcloud1"}));

        let out = h.run(&["strategy-config", "show", "subcloud1"]).await.expect("runs");

        assert_eq!(out.lines().count(), DETAIL_COLUMNS.len());
        assert_eq!(h.fake().last_request().expect("request").path, "/sw-update-options/subcloud1");
    }

    #[tokio::test]
    async fn delete_needs_cloud_name() {
        let mut h = Harness::new();
        assert!(h.run(&["strategy-config", "delete"]).await.is_err());

        h.run(&["strategy-config", "delete", "subcloud1"]).await.expect("runs");
        let sent = h.fake().last_request().expect("request");
        assert_eq!((sent.method, sent.path.as_str()), (Method::Delete, "/sw-update-options/subcloud1"));
    }
}
