//! `strategy-step` commands.

use clap::{Args, Subcommand};
use dcmanager_client::v1::StrategyStep;
use dcmanager_client::{DcManagerClient, Transport};

use super::{Env, ResourceCommand, Shape, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};

const LIST_COLUMNS: &[&str] = &["cloud", "stage", "state", "details", "started_at", "finished_at"];

const DETAIL_COLUMNS: &[&str] = &[
    "cloud",
    "stage",
    "state",
    "details",
    "started_at",
    "finished_at",
    "created_at",
    "updated_at",
];

fn step_values(s: &StrategyStep) -> Vec<String> {
    vec![
        s.cloud.clone(),
        text(s.stage.as_ref()),
        text(s.state.as_ref()),
        text(s.details.as_ref()),
        text(s.started_at.as_ref()),
        text(s.finished_at.as_ref()),
    ]
}

/// Strategy step subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum StrategyStepCommands {
    /// List the steps of the active strategy.
    List(ListArgs),
    /// Show the step of one cloud.
    Show(ShowArgs),
}

/// Arguments of `strategy-step list`.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {}

impl ResourceCommand for ListArgs {
    type Resource = StrategyStep;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<StrategyStep>> {
        client.strategy_steps.list().await
    }

    fn format(&self, resource: Option<&StrategyStep>) -> Record {
        record(LIST_COLUMNS, resource, step_values)
    }
}

/// Arguments of `strategy-step show`.
#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Name of the cloud.
    pub cloud_name: String,
}

impl ResourceCommand for ShowArgs {
    type Resource = StrategyStep;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<StrategyStep>> {
        client.strategy_steps.detail(&self.cloud_name).await
    }

    fn format(&self, resource: Option<&StrategyStep>) -> Record {
        record(DETAIL_COLUMNS, resource, |s| {
            let mut values = step_values(s);
            values.push(text(s.created_at.as_ref()));
            values.push(text(s.updated_at.as_ref()));
            values
        })
    }
}

/// Runs a strategy step subcommand.
pub async fn run<T: Transport>(command: StrategyStepCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        StrategyStepCommands::List(args) => run_command(args, env).await,
        StrategyStepCommands::Show(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::commands::harness::Harness;

    #[tokio::test]
    async fn list_renders_one_row_per_cloud() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"strategy-steps": [
            {"cloud": "SystemController", "stage": 1, "state": "complete", "details": "",
             "started-at": "2024-05-01 10:00:00", "finished-at": "2024-05-01 10:05:00"},
            {"cloud": "subcloud1", "stage": 2, "state": "applying"}
        ]}));

        let out = h.run(&["strategy-step", "list"]).await.expect("runs");

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("subcloud1 2 applying"));
        assert_eq!(h.fake().last_request().expect("request").path, "/sw-update-strategy/steps");
    }

    #[tokio::test]
    async fn show_adds_timestamps() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"cloud": "subcloud1", "created-at": "2024-05-01 09:59:00"}));

        let out = h.run(&["strategy-step", "show", "subcloud1"]).await.expect("runs");

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), DETAIL_COLUMNS.len());
        assert_eq!(lines[6], "2024-05-01 09:59:00");
        assert_eq!(h.fake().last_request().expect("request").path, "/sw-update-strategy/steps/subcloud1");
    }

    #[test]
    fn absent_step_formats_as_placeholders() {
        assert_eq!(ListArgs::default().format(None), Record::placeholder(LIST_COLUMNS));
    }
}
