//! `alarm` commands.

use clap::{Args, Subcommand};
use dcmanager_client::v1::AlarmSummary;
use dcmanager_client::{DcManagerClient, Transport};

use super::{Env, ResourceCommand, Shape, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};

const COLUMNS: &[&str] = &[
    "NAME",
    "CRITICAL_ALARMS",
    "MAJOR_ALARMS",
    "MINOR_ALARMS",
    "WARNINGS",
    "STATUS",
];

/// Alarm subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AlarmCommands {
    /// Show alarm counts of the system controller and every subcloud.
    Summary(SummaryArgs),
}

/// Arguments of `alarm summary`.
#[derive(Args, Debug, Clone, Default)]
pub struct SummaryArgs {}

impl ResourceCommand for SummaryArgs {
    type Resource = AlarmSummary;

    fn shape(&self) -> Shape {
        Shape::List
    }

    async fn resources<T: Transport>(
        &self,
        client: &DcManagerClient<T>,
    ) -> dcmanager_client::Result<Vec<AlarmSummary>> {
        client.alarms.list().await
    }

    fn format(&self, resource: Option<&AlarmSummary>) -> Record {
        record(COLUMNS, resource, |alarm| {
            vec![
                alarm.region_name.clone(),
                text(alarm.critical_alarms.as_ref()),
                text(alarm.major_alarms.as_ref()),
                text(alarm.minor_alarms.as_ref()),
                text(alarm.warnings.as_ref()),
                text(alarm.cloud_status.as_ref()),
            ]
        })
    }
}

/// Runs an alarm subcommand.
pub async fn run<T: Transport>(command: AlarmCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        AlarmCommands::Summary(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::commands::harness::Harness;

    #[tokio::test]
    async fn summary_lists_every_region() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"alarm_summary": [
            {"region_name": "SystemController", "critical_alarms": 0, "major_alarms": 1,
             "minor_alarms": 0, "warnings": 2, "cloud_status": "degraded"},
            {"region_name": "subcloud1", "critical_alarms": 0, "major_alarms": 0,
             "minor_alarms": 0, "warnings": 0, "cloud_status": "OK"}
        ]}));

        let out = h.run(&["alarm", "summary"]).await.expect("runs");

        assert_eq!(out, "SystemController 0 1 0 2 degraded\nsubcloud1 0 0 0 0 OK\n");
        assert_eq!(h.fake().last_request().expect("request").path, "/alarms");
    }

    #[tokio::test]
    async fn empty_summary_prints_placeholder_row() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"alarm_summary": []}));

        let out = h.run(&["alarm", "summary"]).await.expect("runs");

        assert_eq!(out, format!("{}\n", vec!["<none>"; COLUMNS.len()].join(" ")));
    }

    #[test]
    fn absent_summary_formats_as_placeholders() {
        let formatted = SummaryArgs::default().format(None);
        assert_eq!(formatted, Record::placeholder(COLUMNS));
    }
}
