//! `subcloud-deploy` commands: deployment artifacts per release.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use dcmanager_client::v1::{DeployDeleteOptions, SubcloudDeploy};
use dcmanager_client::{DcManagerClient, Form, Transport};

use super::{Env, ResourceCommand, Shape, no_columns, run_command};
use crate::error::CliError;
use crate::output::{Record, record, text};
use crate::prompt::{Confirmation, Prompt};

const COLUMNS: &[&str] = &[
    "deploy_playbook",
    "deploy_overrides",
    "deploy_chart",
    "prestage_images",
    "software_version",
];

fn deploy_record(resource: Option<&SubcloudDeploy>) -> Record {
    record(COLUMNS, resource, |d| {
        vec![
            text(d.deploy_playbook.as_ref()),
            text(d.deploy_overrides.as_ref()),
            text(d.deploy_chart.as_ref()),
            text(d.prestage_images.as_ref()),
            text(d.software_version.as_ref()),
        ]
    })
}

/// Deploy artifact subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SubcloudDeployCommands {
    /// Upload deployment artifacts.
    Upload(UploadArgs),
    /// Show the artifacts of a release.
    Show(ShowArgs),
    /// Delete the artifacts of a release.
    Delete(DeleteArgs),
}

/// Arguments of `subcloud-deploy upload`.
#[derive(Args, Debug, Clone, Default)]
pub struct UploadArgs {
    /// Ansible playbook of the deployment.
    #[arg(long)]
    pub deploy_playbook: Option<PathBuf>,

    /// Overrides file of the deployment.
    #[arg(long)]
    pub deploy_overrides: Option<PathBuf>,

    /// Helm chart of the deployment.
    #[arg(long)]
    pub deploy_chart: Option<PathBuf>,

    /// List of container images to prestage.
    #[arg(long)]
    pub prestage_images: Option<PathBuf>,

    /// Release the artifacts belong to.
    #[arg(long)]
    pub release: Option<String>,
}

impl ResourceCommand for UploadArgs {
    type Resource = SubcloudDeploy;

    fn prepare(&mut self, _prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        if self.deploy_playbook.is_none()
            && self.deploy_overrides.is_none()
            && self.deploy_chart.is_none()
            && self.prestage_images.is_none()
        {
            return Err(CliError::invalid(
                "At least one of --deploy-playbook, --deploy-overrides, --deploy-chart \
                 or --prestage-images is required",
            ));
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudDeploy>> {
        let form = Form::new()
            .text_opt("release", self.release.as_ref())
            .file_opt("deploy_playbook", self.deploy_playbook.as_ref())?
            .file_opt("deploy_overrides", self.deploy_overrides.as_ref())?
            .file_opt("deploy_chart", self.deploy_chart.as_ref())?
            .file_opt("prestage_images", self.prestage_images.as_ref())?;
        client.subcloud_deploys.upload(form).await
    }

    fn format(&self, resource: Option<&SubcloudDeploy>) -> Record {
        deploy_record(resource)
    }
}

/// Arguments of `subcloud-deploy show`.
#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Release to show; defaults to the active release.
    #[arg(long)]
    pub release: Option<String>,
}

impl ResourceCommand for ShowArgs {
    type Resource = SubcloudDeploy;

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<SubcloudDeploy>> {
        client.subcloud_deploys.show(self.release.as_deref()).await
    }

    fn format(&self, resource: Option<&SubcloudDeploy>) -> Record {
        deploy_record(resource)
    }
}

/// Arguments of `subcloud-deploy delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Release whose artifacts are deleted; defaults to the active release.
    #[arg(long)]
    pub release: Option<String>,

    /// Delete only the prestage images list.
    #[arg(long)]
    pub prestage_images: bool,

    /// Delete only the deployment files.
    #[arg(long)]
    pub deployment_files: bool,

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
        let release = self.release.as_deref().unwrap_or("the active release");
        confirm.require(prompt, &format!("delete the deployment artifacts of {release}"), self.yes)
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        let options = DeployDeleteOptions {
            prestage_images: self.prestage_images,
            deployment_files: self.deployment_files,
        };
        client.subcloud_deploys.delete(self.release.as_deref(), options).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Runs a deploy artifact subcommand.
pub async fn run<T: Transport>(command: SubcloudDeployCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        SubcloudDeployCommands::Upload(args) => run_command(args, env).await,
        SubcloudDeployCommands::Show(args) => run_command(args, env).await,
        SubcloudDeployCommands::Delete(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dcmanager_client::{Body, Method};
    use serde_json::json;

    use super::*;
    use crate::commands::harness::Harness;

    #[tokio::test]
    async fn upload_attaches_given_files() {
        let mut chart = tempfile::NamedTempFile::new().expect("temp file");
        chart.write_all(b"chart").expect("write");
        let mut h = Harness::new();
        h.fake().push_json(json!({"subcloud_deploy": {"deploy_chart": "chart.tgz", "software_version": "24.09"}}));

        let out = h
            .run(&["subcloud-deploy", "upload", "--deploy-chart", chart.path().to_str().expect("path"), "--release", "24.09"])
            .await
            .expect("runs");

        assert_eq!(out, "\n\nchart.tgz\n\n24.09\n");
        let sent = h.fake().last_request().expect("request");
        assert_eq!(sent.method, Method::Post);
        let Body::Multipart(form) = sent.body else { panic!("expected multipart") };
        assert_eq!(form.field("release"), Some("24.09"));
        assert_eq!(form.files()[0].field, "deploy_chart");
    }

    #[tokio::test]
    async fn upload_without_files_fails() {
        let mut h = Harness::new();
        let err = h.run(&["subcloud-deploy", "upload"]).await.expect_err("invalid");
        assert!(matches!(err, CliError::InvalidArgument(_)));
        assert_eq!(h.fake().request_count(), 0);
    }

    #[tokio::test]
    async fn delete_passes_query_flags() {
        let mut h = Harness::new();

        h.run(&["subcloud-deploy", "delete", "--release", "24.09", "--prestage-images"])
            .await
            .expect("runs");

        assert_eq!(
            h.fake().last_request().expect("request").path,
            "/subcloud-deploy/24.09?prestage_images=true"
        );
    }

    #[test]
    fn absent_deploy_formats_as_placeholders() {
        assert_eq!(ShowArgs::default().format(None), Record::placeholder(COLUMNS));
    }
}
