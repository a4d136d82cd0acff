//! `subcloud-backup` commands.
//!
//! Every verb targets either one subcloud or a whole subcloud group.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use dcmanager_client::utils::bool_flag;
use dcmanager_client::v1::{BackupDeleteRequest, Subcloud};
use dcmanager_client::{DcManagerClient, Form, Transport};

use super::subcloud::{basic_record, detail_record};
use super::{Env, ResourceCommand, Secrets, Shape, exclusive, no_columns, run_command};
use crate::error::CliError;
use crate::output::Record;
use crate::prompt::{Confirmation, Prompt, password_or_prompt};

/// Backup subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum SubcloudBackupCommands {
    /// Back up a subcloud or every subcloud of a group.
    Create(CreateArgs),
    /// Delete backups taken for a release.
    Delete(DeleteArgs),
    /// Restore a subcloud or group from backup.
    Restore(RestoreArgs),
}

/// Target of a backup operation.
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Name or ID of the subcloud.
    #[arg(long)]
    pub subcloud: Option<String>,

    /// Name or ID of the subcloud group.
    #[arg(long)]
    pub group: Option<String>,
}

impl Target {
    fn validate(&self) -> Result<(), CliError> {
        exclusive(
            self.subcloud.is_some(),
            self.group.is_some(),
            "The --subcloud and --group options are mutually exclusive",
        )?;
        if self.subcloud.is_none() && self.group.is_none() {
            return Err(CliError::invalid(
                "Please provide the subcloud or subcloud group name or id",
            ));
        }
        Ok(())
    }

    fn form(&self) -> Form {
        Form::new()
            .text_opt("subcloud", self.subcloud.as_ref())
            .text_opt("group", self.group.as_ref())
    }
}

fn registry_needs_local(registry_images: bool, local_only: bool) -> Result<(), CliError> {
    if registry_images && !local_only {
        return Err(CliError::invalid(
            "Option --registry-images cannot be used without --local-only option",
        ));
    }
    Ok(())
}

fn flag(set: bool) -> Option<&'static str> {
    set.then_some(bool_flag(true))
}

/// Arguments of `subcloud-backup create`.
#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Subcloud or group selection.
    #[command(flatten)]
    pub target: Target,

    /// Keep the backup on the subcloud instead of the system controller.
    #[arg(long)]
    pub local_only: bool,

    /// Include the container registry images; requires `--local-only`.
    #[arg(long)]
    pub registry_images: bool,

    /// YAML file overriding the backup playbook values.
    #[arg(long)]
    pub backup_values: Option<PathBuf>,

    /// sysadmin password of the subcloud; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for CreateArgs {
    type Resource = Subcloud;

    fn shape(&self) -> Shape {
        if self.target.subcloud.is_some() { Shape::One } else { Shape::List }
    }

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        self.target.validate()?;
        registry_needs_local(self.registry_images, self.local_only)?;
        self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = self
            .target
            .form()
            .text_opt("local_only", flag(self.local_only))
            .text_opt("registry_images", flag(self.registry_images))
            .text_opt("sysadmin_password", self.secrets.sysadmin.as_ref())
            .file_opt("backup_values", self.backup_values.as_ref())?;
        client.subcloud_backups.create(form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        match self.shape() {
            Shape::One => detail_record(resource, false),
            _ => basic_record(resource),
        }
    }
}

/// Arguments of `subcloud-backup delete`.
#[derive(Args, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Release whose backups are deleted.
    pub release: String,

    /// Subcloud or group selection.
    #[command(flatten)]
    pub target: Target,

    /// Delete the backup kept on the subcloud.
    #[arg(long)]
    pub local_only: bool,

    /// sysadmin password; prompted when absent and `--local-only` is set.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    /// Skip the confirmation prompt.
    #[arg(long)]
    pub yes: bool,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for DeleteArgs {
    type Resource = ();

    fn shape(&self) -> Shape {
        Shape::Silent
    }

    fn prepare(&mut self, prompt: &mut dyn Prompt, confirm: &Confirmation) -> Result<(), CliError> {
        self.target.validate()?;
        let owner = self
            .target
            .subcloud
            .as_ref()
            .map_or_else(|| format!("group {}", self.target.group.as_deref().unwrap_or_default()), |s| format!("subcloud {s}"));
        confirm.require(prompt, &format!("delete the {} backup of {owner}", self.release), self.yes)?;
        if self.local_only || self.sysadmin_password.is_some() {
            self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        }
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<()>> {
        let request = BackupDeleteRequest {
            subcloud: self.target.subcloud.clone(),
            group: self.target.group.clone(),
            local_only: flag(self.local_only).map(str::to_string),
            sysadmin_password: self.secrets.sysadmin.clone(),
        };
        client.subcloud_backups.delete(&self.release, &request).await?;
        Ok(Vec::new())
    }

    fn format(&self, _resource: Option<&()>) -> Record {
        no_columns()
    }
}

/// Arguments of `subcloud-backup restore`.
#[derive(Args, Debug, Clone, Default)]
pub struct RestoreArgs {
    /// Subcloud or group selection.
    #[command(flatten)]
    pub target: Target,

    /// Reinstall the subcloud before restoring.
    #[arg(long)]
    pub with_install: bool,

    /// Release to install; requires `--with-install`.
    #[arg(long)]
    pub release: Option<String>,

    /// Restore from the backup kept on the subcloud.
    #[arg(long)]
    pub local_only: bool,

    /// Restore the container registry images; requires `--local-only`.
    #[arg(long)]
    pub registry_images: bool,

    /// YAML file overriding the restore playbook values.
    #[arg(long)]
    pub restore_values: Option<PathBuf>,

    /// sysadmin password of the subcloud; prompted when absent.
    #[arg(long)]
    pub sysadmin_password: Option<String>,

    #[arg(skip)]
    secrets: Secrets,
}

impl ResourceCommand for RestoreArgs {
    type Resource = Subcloud;

    fn shape(&self) -> Shape {
        Shape::List
    }

    fn prepare(&mut self, prompt: &mut dyn Prompt, _confirm: &Confirmation) -> Result<(), CliError> {
        self.target.validate()?;
        registry_needs_local(self.registry_images, self.local_only)?;
        if self.release.is_some() && !self.with_install {
            return Err(CliError::invalid("Option --release requires --with-install"));
        }
        self.secrets.sysadmin = Some(password_or_prompt(prompt, self.sysadmin_password.as_deref(), "sysadmin")?);
        Ok(())
    }

    async fn resources<T: Transport>(&self, client: &DcManagerClient<T>) -> dcmanager_client::Result<Vec<Subcloud>> {
        let form = self
            .target
            .form()
            .text_opt("with_install", flag(self.with_install))
            .text_opt("release", self.release.as_ref())
            .text_opt("local_only", flag(self.local_only))
            .text_opt("registry_images", flag(self.registry_images))
            .text_opt("sysadmin_password", self.secrets.sysadmin.as_ref())
            .file_opt("restore_values", self.restore_values.as_ref())?;
        client.subcloud_backups.restore(form).await
    }

    fn format(&self, resource: Option<&Subcloud>) -> Record {
        basic_record(resource)
    }
}

/// Runs a backup subcommand.
pub async fn run<T: Transport>(command: SubcloudBackupCommands, env: &mut Env<'_, T>) -> Result<(), CliError> {
    match command {
        SubcloudBackupCommands::Create(args) => run_command(args, env).await,
        SubcloudBackupCommands::Delete(args) => run_command(args, env).await,
        SubcloudBackupCommands::Restore(args) => run_command(args, env).await,
    }
}

#[cfg(test)]
mod tests {
    use dcmanager_client::{ApiResponse, Body, Method};
    use serde_json::{Value, json};
    use test_case::test_case;

    use super::*;
    use crate::cli::Format;
    use crate::commands::harness::Harness;

    #[test_case(&["create", "--subcloud", "s1", "--group", "g1"] ; "create with both targets")]
    #[test_case(&["create"] ; "create without target")]
    #[test_case(&["create", "--group", "g1", "--registry-images"] ; "registry images without local only")]
    #[test_case(&["delete", "24.09", "--subcloud", "s1", "--group", "g1"] ; "delete with both targets")]
    #[test_case(&["restore", "--subcloud", "s1", "--group", "g1"] ; "restore with both targets")]
    #[test_case(&["restore", "--subcloud", "s1", "--release", "24.09"] ; "release without install")]
    #[tokio::test]
    async fn invalid_targets_fail_before_any_request(args: &[&str]) {
        let mut h = Harness::new();
        let mut argv = vec!["subcloud-backup"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["--sysadmin-password", "pw"]);

        let err = h.run(&argv).await.expect_err("invalid");

        assert!(matches!(err, CliError::InvalidArgument(_)));
        assert_eq!(h.fake().request_count(), 0);
    }

    #[tokio::test]
    async fn create_for_subcloud_shows_one() {
        let mut h = Harness::new();
        h.format = Format::Json;
        h.fake().push_json(json!({"subclouds": [{"id": 1, "name": "s1", "backup-status": "initial"}]}));

        let out = h
            .run(&["subcloud-backup", "create", "--subcloud", "s1", "--sysadmin-password", "pw"])
            .await
            .expect("runs");

        let shown: Value = serde_json::from_str(&out).expect("json");
        assert_eq!(shown["backup_status"], "initial");
        let Body::Multipart(form) = h.fake().last_request().expect("request").body else {
            panic!("expected multipart")
        };
        assert_eq!(form.field("subcloud"), Some("s1"));
        assert_eq!(form.field("sysadmin_password"), Some("cHc="));
    }

    #[tokio::test]
    async fn create_for_group_accepts_partial_success() {
        let mut h = Harness::new();
        h.format = Format::Json;
        h.fake().push(ApiResponse::new(
            207,
            json!({"subclouds": [{"id": 1, "name": "s1"}, {"id": 2, "name": "s2"}]}).to_string(),
        ));

        let out = h
            .run(&["subcloud-backup", "create", "--group", "g1", "--local-only", "--registry-images", "--sysadmin-password", "pw"])
            .await
            .expect("runs");

        let rows: Value = serde_json::from_str(&out).expect("json");
        assert_eq!(rows.as_array().map(Vec::len), Some(2));
        assert_eq!(rows[1]["name"], "s2");
    }

    #[tokio::test]
    async fn delete_local_only_sends_password() {
        let mut h = Harness::new();
        h.fake().push_status(204, "");

        h.run(&["subcloud-backup", "delete", "24.09", "--group", "g1", "--local-only", "--sysadmin-password", "pw"])
            .await
            .expect("runs");

        let sent = h.fake().last_request().expect("request");
        assert_eq!((sent.method, sent.path.as_str()), (Method::Patch, "/subcloud-backup/delete/24.09"));
        assert_eq!(
            sent.body,
            Body::Json(json!({"group": "g1", "local_only": "true", "sysadmin_password": "cHc="}))
        );
    }

    #[tokio::test]
    async fn restore_lists_subclouds() {
        let mut h = Harness::new();
        h.fake().push_json(json!({"subclouds": [{"id": 1, "name": "s1", "deploy-status": "pre-restore"}]}));

        let out = h
            .run(&["subcloud-backup", "restore", "--subcloud", "s1", "--with-install", "--release", "24.09", "--sysadmin-password", "pw"])
            .await
            .expect("runs");

        assert!(out.starts_with("1 s1"));
        let Body::Multipart(form) = h.fake().last_request().expect("request").body else {
            panic!("expected multipart")
        };
        assert_eq!(form.field("with_install"), Some("true"));
        assert_eq!(form.field("release"), Some("24.09"));
    }
}
