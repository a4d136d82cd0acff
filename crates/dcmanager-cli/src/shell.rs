//! Builds the API client from the global options and runs one command.

use std::io;
use std::time::Duration;

use dcmanager_client::{AuthMode, ClientConfig, DcManagerClient, HttpClient, PasswordAuth, SessionCache, TlsConfig};
use tracing::{debug, info};

use crate::cli::{Cli, GlobalArgs};
use crate::commands::{Env, dispatch};
use crate::error::CliError;
use crate::output::OutputFormat;
use crate::prompt::{Confirmation, StdinPrompt};

/// Legacy names of the project variables.
const TENANT_NAME_ENV: &str = "OS_TENANT_NAME";
const TENANT_ID_ENV: &str = "OS_TENANT_ID";

fn missing(what: &str, flag: &str, var: &str) -> CliError {
    CliError::Config(format!("You must provide {what} via either --{flag} or via env[{var}]"))
}

/// Resolves the authentication mode. `lookup` reads environment variables
/// not covered by a flag.
///
/// A token skips the credential checks but needs an explicit dcmanager URL.
pub fn auth_mode(global: &GlobalArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<AuthMode, CliError> {
    if let Some(token) = &global.os_auth_token {
        if global.dcmanager_url.is_none() {
            return Err(CliError::Config(
                "A token needs an endpoint: provide --dcmanager-url or env[DCMANAGER_URL]".to_string(),
            ));
        }
        return Ok(AuthMode::Token {
            token: token.clone(),
            project_id: global.os_project_id.clone(),
            user_id: global.os_user_id.clone(),
        });
    }

    let username = global
        .os_username
        .clone()
        .ok_or_else(|| missing("a username", "os-username", "OS_USERNAME"))?;
    let password = global
        .os_password
        .clone()
        .ok_or_else(|| missing("a password", "os-password", "OS_PASSWORD"))?;
    let auth_url = global
        .os_auth_url
        .clone()
        .ok_or_else(|| missing("an auth url", "os-auth-url", "OS_AUTH_URL"))?;
    let project_name = global.os_project_name.clone().or_else(|| lookup(TENANT_NAME_ENV));
    let project_id = global.os_project_id.clone().or_else(|| lookup(TENANT_ID_ENV));
    if project_name.is_none() && project_id.is_none() {
        return Err(missing("a project name or id", "os-project-name", "OS_PROJECT_NAME"));
    }

    Ok(AuthMode::Password(PasswordAuth {
        auth_url,
        username,
        password,
        project_name,
        project_id,
        user_domain_name: global.os_user_domain_name.clone(),
        user_domain_id: global.os_user_domain_id.clone(),
        project_domain_name: global.os_project_domain_name.clone(),
        project_domain_id: global.os_project_domain_id.clone(),
        region_name: global.os_region_name.clone(),
    }))
}

/// Translates the global options into a client configuration.
pub fn client_config(global: &GlobalArgs, lookup: impl Fn(&str) -> Option<String>) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::new(auth_mode(global, lookup)?);
    config.endpoint_url.clone_from(&global.dcmanager_url);
    config.api_version.clone_from(&global.dcmanager_api_version);
    config.service_type.clone_from(&global.dcmanager_service_type);
    config.endpoint_type.clone_from(&global.os_endpoint_type);
    config.tls = TlsConfig {
        ca_cert: global.os_cacert.clone(),
        client_cert: global.os_cert.clone(),
        client_key: global.os_key.clone(),
        insecure: global.insecure,
    };
    if global.os_cache {
        config.session_cache = SessionCache::default_path();
        if config.session_cache.is_none() {
            debug!("no cache directory on this platform, session caching disabled");
        }
    }
    config.profile_key.clone_from(&global.profile);
    Ok(config)
}

/// Runs a parsed command line against the live API.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = client_config(&cli.global, |var| std::env::var(var).ok())?;
    let transport = HttpClient::new(config)?;
    let trace_id = transport.profiler().map(|p| p.trace_id());
    let client = DcManagerClient::new(transport);

    let mut stdout = io::stdout().lock();
    let mut prompt = StdinPrompt;
    let mut env = Env {
        client: &client,
        out: &mut stdout,
        output: OutputFormat::new(cli.global.format),
        prompt: &mut prompt,
        confirm: Confirmation::from_env(Duration::from_secs(cli.global.confirmation_timeout)),
    };
    let result = dispatch(cli.command, &mut env).await;

    if let Some(trace_id) = trace_id {
        info!(%trace_id, "request profiling finished");
        eprintln!("Trace ID: {trace_id}");
        eprintln!("To display the trace use: osprofiler trace show --html {trace_id}");
    }
    result
}
