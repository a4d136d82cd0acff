//! Identity-service (Keystone v3) password authentication.
//!
//! Issues a project-scoped token and resolves the dcmanager endpoint from the
//! service catalog returned with it.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::base::error_message;
use crate::config::{ClientConfig, PasswordAuth};
use crate::error::{ClientError, Result};
use crate::session::Session;

/// Header carrying the issued token.
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Domain used when neither a domain name nor id is configured.
pub const DEFAULT_DOMAIN: &str = "Default";

#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user: Option<IdRef>,
    #[serde(default)]
    project: Option<IdRef>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    region_id: Option<String>,
    url: String,
}

fn domain(name: Option<&String>, id: Option<&String>) -> Value {
    match (id, name) {
        (Some(id), _) => json!({ "id": id }),
        (None, Some(name)) => json!({ "name": name }),
        (None, None) => json!({ "name": DEFAULT_DOMAIN }),
    }
}

/// Builds the `POST /auth/tokens` request body.
#[must_use]
pub fn token_request(auth: &PasswordAuth) -> Value {
    let project = match &auth.project_id {
        Some(id) => json!({ "id": id }),
        None => json!({
            "name": auth.project_name,
            "domain": domain(auth.project_domain_name.as_ref(), auth.project_domain_id.as_ref()),
        }),
    };

    json!({
        "auth": {
            "identity": {
                "methods": ["password"],
                "password": {
                    "user": {
                        "name": auth.username,
                        "domain": domain(auth.user_domain_name.as_ref(), auth.user_domain_id.as_ref()),
                        "password": auth.password,
                    }
                }
            },
            "scope": { "project": project }
        }
    })
}

/// URL of the token endpoint for a configured auth URL.
#[must_use]
pub fn tokens_url(auth_url: &str) -> String {
    let base = auth_url.trim_end_matches('/');
    if base.ends_with("/v3") {
        format!("{base}/auth/tokens")
    } else {
        format!("{base}/v3/auth/tokens")
    }
}

/// Turns an identity-service token response into a [`Session`].
///
/// The endpoint comes from `config.endpoint_url` when set, otherwise from the
/// catalog entry matching the service type, interface and (optionally) region.
pub fn session_from_token(
    subject_token: String,
    body: &[u8],
    config: &ClientConfig,
    region: Option<&str>,
) -> Result<Session> {
    let envelope: TokenEnvelope = serde_json::from_slice(body)
        .map_err(|e| ClientError::Auth(format!("unexpected token response: {e}")))?;
    let token = envelope.token;

    let endpoint = match &config.endpoint_url {
        Some(url) => url.clone(),
        None => catalog_url(&token.catalog, &config.service_type, config.interface(), region)?,
    };

    Ok(Session {
        token: subject_token,
        endpoint: config.versioned_endpoint(&endpoint),
        project_id: token.project.map(|p| p.id),
        user_id: token.user.map(|u| u.id),
        expires_at: token.expires_at,
    })
}

fn catalog_url(
    catalog: &[CatalogEntry],
    service_type: &str,
    interface: &str,
    region: Option<&str>,
) -> Result<String> {
    catalog
        .iter()
        .filter(|entry| entry.service_type == service_type)
        .flat_map(|entry| entry.endpoints.iter())
        .find(|endpoint| {
            endpoint.interface == interface
                && region.is_none_or(|r| {
                    endpoint.region.as_deref() == Some(r) || endpoint.region_id.as_deref() == Some(r)
                })
        })
        .map(|endpoint| endpoint.url.clone())
        .ok_or_else(|| {
            ClientError::Auth(format!(
                "no '{service_type}' endpoint with interface '{interface}'{} found in the service catalog",
                region.map(|r| format!(" in region '{r}'")).unwrap_or_default()
            ))
        })
}

/// Authenticates with a password and resolves the dcmanager endpoint.
pub async fn authenticate(
    http: &reqwest::Client,
    config: &ClientConfig,
    auth: &PasswordAuth,
) -> Result<Session> {
    let url = tokens_url(&auth.auth_url);
    debug!(url = %url, username = %auth.username, "requesting identity token");

    let response = http.post(&url).json(&token_request(auth)).send().await?;
    let status = response.status().as_u16();
    let subject_token = response
        .headers()
        .get(SUBJECT_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?;

    if status != 201 && status != 200 {
        return Err(ClientError::Auth(format!(
            "identity service returned HTTP {status}: {}",
            error_message(status, &body)
        )));
    }

    let subject_token = subject_token.ok_or_else(|| {
        ClientError::Auth(format!("identity response is missing the {SUBJECT_TOKEN_HEADER} header"))
    })?;

    session_from_token(subject_token, &body, config, auth.region_name.as_deref())
}
