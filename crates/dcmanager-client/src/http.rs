//! `reqwest`-backed [`Transport`].

use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::multipart;
use tracing::{debug, info, warn};

use crate::config::{AuthMode, ClientConfig, PasswordAuth, TlsConfig};
use crate::error::{ClientError, Result};
use crate::identity;
use crate::profiler::Profiler;
use crate::session::{Session, SessionCache};
use crate::transport::{ApiRequest, ApiResponse, Body, Form, Method, Transport};

/// Header carrying the token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Header carrying the project id.
pub const PROJECT_ID_HEADER: &str = "X-Project-Id";
/// Header carrying the user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// HTTP transport with lazy authentication.
///
/// The first request resolves a [`Session`] (from the token in the config,
/// the session cache, or the identity service) and reuses it afterwards.
#[derive(Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    config: ClientConfig,
    cache: Option<SessionCache>,
    profiler: Option<Profiler>,
    session: RwLock<Option<Session>>,
}

impl HttpClient {
    /// Validates `config` and builds the underlying HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = build_http(&config)?;
        let cache = config.session_cache.as_ref().map(SessionCache::new);
        let profiler = config.profile_key.as_ref().map(Profiler::new);
        if let Some(profiler) = &profiler {
            info!(trace_id = %profiler.trace_id(), "profiling enabled");
        }
        Ok(Self {
            http,
            config,
            cache,
            profiler,
            session: RwLock::new(None),
        })
    }

    /// Configuration the client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Active profiler, when a profiling key was configured.
    #[must_use]
    pub const fn profiler(&self) -> Option<&Profiler> {
        self.profiler.as_ref()
    }

    fn current(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn replace(&self, session: Option<Session>) {
        *self.session.write() = session;
    }

    async fn session(&self) -> Result<Session> {
        if let Some(session) = self.current() {
            return Ok(session);
        }
        let session = self.resolve(true).await?;
        self.replace(Some(session.clone()));
        Ok(session)
    }

    async fn resolve(&self, use_cache: bool) -> Result<Session> {
        match &self.config.auth {
            AuthMode::Token {
                token,
                project_id,
                user_id,
            } => {
                let url = self.config.endpoint_url.as_deref().ok_or_else(|| {
                    ClientError::Config("a dcmanager URL is required with a token".to_string())
                })?;
                Ok(Session {
                    token: token.clone(),
                    endpoint: self.config.versioned_endpoint(url),
                    project_id: project_id.clone(),
                    user_id: user_id.clone(),
                    expires_at: None,
                })
            }
            AuthMode::Password(auth) => {
                if use_cache {
                    if let Some(session) = self.cached(auth) {
                        return Ok(session);
                    }
                }
                let session = identity::authenticate(&self.http, &self.config, auth).await?;
                debug!(endpoint = %session.endpoint, "authenticated");
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store(&auth.username, &session) {
                        warn!(path = %cache.path().display(), error = %e, "failed to write session cache");
                    }
                }
                Ok(session)
            }
        }
    }

    fn cached(&self, auth: &PasswordAuth) -> Option<Session> {
        let mut session = self.cache.as_ref()?.load(&auth.username)?;
        // An explicit URL always wins over whatever was discovered earlier.
        if let Some(url) = &self.config.endpoint_url {
            session.endpoint = self.config.versioned_endpoint(url);
        }
        Some(session)
    }
}

impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let session = self.session().await?;
        let url = format!("{}{}", session.endpoint, request.path);
        debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self
            .http
            .request(reqwest_method(request.method), &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(AUTH_TOKEN_HEADER, &session.token);
        if let Some(project_id) = &session.project_id {
            builder = builder.header(PROJECT_ID_HEADER, project_id);
        }
        if let Some(user_id) = &session.user_id {
            builder = builder.header(USER_ID_HEADER, user_id);
        }
        if let Some(profiler) = &self.profiler {
            for (name, value) in profiler.headers()? {
                builder = builder.header(name, value);
            }
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Multipart(form) => builder.multipart(multipart_form(form)),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!(status, bytes = body.len(), "received response");
        Ok(ApiResponse::new(status, body))
    }

    async fn reauthenticate(&self) -> Result<()> {
        let AuthMode::Password(auth) = &self.config.auth else {
            return Err(ClientError::Auth(
                "the supplied token was rejected and cannot be refreshed".to_string(),
            ));
        };
        info!(username = %auth.username, "re-authenticating");
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate(&auth.username) {
                warn!(error = %e, "failed to invalidate session cache");
            }
        }
        self.replace(None);
        let session = self.resolve(false).await?;
        self.replace(Some(session));
        Ok(())
    }
}

const fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn multipart_form(form: Form) -> multipart::Form {
    let (fields, files) = form.into_parts();
    let mut out = multipart::Form::new();
    for (name, value) in fields {
        out = out.text(name, value);
    }
    for file in files {
        out = out.part(
            file.field,
            multipart::Part::bytes(file.contents).file_name(file.file_name),
        );
    }
    out
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        ClientError::Config(format!("cannot read {what} '{}': {e}", path.display()))
    })
}

fn build_http(config: &ClientConfig) -> Result<reqwest::Client> {
    let TlsConfig {
        ca_cert,
        client_cert,
        client_key,
        insecure,
    } = &config.tls;

    let mut builder = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("dcmanager-client/", env!("CARGO_PKG_VERSION")));

    if let Some(path) = ca_cert {
        let cert = reqwest::Certificate::from_pem(&read_pem(path, "CA bundle")?)
            .map_err(|e| ClientError::Config(format!("invalid CA bundle: {e}")))?;
        builder = builder.add_root_certificate(cert);
    }

    if let (Some(cert), Some(key)) = (client_cert, client_key) {
        let identity = reqwest::Identity::from_pkcs8_pem(
            &read_pem(cert, "client certificate")?,
            &read_pem(key, "client key")?,
        )
        .map_err(|e| ClientError::Config(format!("invalid client certificate: {e}")))?;
        builder = builder.identity(identity);
    }

    if *insecure {
        warn!("TLS certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_config() -> ClientConfig {
        let mut config = ClientConfig::new(AuthMode::Token {
            token: "gAAAAAB".into(),
            project_id: Some("p-1".into()),
            user_id: None,
        });
        config.endpoint_url = Some("http://192.168.204.1:8119".into());
        config
    }

    #[tokio::test]
    async fn token_mode_session_uses_configured_url() {
        let client = HttpClient::new(token_config()).expect("client");
        let session = client.session().await.expect("session");
        assert_eq!(session.endpoint, "http://192.168.204.1:8119/v1.0");
        assert_eq!(session.token, "gAAAAAB");
        assert_eq!(session.project_id.as_deref(), Some("p-1"));
    }

    #[tokio::test]
    async fn token_mode_cannot_reauthenticate() {
        let client = HttpClient::new(token_config()).expect("client");
        let err = client.reauthenticate().await.expect_err("token mode");
        assert!(matches!(err, ClientError::Auth(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = token_config();
        config.endpoint_url = None;
        assert!(HttpClient::new(config).is_err());
    }

    #[test]
    fn missing_ca_bundle_is_config_error() {
        let mut config = token_config();
        config.tls.ca_cert = Some("/nonexistent/ca.pem".into());
        let err = HttpClient::new(config).expect_err("missing bundle");
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn cached_session_respects_explicit_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_path = dir.path().join("sessions.json");
        let auth = PasswordAuth {
            auth_url: "http://192.168.204.1:5000/v3".into(),
            username: "admin".into(),
            password: "secret".into(),
            project_name: Some("admin".into()),
            ..PasswordAuth::default()
        };
        SessionCache::new(&cache_path)
            .store(
                "admin",
                &Session {
                    token: "cached".into(),
                    endpoint: "http://old:8119/v1.0".into(),
                    project_id: None,
                    user_id: None,
                    expires_at: Some(chrono::Utc::now() + chrono::TimeDelta::hours(2)),
                },
            )
            .expect("store");

        let mut config = ClientConfig::new(AuthMode::Password(auth.clone()));
        config.session_cache = Some(cache_path);
        config.endpoint_url = Some("https://new:8119".into());
        let client = HttpClient::new(config).expect("client");

        let session = client.cached(&auth).expect("cached");
        assert_eq!(session.token, "cached");
        assert_eq!(session.endpoint, "https://new:8119/v1.0");
    }
}
