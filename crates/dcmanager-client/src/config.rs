//! Client configuration.
//!
//! Everything needed to reach and authenticate against the dcmanager API:
//! - how to authenticate (pre-issued token or identity-service password)
//! - where the API lives (explicit URL or service-catalog discovery)
//! - TLS material
//! - session caching and request profiling

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, Result};

/// Default API version appended to the endpoint.
pub const DEFAULT_API_VERSION: &str = "v1.0";

/// Default service type looked up in the service catalog.
pub const DEFAULT_SERVICE_TYPE: &str = "dcmanager";

/// Default catalog interface.
pub const DEFAULT_ENDPOINT_TYPE: &str = "internalURL";

/// Default per-request timeout. Generous because uploads carry deploy artifacts.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Identity-service password credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordAuth {
    /// Identity service URL, e.g. `http://192.168.204.1:5000/v3`.
    pub auth_url: String,
    /// User name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
    /// Project name to scope the token to.
    pub project_name: Option<String>,
    /// Project id to scope the token to.
    pub project_id: Option<String>,
    /// User domain name.
    pub user_domain_name: Option<String>,
    /// User domain id.
    pub user_domain_id: Option<String>,
    /// Project domain name.
    pub project_domain_name: Option<String>,
    /// Project domain id.
    pub project_domain_id: Option<String>,
    /// Region used to pick the catalog endpoint.
    pub region_name: Option<String>,
}

/// How requests are authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// A token issued out-of-band. Cannot be refreshed.
    Token {
        /// Token sent as `X-Auth-Token`.
        token: String,
        /// Sent as `X-Project-Id` when present.
        project_id: Option<String>,
        /// Sent as `X-User-Id` when present.
        user_id: Option<String>,
    },
    /// Authenticate against the identity service.
    Password(PasswordAuth),
}

impl AuthMode {
    /// User name used to key the session cache.
    #[must_use]
    pub fn cache_key(&self) -> Option<&str> {
        match self {
            Self::Token { .. } => None,
            Self::Password(auth) => Some(auth.username.as_str()),
        }
    }
}

/// TLS options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Extra CA bundle (PEM).
    pub ca_cert: Option<PathBuf>,
    /// Client certificate (PEM).
    pub client_cert: Option<PathBuf>,
    /// Client private key (PKCS#8 PEM).
    pub client_key: Option<PathBuf>,
    /// Skip server certificate verification.
    pub insecure: bool,
}

/// Full client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Authentication mode.
    pub auth: AuthMode,
    /// Explicit dcmanager URL; skips catalog discovery.
    pub endpoint_url: Option<String>,
    /// API version path segment.
    pub api_version: String,
    /// Catalog service type.
    pub service_type: String,
    /// Catalog interface (`publicURL`, `internalURL`, `adminURL` or bare names).
    pub endpoint_type: String,
    /// TLS options.
    pub tls: TlsConfig,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Session cache file; `None` disables caching.
    pub session_cache: Option<PathBuf>,
    /// HMAC key enabling profiler trace headers.
    pub profile_key: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything but auth.
    #[must_use]
    pub fn new(auth: AuthMode) -> Self {
        Self {
            auth,
            endpoint_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            endpoint_type: DEFAULT_ENDPOINT_TYPE.to_string(),
            tls: TlsConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_cache: None,
            profile_key: None,
        }
    }

    /// Catalog interface name without the legacy `URL` suffix.
    #[must_use]
    pub fn interface(&self) -> &str {
        self.endpoint_type
            .strip_suffix("URL")
            .unwrap_or(&self.endpoint_type)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.api_version.trim().is_empty() {
            return Err(ClientError::Config("api version cannot be empty".to_string()));
        }

        if let Some(url) = &self.endpoint_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ClientError::Config(format!(
                    "invalid dcmanager URL: {url}, must start with http:// or https://"
                )));
            }
        }

        match self.interface() {
            "public" | "internal" | "admin" => {}
            other => {
                return Err(ClientError::Config(format!(
                    "invalid endpoint type: {other}, expected public, internal or admin"
                )));
            }
        }

        match &self.auth {
            AuthMode::Token { token, .. } => {
                if token.is_empty() {
                    return Err(ClientError::Config("auth token cannot be empty".to_string()));
                }
                if self.endpoint_url.is_none() {
                    return Err(ClientError::Config(
                        "a dcmanager URL is required when authenticating with a token".to_string(),
                    ));
                }
            }
            AuthMode::Password(auth) => {
                if !auth.auth_url.starts_with("http://") && !auth.auth_url.starts_with("https://") {
                    return Err(ClientError::Config(format!(
                        "invalid auth URL: {}, must start with http:// or https://",
                        auth.auth_url
                    )));
                }
                if auth.project_name.is_none() && auth.project_id.is_none() {
                    return Err(ClientError::Config(
                        "a project name or project id is required".to_string(),
                    ));
                }
            }
        }

        if self.tls.client_cert.is_some() != self.tls.client_key.is_some() {
            return Err(ClientError::Config(
                "client certificate and key must be provided together".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Joins a discovered or configured endpoint with the API version.
    #[must_use]
    pub fn versioned_endpoint(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        if base.ends_with(&format!("/{version}")) {
            base.to_string()
        } else {
            format!("{base}/{version}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn password_config() -> ClientConfig {
        ClientConfig::new(AuthMode::Password(PasswordAuth {
            auth_url: "http://192.168.204.1:5000/v3".into(),
            username: "admin".into(),
            password: "secret".into(),
            project_name: Some("admin".into()),
            ..PasswordAuth::default()
        }))
    }

    fn token_config() -> ClientConfig {
        let mut config = ClientConfig::new(AuthMode::Token {
            token: "gAAAAAB".into(),
            project_id: None,
            user_id: None,
        });
        config.endpoint_url = Some("http://192.168.204.1:8119".into());
        config
    }

    #[test]
    fn defaults_are_valid() {
        let config = password_config();
        assert_eq!(config.api_version, "v1.0");
        assert_eq!(config.service_type, "dcmanager");
        assert_eq!(config.interface(), "internal");
        config.validate().expect("valid");
        token_config().validate().expect("valid");
    }

    #[test]
    fn token_mode_requires_url() {
        let mut config = token_config();
        config.endpoint_url = None;
        let err = config.validate().expect_err("missing url");
        assert!(err.to_string().contains("dcmanager URL is required"));
    }

    #[test]
    fn rejects_non_http_url() {
        let mut config = token_config();
        config.endpoint_url = Some("ws://controller:8119".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_interface() {
        let mut config = password_config();
        config.endpoint_type = "privateURL".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn password_mode_requires_project() {
        let mut config = password_config();
        if let AuthMode::Password(auth) = &mut config.auth {
            auth.project_name = None;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn client_cert_needs_key() {
        let mut config = token_config();
        config.tls.client_cert = Some("/etc/ssl/client.pem".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn versioned_endpoint_appends_once() {
        let config = token_config();
        assert_eq!(
            config.versioned_endpoint("http://10.0.0.1:8119"),
            "http://10.0.0.1:8119/v1.0"
        );
        assert_eq!(
            config.versioned_endpoint("http://10.0.0.1:8119/v1.0/"),
            "http://10.0.0.1:8119/v1.0"
        );
    }
}
