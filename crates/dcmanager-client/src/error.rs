//! Error types for the dcmanager client library.

use thiserror::Error;

/// Result alias used throughout the client library.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by the client library.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with an unexpected status code.
    #[error("{message} (HTTP {code})")]
    Api {
        /// HTTP status code returned by the server.
        code: u16,
        /// Best-effort message extracted from the response body.
        message: String,
    },

    /// The request could not be delivered or the response not read.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Authentication against the identity service failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A response body could not be decoded into the expected resource.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The client was configured inconsistently.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local file access failed (multipart uploads, session cache).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Returns the HTTP status code for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True when the server rejected the request's credentials (401/403).
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { code: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
