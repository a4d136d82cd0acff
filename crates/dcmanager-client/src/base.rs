//! Shared request/response handling for the resource managers.
//!
//! Every manager call is one request: check the status against the accepted
//! codes, turn failures into [`ClientError::Api`] with a readable message, and
//! unwrap the JSON body into zero or more typed resources.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::transport::{ApiRequest, ApiResponse, Body, Method, Transport};

/// Status codes accepted by plain reads and writes.
pub const OK: &[u16] = &[200];

/// Status codes accepted by deletes.
pub const DELETED: &[u16] = &[200, 204];

/// Message used when the server fails without saying why.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "An internal server error occurred. Check the dcmanager logs for details";

static HEAD: Lazy<Regex> = Lazy::new(|| build_regex(r"(?is)<head\b.*?</head>"));
static BREAK: Lazy<Regex> = Lazy::new(|| build_regex(r"(?i)<br\s*/?>"));
static BLOCK_END: Lazy<Regex> =
    Lazy::new(|| build_regex(r"(?i)</(p|div|h[1-6]|title|li|tr|pre)>"));
static TAG: Lazy<Regex> = Lazy::new(|| build_regex(r"(?s)<[^>]*>"));

#[allow(clippy::expect_used)] // patterns are literals covered by tests
fn build_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

/// Deserializes one resource from a JSON object.
///
/// Keys without a field are ignored. Missing required fields fail here.
pub fn from_payload<R: DeserializeOwned>(payload: &Value) -> Result<R> {
    R::deserialize(payload).map_err(|e| {
        ClientError::Decode(format!(
            "cannot build {} from payload: {e}",
            short_type_name::<R>()
        ))
    })
}

fn short_type_name<R>() -> &'static str {
    let name = std::any::type_name::<R>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Unwraps a response document into resources.
///
/// The collection `key` is used when present; a bare object is a single
/// resource; `null` yields nothing.
pub fn resources_from<R: DeserializeOwned>(document: &Value, key: Option<&str>) -> Result<Vec<R>> {
    let inner = match (document, key) {
        (Value::Object(map), Some(key)) => map.get(key).unwrap_or(document),
        _ => document,
    };

    match inner {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(from_payload).collect(),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        other => Ok(vec![from_payload(other)?]),
    }
}

/// Builds the message for a failed response. Never empty.
#[must_use]
pub fn error_message(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();

    if trimmed.is_empty() {
        if status == 500 {
            return INTERNAL_ERROR_MESSAGE.to_string();
        }
        return canonical_reason(status);
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        for key in ["faultstring", "error_message", "message"] {
            if let Some(message) = map.get(key).and_then(json_message) {
                return message;
            }
        }
    }

    html_message(trimmed).unwrap_or_else(|| trimmed.to_string())
}

fn json_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        // Some services nest the message one level deeper.
        Value::Object(inner) => inner.get("message").and_then(json_message),
        _ => None,
    }
}

fn canonical_reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map_or_else(|| format!("HTTP error {status}"), str::to_string)
}

/// Extracts "explanation\ndetails" from an HTML error page.
fn html_message(body: &str) -> Option<String> {
    let without_head = HEAD.replace_all(body, "");
    let with_breaks = BREAK.replace_all(&without_head, "\n");
    let with_blocks = BLOCK_END.replace_all(&with_breaks, "\n");
    let stripped = TAG.replace_all(&with_blocks, "");
    let text = unescape(&stripped);

    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let explanation = lines.next()?;
    let details: Vec<&str> = lines.collect();
    if details.is_empty() {
        Some(explanation.to_string())
    } else {
        Some(format!("{explanation}\n{}", details.join("\n")))
    }
}

fn unescape(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Fails with [`ClientError::Api`] unless `response` carries an accepted status.
pub fn check_status(response: &ApiResponse, accepted: &[u16]) -> Result<()> {
    if accepted.contains(&response.status) {
        return Ok(());
    }
    Err(ClientError::Api {
        code: response.status,
        message: error_message(response.status, &response.body),
    })
}

/// Request helper shared by every manager.
#[derive(Debug)]
pub struct ResourceManager<T> {
    transport: Arc<T>,
}

impl<T> Clone for ResourceManager<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> ResourceManager<T> {
    /// Creates a helper over a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Sends `request` and returns its parsed JSON body.
    pub async fn call(&self, request: ApiRequest, accepted: &[u16]) -> Result<Value> {
        let method = request.method;
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        debug!(%method, %path, status = response.status, "dcmanager response");
        check_status(&response, accepted)?;
        response.json_body()
    }

    /// Sends `request` and unwraps the resources it returns.
    pub async fn fetch<R: DeserializeOwned>(
        &self,
        request: ApiRequest,
        accepted: &[u16],
        key: Option<&str>,
    ) -> Result<Vec<R>> {
        let document = self.call(request, accepted).await?;
        resources_from(&document, key)
    }

    /// `GET path`.
    pub async fn list<R: DeserializeOwned>(&self, path: &str, key: Option<&str>) -> Result<Vec<R>> {
        self.fetch(ApiRequest::new(Method::Get, path), OK, key).await
    }

    /// `POST path` with a body.
    pub async fn create<R: DeserializeOwned>(
        &self,
        path: &str,
        body: Body,
        key: Option<&str>,
    ) -> Result<Vec<R>> {
        self.fetch(ApiRequest::new(Method::Post, path).with_body(body), OK, key)
            .await
    }

    /// `PATCH path` with a body.
    pub async fn update<R: DeserializeOwned>(
        &self,
        path: &str,
        body: Body,
        key: Option<&str>,
    ) -> Result<Vec<R>> {
        self.fetch(ApiRequest::new(Method::Patch, path).with_body(body), OK, key)
            .await
    }

    /// `DELETE path`; any body is discarded.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.call(ApiRequest::new(Method::Delete, path), DELETED).await?;
        Ok(())
    }
}
