//! Request/response model and the transport seam.
//!
//! Managers never talk to `reqwest` directly. They build an [`ApiRequest`],
//! hand it to a [`Transport`] and interpret the [`ApiResponse`]. The
//! production transport is [`crate::http::HttpClient`]; tests use a recording
//! fake.

use std::fmt;
use std::future::Future;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, Result};

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One file attached to a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// File contents.
    pub contents: Vec<u8>,
}

/// A `multipart/form-data` body mixing text fields and file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl Form {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds a text field when a value is present.
    #[must_use]
    pub fn text_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Reads a local file and attaches it under `field`.
    pub fn file(mut self, field: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path).map_err(|e| {
            ClientError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read '{}': {e}", path.display()),
            ))
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.files.push(FilePart {
            field: field.into(),
            file_name,
            contents,
        });
        Ok(self)
    }

    /// Attaches a file when a path is present.
    pub fn file_opt(self, field: impl Into<String>, path: Option<impl AsRef<Path>>) -> Result<Self> {
        match path {
            Some(path) => self.file(field, path),
            None => Ok(self),
        }
    }

    /// Text fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Looks up a text field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attached files in insertion order.
    #[must_use]
    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// True when neither fields nor files were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Splits the form into its text fields and files.
    #[must_use]
    pub fn into_parts(self) -> (Vec<(String, String)>, Vec<FilePart>) {
        (self.fields, self.files)
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body.
    Empty,
    /// JSON document.
    Json(Value),
    /// Multipart form.
    Multipart(Form),
}

impl Body {
    /// Serializes a payload into a JSON body.
    pub fn json<T: Serialize>(payload: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(payload)?))
    }
}

/// A request relative to the versioned API endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: Method,
    /// Path below the versioned endpoint, starting with `/`. May carry a query.
    pub path: String,
    /// Body to send.
    pub body: Body,
}

impl ApiRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: Body::Empty,
        }
    }

    /// Attaches a body.
    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

/// Raw response as seen by the managers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Builds a response from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Builds a 200 response carrying a JSON document.
    #[must_use]
    pub fn json(value: &Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Parses the body as JSON; an empty body yields `Value::Null`.
    pub fn json_body(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends requests to the dcmanager API.
pub trait Transport: Send + Sync {
    /// Sends one request and returns the raw response.
    ///
    /// Non-2xx statuses are returned as responses, not errors; only delivery
    /// failures are errors here.
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<ApiResponse>> + Send;

    /// Drops any cached credentials and authenticates again.
    fn reauthenticate(&self) -> impl Future<Output = Result<()>> + Send;
}
