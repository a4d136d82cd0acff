//! Client library for the distributed cloud manager (dcmanager) REST API.
//!
//! The dcmanager service manages subclouds (remote edge clusters) from a
//! central system controller. This crate provides:
//! - a [`Transport`] seam with a `reqwest` implementation ([`HttpClient`])
//! - token or identity-service password authentication, with an optional
//!   on-disk session cache
//! - typed managers for every API resource, grouped in [`DcManagerClient`]
//!
//! # Example
//!
//! ```no_run
//! use dcmanager_client::{AuthMode, ClientConfig, DcManagerClient, HttpClient};
//!
//! # async fn run() -> dcmanager_client::Result<()> {
//! let mut config = ClientConfig::new(AuthMode::Token {
//!     token: "gAAAAAB...".into(),
//!     project_id: None,
//!     user_id: None,
//! });
//! config.endpoint_url = Some("http://192.168.204.1:8119".into());
//!
//! let client = DcManagerClient::new(HttpClient::new(config)?);
//! for subcloud in client.subclouds.list().await? {
//!     println!("{} {:?}", subcloud.name, subcloud.availability_status);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod base;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod profiler;
pub mod session;
pub mod transport;
pub mod utils;
pub mod v1;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{AuthMode, ClientConfig, PasswordAuth, TlsConfig};
pub use error::{ClientError, Result};
pub use http::HttpClient;
pub use session::{Session, SessionCache};
pub use transport::{ApiRequest, ApiResponse, Body, Form, Method, Transport};
pub use v1::DcManagerClient;
