//! # dcmanager-cli
//!
//! Command-line interface of the distributed cloud manager.
//!
//! Provides commands for:
//! - Subcloud lifecycle, phased deployment, backup and prestaging
//! - Subcloud groups, peer groups, system peers and their associations
//! - Software update orchestration strategies and their steps
//! - Alarm summaries
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐   clap    ┌──────────┐  ResourceCommand  ┌─────────────────┐
//! │ dcmanager  │──────────►│ commands │──────────────────►│ dcmanager-client │
//! └────────────┘           └──────────┘                   └─────────────────┘
//!                               │ Record
//!                               ▼
//!                           output (table | json | value)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod prompt;
pub mod shell;

pub use cli::{Cli, Commands, Format, GlobalArgs};
pub use error::CliError;
pub use output::OutputFormat;
