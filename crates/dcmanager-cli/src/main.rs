//! `dcmanager` binary entrypoint.

use std::fs::OpenOptions;
use std::io;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use dcmanager_cli::cli::{Cli, GlobalArgs};
use dcmanager_cli::shell;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.global) {
        eprintln!("Failed to open log file: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(shell::run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn default_level(global: &GlobalArgs) -> &'static str {
    if global.debug || global.verbose >= 2 {
        "debug"
    } else if global.verbose == 1 {
        "info"
    } else {
        "warn"
    }
}

fn init_tracing(global: &GlobalArgs) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(global)));

    let writer = match &global.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(global.log_file.is_none())
        .init();
    Ok(())
}
