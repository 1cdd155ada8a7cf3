//! Hookline CLI application
//!
//! Runs the lifecycle hooks declared in a configuration file.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/hookline-cli
//! ```
//!
//! # Commands
//!
//! - `hookline run --when before --step release` resolves the phase and
//!   executes every invocation; exits with status 1 unless the phase succeeded.
//! - `hookline plan` prints the disposition of every matrix cell.
//! - `hookline check` validates the configuration file.
//!
//! Set `RUST_LOG=debug` (or pass `--verbose`) for detailed logging.

mod args;
mod commands;
mod config;
mod console;
mod executor_factory;
mod router;
mod signal_handler;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use args::{Cli, LogFormat};
use console::CliConsole;

fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match router::route(cli).await {
        Ok(code) => code,
        Err(err) => {
            CliConsole::new(true).error(&format!("{:#}", err));
            ExitCode::from(2)
        }
    }
}
