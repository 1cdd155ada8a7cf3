//! CLI argument definitions using clap
//!
//! - hookline run               # Resolve and execute a phase
//! - hookline plan              # Show what a phase would run
//! - hookline check             # Validate hook declarations

use clap::{Args, Parser, Subcommand, ValueEnum};
use hookline_core::hooks::HookWhen;
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration file name used across all CLI commands.
pub const DEFAULT_CONFIG_FILE: &str = "hookline.yml";

#[derive(Parser)]
#[command(name = "hookline")]
#[command(about = "Hookline - lifecycle hook runner for release pipelines")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (.yml, .yaml, .toml or .json)
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE, env = "HOOKLINE_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve and execute the hooks of a phase
    Run {
        #[command(flatten)]
        phase: PhaseArgs,

        /// Default timeout per invocation (e.g. "30s", "2m")
        #[arg(long, value_parser = humantime::parse_duration)]
        timeout: Option<Duration>,

        /// Log what would run without executing anything
        #[arg(long)]
        dry_run: bool,

        /// Print the phase report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the disposition of every matrix cell without executing
    Plan {
        #[command(flatten)]
        phase: PhaseArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate hook declarations
    Check,
}

/// Selection of the phase and the context it runs in
#[derive(Args, Debug, Clone)]
pub struct PhaseArgs {
    /// Lifecycle point to run
    #[arg(long, value_enum, default_value = "before")]
    pub when: WhenArg,

    /// Step name, used in the phase label
    #[arg(long, default_value = "release")]
    pub step: String,

    /// Platform identifier (defaults to the host, e.g. linux-x86_64)
    #[arg(long)]
    pub platform: Option<String>,

    /// Extra binding, may be repeated
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_binding)]
    pub bindings: Vec<(String, String)>,

    /// Run as a snapshot (non-release) build
    #[arg(long)]
    pub snapshot: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenArg {
    Before,
    Success,
    Failure,
}

impl From<WhenArg> for HookWhen {
    fn from(when: WhenArg) -> Self {
        match when {
            WhenArg::Before => HookWhen::Before,
            WhenArg::Success => HookWhen::Success,
            WhenArg::Failure => HookWhen::Failure,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Parse a `KEY=VALUE` binding
fn parse_binding(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}
