//! Command routing logic for CLI

use anyhow::Result;
use std::process::ExitCode;

use crate::args::{Cli, Commands};
use crate::commands;
use crate::commands::run::RunOptions;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Run {
            phase,
            timeout,
            dry_run,
            json,
        } => {
            let succeeded = commands::run::execute(RunOptions {
                config_file: &cli.config,
                phase,
                timeout: *timeout,
                dry_run: *dry_run,
                json: *json,
                verbose: cli.verbose,
            })
            .await?;
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Plan { phase, json } => {
            commands::plan::execute(&cli.config, phase, *json, cli.verbose).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            commands::check::execute(&cli.config, cli.verbose).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
