//! Phase execution command

use anyhow::Result;
use hookline_core::hooks::{ExecutionCoordinator, Phase};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::args::PhaseArgs;
use crate::config::load_from_file;
use crate::console::CliConsole;
use crate::executor_factory::create_executor;
use crate::signal_handler::SignalHandler;

/// Options of `hookline run`
pub struct RunOptions<'a> {
    pub config_file: &'a Path,
    pub phase: &'a PhaseArgs,
    pub timeout: Option<Duration>,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
}

/// Run the hooks of a phase, returning whether the phase succeeded
pub async fn execute(options: RunOptions<'_>) -> Result<bool> {
    let console = CliConsole::new(options.verbose);
    let config = load_from_file(options.config_file)?;
    let phase = Phase::new(options.phase.when.into(), &options.phase.step);
    config.validate_phase(phase.when)?;

    let context = config.context(options.phase);
    console.info(&format!(
        "Platform {} ({} hook(s) declared for {})",
        context.current_platform,
        config.hooks.hooks(phase.when).len(),
        phase
    ));

    let executor = create_executor(&config, options.dry_run);
    let coordinator = match options.timeout {
        Some(timeout) => ExecutionCoordinator::with_timeout(executor, timeout),
        None => ExecutionCoordinator::new(executor),
    };
    info!(
        "Default invocation timeout: {}",
        humantime::format_duration(coordinator.default_timeout())
    );

    let cancel = CancellationToken::new();
    let mut signals = SignalHandler::new(cancel.clone());
    signals.start()?;

    let report = coordinator
        .run_hooks(&phase, &config.hooks, &context, &cancel)
        .await;
    signals.stop();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        console.print_report(&report);
    }

    Ok(report.is_success())
}
