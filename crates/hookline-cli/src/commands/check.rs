//! Configuration validation command

use anyhow::Result;
use hookline_core::hooks::{HookWhen, expand};
use std::path::Path;

use crate::config::load_from_file;
use crate::console::CliConsole;

/// Validate the configuration, expanding every matrix
pub async fn execute(config_file: &Path, verbose: bool) -> Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration Validation");
    console.info(&format!(
        "Validating configuration file: {}",
        config_file.display()
    ));

    let config = load_from_file(config_file)?;
    config.validate()?;

    for when in [HookWhen::Before, HookWhen::Success, HookWhen::Failure] {
        let hooks = config.hooks.hooks(when);
        if hooks.is_empty() {
            continue;
        }
        console.info(&format!("{} hook(s) for '{}'", hooks.len(), when));
        for hook in hooks {
            let cells = expand(
                &hook.matrix,
                hook.apply_default_matrix,
                &config.default_matrix,
            )?;
            if verbose {
                console.info(&format!("  {}: {} cell(s)", hook, cells.len()));
            }
        }
    }

    if let Some(webhook) = &config.webhook {
        console.info(&format!("Webhook '{}' -> {}", webhook.name, webhook.url));
    }

    console.success(&format!(
        "Configuration is valid ({} hook(s))",
        config.hooks.len()
    ));
    Ok(())
}
