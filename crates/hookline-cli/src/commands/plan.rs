//! Phase planning command

use anyhow::Result;
use colored::*;
use hookline_core::hooks::{
    Bindings, ExecutionContext, Exclusion, Hook, Phase, ResolvedCell, SkipReason, resolve,
};
use serde::Serialize;
use std::path::Path;

use crate::args::PhaseArgs;
use crate::config::load_from_file;
use crate::console::CliConsole;

/// What would happen to one matrix cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Invoke,
    Skipped,
    Errored,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedCell {
    pub label: String,
    pub matrix_binding: Bindings,
    pub disposition: Disposition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Plan of one hook
#[derive(Debug, Clone, Serialize)]
pub struct PlannedHook {
    pub hook: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded: Option<Exclusion>,
    pub cells: Vec<PlannedCell>,
}

/// Resolve a hook into its plan
pub fn plan_hook(hook: &Hook, context: &ExecutionContext) -> Result<PlannedHook> {
    let resolution = resolve(hook, context)?;
    let cells = resolution
        .cells
        .into_iter()
        .map(|cell| {
            let label = cell.label();
            match cell {
                ResolvedCell::Invoke(invocation) => PlannedCell {
                    label,
                    matrix_binding: invocation.matrix_binding,
                    disposition: Disposition::Invoke,
                    command: invocation.command,
                    error: None,
                },
                ResolvedCell::Skipped {
                    matrix_binding,
                    reason: SkipReason::ConditionFalse,
                    ..
                } => PlannedCell {
                    label,
                    matrix_binding,
                    disposition: Disposition::Skipped,
                    command: None,
                    error: None,
                },
                ResolvedCell::Skipped {
                    matrix_binding,
                    reason: SkipReason::EvaluationFailed(err),
                    ..
                } => PlannedCell {
                    label,
                    matrix_binding,
                    disposition: Disposition::Errored,
                    command: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();

    Ok(PlannedHook {
        hook: resolution.hook_name,
        excluded: resolution.excluded,
        cells,
    })
}

/// Print what a phase would run without executing anything
pub async fn execute(config_file: &Path, args: &PhaseArgs, json: bool, verbose: bool) -> Result<()> {
    let console = CliConsole::new(verbose);
    let config = load_from_file(config_file)?;
    let phase = Phase::new(args.when.into(), &args.step);
    let context = config.context(args);

    let plans = config
        .hooks
        .hooks(phase.when)
        .iter()
        .map(|hook| plan_hook(hook, &context))
        .collect::<Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    console.print_header(&format!("Plan for {} on {}", phase, context.current_platform));
    for plan in &plans {
        match plan.excluded {
            Some(Exclusion::Disabled) => {
                println!("  {} {}", "-".dimmed(), format!("{} (disabled)", plan.hook).dimmed());
            }
            Some(Exclusion::PlatformRejected) => {
                println!(
                    "  {} {}",
                    "-".dimmed(),
                    format!("{} (not for this platform)", plan.hook).dimmed()
                );
            }
            None => {
                for cell in &plan.cells {
                    match cell.disposition {
                        Disposition::Invoke => match &cell.command {
                            Some(cmd) => println!("  {} {}: {}", "▶".green(), cell.label, cmd),
                            None => println!("  {} {}", "▶".green(), cell.label),
                        },
                        Disposition::Skipped => println!(
                            "  {} {}",
                            "-".dimmed(),
                            format!("{} (condition false)", cell.label).dimmed()
                        ),
                        Disposition::Errored => println!(
                            "  {} {}: {}",
                            "!".yellow().bold(),
                            cell.label,
                            cell.error.as_deref().unwrap_or_default()
                        ),
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookline_core::hooks::Matrix;

    #[test]
    fn test_plan_dispositions() {
        let context = ExecutionContext::new("linux-x86_64").with_binding("CHANNEL", "stable");
        let hook = Hook::new("publish")
            .with_command("publish --arch {{ arch }}")
            .with_matrix(Matrix::new().with_axis("arch", ["x86_64", "aarch_64", "riscv"]))
            .with_condition("arch == 'x86_64' || CHANNEL == 'beta' || (arch == 'aarch_64' && arch)");

        let plan = plan_hook(&hook, &context).unwrap();

        let dispositions: Vec<Disposition> =
            plan.cells.iter().map(|c| c.disposition.clone()).collect();
        assert_eq!(
            dispositions,
            vec![Disposition::Invoke, Disposition::Errored, Disposition::Skipped]
        );
        assert_eq!(
            plan.cells[0].command.as_deref(),
            Some("publish --arch x86_64")
        );
        assert!(plan.cells[1].error.as_deref().unwrap().contains("aarch_64"));
    }

    #[test]
    fn test_plan_excluded_hook() {
        let context = ExecutionContext::new("windows-x86_64");
        let plan = plan_hook(&Hook::new("mac").with_platform("osx"), &context).unwrap();
        assert_eq!(plan.excluded, Some(Exclusion::PlatformRejected));
        assert!(plan.cells.is_empty());
    }
}
