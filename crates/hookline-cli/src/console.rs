//! CLI console utilities

use colored::*;
use hookline_core::hooks::{OutcomeStatus, PhaseReport, PhaseStatus};

/// CLI console for formatted output
pub struct CliConsole {
    verbose: bool,
}

impl CliConsole {
    /// Create a new CLI console
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.len()).dimmed());
    }

    /// Print a phase report
    pub fn print_report(&self, report: &PhaseReport) {
        self.print_header(&format!("Phase {}", report.phase));

        for outcome in &report.outcomes {
            let label = outcome.label();
            let line = match outcome.status {
                OutcomeStatus::Succeeded => {
                    format!("{} {}", "✓".green().bold(), label)
                }
                OutcomeStatus::Failed if outcome.continue_on_error => {
                    format!("{} {} (continued)", "⚠".yellow().bold(), label)
                }
                OutcomeStatus::Failed => format!("{} {}", "✗".red().bold(), label.red()),
                OutcomeStatus::Skipped if outcome.is_errored() => {
                    format!("{} {} (errored)", "!".yellow().bold(), label)
                }
                OutcomeStatus::Skipped => format!("{} {}", "-".dimmed(), label.dimmed()),
            };
            match &outcome.error {
                Some(err) => println!("  {}: {}", line, err.dimmed()),
                None => println!("  {}", line),
            }
        }

        if self.verbose {
            println!();
            for summary in &report.hooks {
                println!("  {}", summary.to_string().dimmed());
            }
        }

        println!();
        match report.status {
            PhaseStatus::Succeeded => self.success(&format!("Phase {} succeeded", report.phase)),
            PhaseStatus::Failed => self.error(&format!("Phase {} failed", report.phase)),
            PhaseStatus::Cancelled => self.warn(&format!("Phase {} cancelled", report.phase)),
        }
    }
}
