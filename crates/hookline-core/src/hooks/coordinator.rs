//! Phase execution
//!
//! Runs resolved invocations strictly in order, one at a time, and applies
//! the continue-on-error policy. Each invocation runs inside a `hook` tracing
//! span, so everything the executor logs is attributed to the hook and
//! matrix cell that produced it.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::context::ExecutionContext;
use super::executor::Executor;
use super::registry::HookSet;
use super::report::{HookSummary, InvocationOutcome, OutcomeStatus, PhaseReport, PhaseStatus};
use super::resolver::{resolve, ResolvedCell};
use super::types::{default_timeout, Hook, Invocation, Phase};
use crate::error::ExecutionError;

/// Executes the hooks of a phase through an executor
pub struct ExecutionCoordinator {
    executor: Arc<dyn Executor>,
    default_timeout: Duration,
}

impl ExecutionCoordinator {
    /// Create a new coordinator with the given executor
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            default_timeout: Duration::from_secs(default_timeout()),
        }
    }

    /// Create a new coordinator with a custom default timeout
    pub fn with_timeout(executor: Arc<dyn Executor>, timeout: Duration) -> Self {
        Self {
            executor,
            default_timeout: timeout,
        }
    }

    /// Timeout applied to invocations that do not set their own
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Resolve and run every hook declared for the phase
    pub async fn run_hooks(
        &self,
        phase: &Phase,
        hooks: &HookSet,
        context: &ExecutionContext,
        cancel: &CancellationToken,
    ) -> PhaseReport {
        self.run_phase(phase, hooks.hooks(phase.when), context, cancel)
            .await
    }

    /// Resolve and run hooks in declaration order.
    ///
    /// Hooks filtered out by activation or platform leave no trace in the
    /// report. A matrix that cannot be expanded fails the phase.
    pub async fn run_phase(
        &self,
        phase: &Phase,
        hooks: &[Hook],
        context: &ExecutionContext,
        cancel: &CancellationToken,
    ) -> PhaseReport {
        let mut report = PhaseReport::new(phase);
        info!("Running {} hook(s) for {}", hooks.len(), phase);

        for hook in hooks {
            if cancel.is_cancelled() {
                warn!("Phase {} cancelled before hook '{}'", phase, hook.name);
                report.status = PhaseStatus::Cancelled;
                break;
            }

            let resolution = match resolve(hook, context) {
                Ok(resolution) => resolution,
                Err(err) => {
                    error!("Hook '{}' could not be resolved: {}", hook.name, err);
                    let slot = report.begin_hook(&hook.name, 0);
                    report.hooks[slot].error = Some(err.to_string());
                    report.status = PhaseStatus::Failed;
                    break;
                }
            };

            if let Some(exclusion) = resolution.excluded {
                debug!("Hook '{}' excluded: {:?}", hook.name, exclusion);
                continue;
            }

            let slot = report.begin_hook(&hook.name, resolution.cells.len());
            if self
                .execute_cells(&mut report, Some(slot), resolution.cells, cancel)
                .await
                .is_break()
            {
                break;
            }
        }

        self.finish(phase, report)
    }

    /// Run already resolved invocations in order
    pub async fn run(
        &self,
        phase: &Phase,
        invocations: Vec<Invocation>,
        cancel: &CancellationToken,
    ) -> PhaseReport {
        let mut report = PhaseReport::new(phase);
        let cells = invocations.into_iter().map(ResolvedCell::Invoke).collect();
        let _ = self.execute_cells(&mut report, None, cells, cancel).await;
        self.finish(phase, report)
    }

    fn finish(&self, phase: &Phase, report: PhaseReport) -> PhaseReport {
        match report.status {
            PhaseStatus::Succeeded => info!(
                "Phase {} succeeded ({} ran, {} skipped)",
                phase,
                report.count(OutcomeStatus::Succeeded) + report.count(OutcomeStatus::Failed),
                report.count(OutcomeStatus::Skipped)
            ),
            PhaseStatus::Failed => error!("Phase {} failed", phase),
            PhaseStatus::Cancelled => warn!("Phase {} cancelled", phase),
        }
        report
    }

    /// Run cells in order, recording into `slot` or, when `None`, into the
    /// summary of each cell's hook
    async fn execute_cells(
        &self,
        report: &mut PhaseReport,
        slot: Option<usize>,
        cells: Vec<ResolvedCell>,
        cancel: &CancellationToken,
    ) -> ControlFlow<()> {
        for cell in cells {
            if cancel.is_cancelled() {
                warn!("Cancelled before {}", cell.label());
                report.status = PhaseStatus::Cancelled;
                return ControlFlow::Break(());
            }
            let target = slot.unwrap_or_else(|| report.trailing_slot(cell.hook_name()));

            match cell {
                ResolvedCell::Skipped {
                    hook_name,
                    matrix_binding,
                    reason,
                } => {
                    report.record(
                        target,
                        InvocationOutcome::skipped(&hook_name, matrix_binding, &reason),
                    );
                }
                ResolvedCell::Invoke(invocation) => {
                    let (outcome, cancelled) = self.invoke(&invocation, cancel).await;
                    let failed = outcome.status == OutcomeStatus::Failed;
                    report.record(target, outcome);

                    if cancelled {
                        report.status = PhaseStatus::Cancelled;
                        return ControlFlow::Break(());
                    }
                    if failed && !invocation.continue_on_error {
                        report.status = PhaseStatus::Failed;
                        return ControlFlow::Break(());
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Run one invocation under its logging span
    async fn invoke(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> (InvocationOutcome, bool) {
        let span = info_span!(
            "hook",
            hook = %invocation.hook_name,
            cell = ?invocation.matrix_binding
        );

        async {
            if invocation.verbose {
                info!("matrix: {:?}", invocation.matrix_binding);
                info!("environment: {:?}", invocation.environment);
                if let Some(cmd) = &invocation.command {
                    info!("command: {}", cmd);
                }
            }

            let limit = invocation.timeout.unwrap_or(self.default_timeout);
            let started = Instant::now();
            let result = match timeout(limit, self.executor.invoke(invocation, cancel)).await {
                Ok(result) => result,
                Err(_) => Err(ExecutionError::Timeout(limit)),
            };
            let elapsed = started.elapsed();

            match result {
                Ok(()) => {
                    debug!("Hook succeeded in {:?}", elapsed);
                    (InvocationOutcome::succeeded(invocation, elapsed), false)
                }
                Err(err) => {
                    if invocation.continue_on_error {
                        warn!("Hook failed, continuing: {}", err);
                    } else {
                        error!("Hook failed: {}", err);
                    }
                    let cancelled = err == ExecutionError::Cancelled;
                    (
                        InvocationOutcome::failed(invocation, err.to_string(), elapsed),
                        cancelled,
                    )
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Summaries of hooks whose phase stopped before all cells ran
pub fn incomplete_hooks(report: &PhaseReport) -> Vec<&HookSummary> {
    report
        .hooks
        .iter()
        .filter(|s| s.error.is_some() || s.not_started() > 0)
        .collect()
}
