//! Phase execution reports

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::resolver::SkipReason;
use super::types::{cell_label, Bindings, Invocation, Phase};

/// Outcome of a single matrix cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    Skipped,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Succeeded => write!(f, "succeeded"),
            OutcomeStatus::Failed => write!(f, "failed"),
            OutcomeStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Overall status of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// No blocking failure
    Succeeded,
    /// A hook without `continue_on_error` failed, or a matrix could not be expanded
    Failed,
    /// The run was interrupted before all invocations started
    Cancelled,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStatus::Succeeded => write!(f, "succeeded"),
            PhaseStatus::Failed => write!(f, "failed"),
            PhaseStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Recorded result of one matrix cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationOutcome {
    pub hook_name: String,
    pub matrix_binding: Bindings,
    pub status: OutcomeStatus,
    /// Failure detail, or the evaluation error that skipped the cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether a failure was tolerated by `continue_on_error`
    pub continue_on_error: bool,
    #[serde(with = "humantime_serde")]
    pub elapsed: Duration,
}

impl InvocationOutcome {
    pub fn succeeded(invocation: &Invocation, elapsed: Duration) -> Self {
        Self {
            hook_name: invocation.hook_name.clone(),
            matrix_binding: invocation.matrix_binding.clone(),
            status: OutcomeStatus::Succeeded,
            error: None,
            continue_on_error: invocation.continue_on_error,
            elapsed,
        }
    }

    pub fn failed(invocation: &Invocation, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            hook_name: invocation.hook_name.clone(),
            matrix_binding: invocation.matrix_binding.clone(),
            status: OutcomeStatus::Failed,
            error: Some(error.into()),
            continue_on_error: invocation.continue_on_error,
            elapsed,
        }
    }

    pub fn skipped(hook_name: &str, matrix_binding: Bindings, reason: &SkipReason) -> Self {
        let error = match reason {
            SkipReason::ConditionFalse => None,
            SkipReason::EvaluationFailed(err) => Some(err.to_string()),
        };
        Self {
            hook_name: hook_name.to_string(),
            matrix_binding,
            status: OutcomeStatus::Skipped,
            error,
            continue_on_error: false,
            elapsed: Duration::ZERO,
        }
    }

    /// A skipped cell whose condition or templates failed to evaluate
    pub fn is_errored(&self) -> bool {
        self.status == OutcomeStatus::Skipped && self.error.is_some()
    }

    pub fn label(&self) -> String {
        cell_label(&self.hook_name, &self.matrix_binding)
    }
}

/// Per-hook disposition within a phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookSummary {
    pub hook: String,
    /// Matrix cells the hook expanded to
    pub cells: usize,
    /// Cells that were executed
    pub ran: usize,
    /// Executed cells that failed
    pub failed: usize,
    /// Cells whose condition was false
    pub skipped: usize,
    /// Cells that could not be resolved
    pub errored: usize,
    /// Resolution failure for the whole hook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HookSummary {
    pub fn new(hook: impl Into<String>, cells: usize) -> Self {
        Self {
            hook: hook.into(),
            cells,
            ..Default::default()
        }
    }

    /// Cells never started because the phase stopped early
    pub fn not_started(&self) -> usize {
        self.cells
            .saturating_sub(self.ran + self.skipped + self.errored)
    }
}

impl fmt::Display for HookSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = &self.error {
            return write!(f, "{}: error: {}", self.hook, err);
        }
        write!(
            f,
            "{}: ran {} of {} ({} failed), skipped {}, errored {}",
            self.hook, self.ran, self.cells, self.failed, self.skipped, self.errored
        )?;
        let not_started = self.not_started();
        if not_started > 0 {
            write!(f, ", not started {}", not_started)?;
        }
        Ok(())
    }
}

/// Report for one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: String,
    pub status: PhaseStatus,
    /// Outcomes in execution order
    pub outcomes: Vec<InvocationOutcome>,
    /// Hook dispositions in declaration order
    pub hooks: Vec<HookSummary>,
}

impl PhaseReport {
    pub fn new(phase: &Phase) -> Self {
        Self {
            phase: phase.to_string(),
            status: PhaseStatus::Succeeded,
            outcomes: Vec::new(),
            hooks: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PhaseStatus::Succeeded
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Start the summary of the next declared hook and return its slot
    pub(crate) fn begin_hook(&mut self, hook: &str, cells: usize) -> usize {
        self.hooks.push(HookSummary::new(hook, cells));
        self.hooks.len() - 1
    }

    /// Slot for an outcome without a declared hook.
    ///
    /// Consecutive outcomes of one hook share the last summary.
    pub(crate) fn trailing_slot(&mut self, hook: &str) -> usize {
        match self.hooks.last() {
            Some(last) if last.hook == hook => self.hooks.len() - 1,
            _ => self.begin_hook(hook, 0),
        }
    }

    /// Record an outcome and update the summary in `slot`
    pub(crate) fn record(&mut self, slot: usize, outcome: InvocationOutcome) {
        let summary = &mut self.hooks[slot];
        match outcome.status {
            OutcomeStatus::Succeeded => summary.ran += 1,
            OutcomeStatus::Failed => {
                summary.ran += 1;
                summary.failed += 1;
            }
            OutcomeStatus::Skipped if outcome.error.is_some() => summary.errored += 1,
            OutcomeStatus::Skipped => summary.skipped += 1,
        }
        let seen = summary.ran + summary.skipped + summary.errored;
        if summary.cells < seen {
            summary.cells = seen;
        }
        self.outcomes.push(outcome);
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Phase {}: {}", self.phase, self.status)?;
        for outcome in &self.outcomes {
            write!(f, "  {:<9} {}", outcome.status.to_string(), outcome.label())?;
            if let Some(err) = &outcome.error {
                write!(f, ": {}", err)?;
            }
            if outcome.status == OutcomeStatus::Failed && outcome.continue_on_error {
                write!(f, " (continued)")?;
            }
            writeln!(f)?;
        }
        for summary in &self.hooks {
            writeln!(f, "  - {}", summary)?;
        }
        Ok(())
    }
}
