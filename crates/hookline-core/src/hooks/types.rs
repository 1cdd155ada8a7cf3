//! Core hook type definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use super::context::ExecutionContext;
use super::matrix::Matrix;

/// Name/value bindings (environment, matrix cells, context properties)
pub type Bindings = BTreeMap<String, String>;

/// Activation policy that decides whether a hook is enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Always enabled
    #[default]
    Always,
    /// Never enabled
    Never,
    /// Enabled for release (non-snapshot) runs
    Release,
    /// Enabled for snapshot runs
    Snapshot,
}

impl Activation {
    pub fn as_str(&self) -> &str {
        match self {
            Activation::Always => "always",
            Activation::Never => "never",
            Activation::Release => "release",
            Activation::Snapshot => "snapshot",
        }
    }

    /// Resolve the policy for a run
    pub fn is_enabled(&self, snapshot: bool) -> bool {
        match self {
            Activation::Always => true,
            Activation::Never => false,
            Activation::Release => !snapshot,
            Activation::Snapshot => snapshot,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platform include/exclude filter
///
/// A platform present in both sets is excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub includes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excludes: BTreeSet<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, platform: impl Into<String>) -> Self {
        self.includes.insert(platform.into());
        self
    }

    pub fn exclude(mut self, platform: impl Into<String>) -> Self {
        self.excludes.insert(platform.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }
}

/// A declared lifecycle hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// Hook name, used in logs and reports
    pub name: String,
    /// Activation policy
    #[serde(default)]
    pub active: Activation,
    /// Command template for process executors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Filter::is_empty")]
    pub filter: Filter,
    /// Legacy alias for `filter.includes`
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub platforms: BTreeSet<String>,
    #[serde(default)]
    pub continue_on_error: bool,
    #[serde(default)]
    pub verbose: bool,
    /// Condition expression, empty means always
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
    /// Environment templates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: Bindings,
    #[serde(default)]
    pub apply_default_matrix: bool,
    #[serde(default, skip_serializing_if = "Matrix::is_empty")]
    pub matrix: Matrix,
    /// Per-invocation timeout, overrides the coordinator default
    #[serde(
        default,
        with = "humantime_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
}

impl Hook {
    /// Create a new always-active hook
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: Activation::Always,
            command: None,
            filter: Filter::default(),
            platforms: BTreeSet::new(),
            continue_on_error: false,
            verbose: false,
            condition: String::new(),
            environment: Bindings::new(),
            apply_default_matrix: false,
            matrix: Matrix::default(),
            timeout: None,
        }
    }

    pub fn with_active(mut self, active: Activation) -> Self {
        self.active = active;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.insert(platform.into());
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(name.into(), value.into());
        self
    }

    pub fn with_default_matrix(mut self, apply: bool) -> Self {
        self.apply_default_matrix = apply;
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether this hook is enabled for the given run
    pub fn is_enabled(&self, context: &ExecutionContext) -> bool {
        self.active.is_enabled(context.snapshot)
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook '{}' ({})", self.name, self.active)?;
        if let Some(cmd) = &self.command {
            write!(f, ": {}", cmd)?;
        }
        Ok(())
    }
}

/// A fully resolved, executable unit derived from a hook and one matrix cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub hook_name: String,
    /// Resolved command, if the hook declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Merged environment: base bindings, hook environment, matrix cell
    pub environment: Bindings,
    /// Matrix cell, empty when no matrix applies
    pub matrix_binding: Bindings,
    pub verbose: bool,
    pub continue_on_error: bool,
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Label identifying the hook and matrix cell, e.g. `build[os=linux]`
    pub fn label(&self) -> String {
        cell_label(&self.hook_name, &self.matrix_binding)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Label for a hook name and matrix cell
pub fn cell_label(hook_name: &str, binding: &Bindings) -> String {
    if binding.is_empty() {
        hook_name.to_string()
    } else {
        let cell: Vec<String> = binding.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}[{}]", hook_name, cell.join(","))
    }
}

/// Point in a step's lifecycle where hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookWhen {
    /// Before the step runs
    Before,
    /// After the step succeeds
    Success,
    /// After the step fails
    Failure,
}

impl HookWhen {
    pub fn as_str(&self) -> &str {
        match self {
            HookWhen::Before => "before",
            HookWhen::Success => "success",
            HookWhen::Failure => "failure",
        }
    }
}

impl fmt::Display for HookWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named lifecycle point, e.g. `before-release`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub when: HookWhen,
    pub step: String,
}

impl Phase {
    pub fn new(when: HookWhen, step: impl Into<String>) -> Self {
        Self {
            when,
            step: step.into(),
        }
    }

    pub fn before(step: impl Into<String>) -> Self {
        Self::new(HookWhen::Before, step)
    }

    pub fn success(step: impl Into<String>) -> Self {
        Self::new(HookWhen::Success, step)
    }

    pub fn failure(step: impl Into<String>) -> Self {
        Self::new(HookWhen::Failure, step)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.when, self.step)
    }
}

/// Default timeout in seconds for an invocation
pub(crate) fn default_timeout() -> u64 {
    60
}
