//! Hook resolution
//!
//! Turns one hook declaration and one execution context into ordered matrix
//! cells, each either an executable [`Invocation`] or a skipped cell with the
//! reason it did not run.

use serde::Serialize;
use tracing::{debug, warn};

use super::condition::{Condition, EvaluationError};
use super::context::ExecutionContext;
use super::matrix::expand;
use super::platform::accepts;
use super::template::{render, render_all};
use super::types::{cell_label, Bindings, Hook, Invocation};
use crate::error::HookResult;

/// Why a hook produced no cells at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    /// Activation policy disabled the hook
    Disabled,
    /// The current platform is filtered out
    PlatformRejected,
}

/// Why a matrix cell did not produce an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The condition evaluated to false
    ConditionFalse,
    /// The condition or an environment template could not be evaluated
    EvaluationFailed(EvaluationError),
}

impl SkipReason {
    pub fn is_error(&self) -> bool {
        matches!(self, SkipReason::EvaluationFailed(_))
    }
}

/// One resolved matrix cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCell {
    /// The cell runs
    Invoke(Invocation),
    /// The cell is skipped
    Skipped {
        hook_name: String,
        matrix_binding: Bindings,
        reason: SkipReason,
    },
}

impl ResolvedCell {
    pub fn hook_name(&self) -> &str {
        match self {
            ResolvedCell::Invoke(invocation) => &invocation.hook_name,
            ResolvedCell::Skipped { hook_name, .. } => hook_name,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ResolvedCell::Invoke(invocation) => invocation.label(),
            ResolvedCell::Skipped {
                hook_name,
                matrix_binding,
                ..
            } => cell_label(hook_name, matrix_binding),
        }
    }
}

/// Result of resolving one hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub hook_name: String,
    /// Set when the hook was filtered out before matrix expansion
    pub excluded: Option<Exclusion>,
    /// Cells in binding order
    pub cells: Vec<ResolvedCell>,
}

impl Resolution {
    fn excluded(hook: &Hook, exclusion: Exclusion) -> Self {
        Self {
            hook_name: hook.name.clone(),
            excluded: Some(exclusion),
            cells: Vec::new(),
        }
    }

    /// Invocations in execution order
    pub fn invocations(&self) -> impl Iterator<Item = &Invocation> {
        self.cells.iter().filter_map(|cell| match cell {
            ResolvedCell::Invoke(invocation) => Some(invocation),
            ResolvedCell::Skipped { .. } => None,
        })
    }

    /// Consume the resolution, keeping only invocations
    pub fn into_invocations(self) -> Vec<Invocation> {
        self.cells
            .into_iter()
            .filter_map(|cell| match cell {
                ResolvedCell::Invoke(invocation) => Some(invocation),
                ResolvedCell::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded.is_some()
    }

    /// Cells whose condition was legitimately false
    pub fn skipped_count(&self) -> usize {
        self.count_skipped(|reason| !reason.is_error())
    }

    /// Cells that could not be evaluated
    pub fn errored_count(&self) -> usize {
        self.count_skipped(SkipReason::is_error)
    }

    fn count_skipped(&self, predicate: impl Fn(&SkipReason) -> bool) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, ResolvedCell::Skipped { reason, .. } if predicate(reason)))
            .count()
    }
}

/// Resolve a hook against an execution context.
///
/// A disabled or platform-rejected hook yields no cells. Otherwise every
/// matrix cell yields exactly one [`ResolvedCell`], in binding order.
/// Fails only when the matrix cannot be expanded.
pub fn resolve(hook: &Hook, context: &ExecutionContext) -> HookResult<Resolution> {
    if !hook.is_enabled(context) {
        debug!("Hook '{}' is disabled ({})", hook.name, hook.active);
        return Ok(Resolution::excluded(hook, Exclusion::Disabled));
    }

    if !accepts(
        &context.current_platform,
        &hook.filter.includes,
        &hook.filter.excludes,
        &hook.platforms,
    ) {
        debug!(
            "Hook '{}' does not apply to platform {}",
            hook.name, context.current_platform
        );
        return Ok(Resolution::excluded(hook, Exclusion::PlatformRejected));
    }

    let bindings = expand(
        &hook.matrix,
        hook.apply_default_matrix,
        &context.default_matrix,
    )?;
    let condition = Condition::parse(&hook.condition);

    let cells = bindings
        .into_iter()
        .map(|binding| resolve_cell(hook, context, &condition, binding))
        .collect();

    Ok(Resolution {
        hook_name: hook.name.clone(),
        excluded: None,
        cells,
    })
}

fn resolve_cell(
    hook: &Hook,
    context: &ExecutionContext,
    condition: &Result<Condition, EvaluationError>,
    binding: Bindings,
) -> ResolvedCell {
    let skipped = |binding: Bindings, reason: SkipReason| {
        if let SkipReason::EvaluationFailed(err) = &reason {
            warn!("{}: {}", cell_label(&hook.name, &binding), err);
        } else {
            debug!("{}: condition not met", cell_label(&hook.name, &binding));
        }
        ResolvedCell::Skipped {
            hook_name: hook.name.clone(),
            matrix_binding: binding,
            reason,
        }
    };

    let mut template_scope = context.base_bindings.clone();
    template_scope.extend(
        binding
            .iter()
            .map(|(axis, value)| (format!("matrix.{}", axis), value.clone())),
    );
    let environment = match render_all(&hook.environment, &template_scope) {
        Ok(env) => env,
        Err(err) => return skipped(binding, SkipReason::EvaluationFailed(err)),
    };

    let mut merged = context.base_bindings.clone();
    merged.extend(environment);
    merged.extend(binding.iter().map(|(k, v)| (k.clone(), v.clone())));

    let satisfied = match condition {
        Ok(condition) => condition.evaluate(&merged),
        Err(err) => Err(err.clone()),
    };
    match satisfied {
        Ok(true) => {}
        Ok(false) => return skipped(binding, SkipReason::ConditionFalse),
        Err(err) => return skipped(binding, SkipReason::EvaluationFailed(err)),
    }

    let command = match hook.command.as_deref().map(|cmd| render(cmd, &merged)) {
        None => None,
        Some(Ok(cmd)) => Some(cmd),
        Some(Err(err)) => return skipped(binding, SkipReason::EvaluationFailed(err)),
    };

    ResolvedCell::Invoke(Invocation {
        hook_name: hook.name.clone(),
        command,
        environment: merged,
        matrix_binding: binding,
        verbose: hook.verbose,
        continue_on_error: hook.continue_on_error,
        timeout: hook.timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::hooks::matrix::{Matrix, MatrixError};
    use crate::hooks::types::{Activation, Filter};

    fn linux() -> ExecutionContext {
        ExecutionContext::new("linux-x86_64")
    }

    #[test]
    fn test_disabled_hook_is_excluded() {
        let hook = Hook::new("never").with_active(Activation::Never);
        let resolution = resolve(&hook, &linux()).unwrap();
        assert_eq!(resolution.excluded, Some(Exclusion::Disabled));
        assert!(resolution.cells.is_empty());
    }

    #[test]
    fn test_release_hook_disabled_on_snapshot() {
        let hook = Hook::new("publish").with_active(Activation::Release);
        let resolution = resolve(&hook, &linux().with_snapshot(true)).unwrap();
        assert!(resolution.is_excluded());
    }

    #[test]
    fn test_platform_rejected() {
        let hook = Hook::new("mac-only").with_platform("osx");
        let resolution = resolve(&hook, &linux()).unwrap();
        assert_eq!(resolution.excluded, Some(Exclusion::PlatformRejected));
        assert_eq!(resolution.invocations().count(), 0);
    }

    #[test]
    fn test_filter_excludes() {
        let hook = Hook::new("no-linux").with_filter(Filter::new().exclude("linux"));
        assert!(resolve(&hook, &linux()).unwrap().is_excluded());
    }

    #[test]
    fn test_single_invocation_without_matrix() {
        let hook = Hook::new("plain").with_command("echo hi");
        let resolution = resolve(&hook, &linux()).unwrap();
        let invocations = resolution.into_invocations();
        assert_eq!(invocations.len(), 1);
        assert!(invocations[0].matrix_binding.is_empty());
        assert_eq!(invocations[0].command.as_deref(), Some("echo hi"));
    }

    #[test]
    fn test_environment_merge_precedence() {
        let ctx = linux()
            .with_binding("os", "base")
            .with_binding("VERSION", "1.0")
            .with_binding("KEEP", "base");
        let hook = Hook::new("merge")
            .with_env("os", "hook")
            .with_env("TAG", "v{{ VERSION }}")
            .with_env("KEEP", "hook")
            .with_matrix(Matrix::new().with_axis("os", ["linux"]));

        let invocations = resolve(&hook, &ctx).unwrap().into_invocations();
        let env = &invocations[0].environment;
        assert_eq!(env["os"], "linux");
        assert_eq!(env["TAG"], "v1.0");
        assert_eq!(env["KEEP"], "hook");
        assert_eq!(env["VERSION"], "1.0");
    }

    #[test]
    fn test_environment_template_sees_matrix_namespace() {
        let hook = Hook::new("artifact")
            .with_env("FILE", "app-{{ matrix.os }}.tar.gz")
            .with_matrix(Matrix::new().with_axis("os", ["linux", "osx"]));
        let invocations = resolve(&hook, &linux()).unwrap().into_invocations();
        assert_eq!(invocations[0].environment["FILE"], "app-linux.tar.gz");
        assert_eq!(invocations[1].environment["FILE"], "app-osx.tar.gz");
    }

    #[test]
    fn test_command_rendered_with_merged_bindings() {
        let hook = Hook::new("build")
            .with_command("make {{ target }} OS={{ matrix.os }}")
            .with_env("target", "dist")
            .with_matrix(Matrix::new().with_axis("os", ["osx"]));
        let invocations = resolve(&hook, &linux()).unwrap().into_invocations();
        assert_eq!(invocations[0].command.as_deref(), Some("make dist OS=osx"));
    }

    #[test]
    fn test_condition_per_cell() {
        let hook = Hook::new("linux-only")
            .with_condition("os == 'linux'")
            .with_matrix(Matrix::new().with_axis("os", ["linux", "osx"]));
        let resolution = resolve(&hook, &linux()).unwrap();
        assert_eq!(resolution.cells.len(), 2);
        assert_eq!(resolution.invocations().count(), 1);
        assert_eq!(resolution.skipped_count(), 1);
        assert_eq!(resolution.errored_count(), 0);
        assert!(matches!(
            &resolution.cells[1],
            ResolvedCell::Skipped { reason: SkipReason::ConditionFalse, matrix_binding, .. }
                if matrix_binding["os"] == "osx"
        ));
    }

    #[test]
    fn test_evaluation_error_is_recorded() {
        let hook = Hook::new("broken").with_condition("UNKNOWN == 'x'");
        let resolution = resolve(&hook, &linux()).unwrap();
        assert_eq!(resolution.errored_count(), 1);
        assert_eq!(resolution.skipped_count(), 0);
        assert!(matches!(
            &resolution.cells[0],
            ResolvedCell::Skipped {
                reason: SkipReason::EvaluationFailed(EvaluationError::UnresolvedReference(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_syntax_error_marks_every_cell() {
        let hook = Hook::new("syntax")
            .with_condition("os ==")
            .with_matrix(Matrix::new().with_axis("os", ["a", "b", "c"]));
        let resolution = resolve(&hook, &linux()).unwrap();
        assert_eq!(resolution.errored_count(), 3);
    }

    #[test]
    fn test_unresolved_environment_template() {
        let hook = Hook::new("env").with_env("X", "{{ nope }}");
        let resolution = resolve(&hook, &linux()).unwrap();
        assert_eq!(resolution.errored_count(), 1);
    }

    #[test]
    fn test_matrix_error_propagates() {
        let hook =
            Hook::new("bad").with_matrix(Matrix::new().with_axis("os", Vec::<String>::new()));
        let err = resolve(&hook, &linux()).unwrap_err();
        assert!(matches!(err, HookError::Matrix(MatrixError::EmptyAxis { .. })));
    }

    #[test]
    fn test_disabled_hook_skips_matrix_validation() {
        let hook = Hook::new("bad")
            .with_active(Activation::Never)
            .with_matrix(Matrix::new().with_axis("os", Vec::<String>::new()));
        assert!(resolve(&hook, &linux()).unwrap().is_excluded());
    }

    #[test]
    fn test_flags_carried() {
        let hook = Hook::new("flags")
            .with_verbose(true)
            .with_continue_on_error(true);
        let invocations = resolve(&hook, &linux()).unwrap().into_invocations();
        assert!(invocations[0].verbose);
        assert!(invocations[0].continue_on_error);
    }
}
