//! Execution context passed to hook resolution

use super::matrix::Matrix;
use super::platform::host_platform;
use super::types::Bindings;

/// Process-wide inputs of a pipeline run
///
/// Resolution reads everything it needs from here instead of ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Platform the run executes on, e.g. `linux-x86_64`
    pub current_platform: String,
    /// Bindings visible to every hook
    pub base_bindings: Bindings,
    /// Matrix used by hooks with `apply_default_matrix` and no matrix of their own
    pub default_matrix: Matrix,
    /// Whether this is a snapshot (non-release) run
    pub snapshot: bool,
}

impl ExecutionContext {
    /// Create a context for the given platform
    pub fn new(current_platform: impl Into<String>) -> Self {
        Self {
            current_platform: current_platform.into(),
            base_bindings: Bindings::new(),
            default_matrix: Matrix::default(),
            snapshot: false,
        }
    }

    /// Create a context for the host platform
    pub fn for_host() -> Self {
        Self::new(host_platform())
    }

    pub fn with_binding(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_bindings.insert(name.into(), value.into());
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.base_bindings.extend(bindings);
        self
    }

    pub fn with_default_matrix(mut self, matrix: Matrix) -> Self {
        self.default_matrix = matrix;
        self
    }

    pub fn with_snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::for_host()
    }
}
