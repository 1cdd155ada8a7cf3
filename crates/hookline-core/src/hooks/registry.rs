//! Hook sets grouped by lifecycle point

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::types::{Hook, HookWhen};
use crate::error::{HookError, HookResult};

/// Hooks declared for one step, grouped by when they run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSet {
    pub before: Vec<Hook>,
    pub success: Vec<Hook>,
    pub failure: Vec<Hook>,
}

impl HookSet {
    /// Create a new empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks for a lifecycle point, in declaration order
    pub fn hooks(&self, when: HookWhen) -> &[Hook] {
        match when {
            HookWhen::Before => &self.before,
            HookWhen::Success => &self.success,
            HookWhen::Failure => &self.failure,
        }
    }

    fn hooks_mut(&mut self, when: HookWhen) -> &mut Vec<Hook> {
        match when {
            HookWhen::Before => &mut self.before,
            HookWhen::Success => &mut self.success,
            HookWhen::Failure => &mut self.failure,
        }
    }

    /// Append a hook
    pub fn register(&mut self, when: HookWhen, hook: Hook) {
        self.hooks_mut(when).push(hook);
    }

    /// Builder form of [`HookSet::register`]
    pub fn with_hook(mut self, when: HookWhen, hook: Hook) -> Self {
        self.register(when, hook);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.success.is_empty() && self.failure.is_empty()
    }

    /// Total number of declared hooks
    pub fn len(&self) -> usize {
        self.before.len() + self.success.len() + self.failure.len()
    }

    /// Merge another set into this one.
    ///
    /// A hook with the name of an existing hook replaces it in place;
    /// other hooks are appended.
    pub fn merge(&mut self, other: HookSet) {
        for (when, hooks) in [
            (HookWhen::Before, other.before),
            (HookWhen::Success, other.success),
            (HookWhen::Failure, other.failure),
        ] {
            let target = self.hooks_mut(when);
            for hook in hooks {
                match target.iter_mut().find(|h| h.name == hook.name) {
                    Some(existing) => *existing = hook,
                    None => target.push(hook),
                }
            }
        }
    }

    /// Check names and matrix declarations of every hook.
    ///
    /// Names identify hooks within a lifecycle point and must be unique there.
    pub fn validate(&self) -> HookResult<()> {
        for when in [HookWhen::Before, HookWhen::Success, HookWhen::Failure] {
            self.check_names(when)?;
            for hook in self.hooks(when) {
                hook.matrix.validate().map_err(|e| {
                    HookError::config(format!("{} hook '{}': {}", when, hook.name, e))
                })?;
            }
        }
        Ok(())
    }

    /// Check that the hooks of one lifecycle point have distinct, non-blank names
    pub fn check_names(&self, when: HookWhen) -> HookResult<()> {
        let mut seen = HashSet::new();
        for hook in self.hooks(when) {
            if hook.name.trim().is_empty() {
                return Err(HookError::config(format!("{} hook without a name", when)));
            }
            if !seen.insert(hook.name.as_str()) {
                return Err(HookError::config(format!(
                    "duplicate {} hook '{}'",
                    when, hook.name
                )));
            }
        }
        Ok(())
    }
}
