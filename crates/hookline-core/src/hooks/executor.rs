//! Executor capability
//!
//! The coordinator never performs side effects itself: every invocation is
//! handed to an [`Executor`]. Implementations decide what "running" means
//! (spawning a process, posting to a webhook, calling a closure).

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::types::Invocation;
use crate::error::ExecutionError;

/// Performs the side-effecting work of an invocation
#[async_trait]
pub trait Executor: Send + Sync {
    /// Name of the executor for logging
    fn name(&self) -> &str;

    /// Run one invocation.
    ///
    /// The token is cancelled when the run is interrupted; executors that can
    /// stop early should watch it and return [`ExecutionError::Cancelled`].
    async fn invoke(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<(), ExecutionError>;
}

type Callback = dyn Fn(&Invocation) -> Result<(), ExecutionError> + Send + Sync;

/// Executor backed by a Rust closure
#[derive(Clone)]
pub struct FnExecutor {
    name: String,
    callback: Arc<Callback>,
}

impl FnExecutor {
    /// Create a new closure executor
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Invocation) -> Result<(), ExecutionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }
}

impl fmt::Debug for FnExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl Executor for FnExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        _cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        (self.callback)(invocation)
    }
}

/// Executor that only reports what would run
#[derive(Debug, Clone, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl Executor for DryRunExecutor {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        _cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        match &invocation.command {
            Some(cmd) => info!("[dry-run] would run: {}", cmd),
            None => info!("[dry-run] would invoke {}", invocation.label()),
        }
        Ok(())
    }
}
