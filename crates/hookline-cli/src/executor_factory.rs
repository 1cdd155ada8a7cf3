//! Executor construction for CLI runs

use async_trait::async_trait;
use hookline_core::ExecutionError;
use hookline_core::hooks::{
    CommandExecutor, DryRunExecutor, Executor, Invocation, WebhookExecutor,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::HooklineConfig;

/// Runs commands, and announces command-less hooks through the webhook
pub struct RoutingExecutor {
    command: CommandExecutor,
    webhook: Option<WebhookExecutor>,
}

impl RoutingExecutor {
    pub fn new(command: CommandExecutor, webhook: Option<WebhookExecutor>) -> Self {
        Self { command, webhook }
    }

    fn route(&self, invocation: &Invocation) -> &dyn Executor {
        match (&invocation.command, &self.webhook) {
            (None, Some(webhook)) => webhook,
            _ => &self.command,
        }
    }
}

#[async_trait]
impl Executor for RoutingExecutor {
    fn name(&self) -> &str {
        "routing"
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        self.route(invocation).invoke(invocation, cancel).await
    }
}

/// Build the executor for a run
pub fn create_executor(config: &HooklineConfig, dry_run: bool) -> Arc<dyn Executor> {
    if dry_run {
        return Arc::new(DryRunExecutor);
    }

    let webhook = config.webhook.as_ref().map(|webhook| {
        let mut executor =
            WebhookExecutor::new(&webhook.name, &webhook.url).lenient(webhook.lenient);
        if let Some(message) = &webhook.message {
            executor = executor.with_message(message);
        }
        executor
    });

    Arc::new(RoutingExecutor::new(CommandExecutor::new(), webhook))
}
