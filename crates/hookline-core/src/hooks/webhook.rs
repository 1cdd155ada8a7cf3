//! Webhook executor
//!
//! Posts a JSON message for every invocation. Chat announcers (Teams,
//! Telegram, ...) are webhook executors with a name and a message template;
//! in lenient mode a delivery failure is downgraded to a warning so an
//! unreachable chat never fails a release.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use super::executor::Executor;
use super::template::render;
use super::types::{Bindings, Invocation};
use crate::error::ExecutionError;

/// Default message when no template is configured
const DEFAULT_MESSAGE: &str = "Hook {{ HOOKLINE_HOOK }} triggered";

/// Payload posted to the webhook
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload<'a> {
    pub text: String,
    pub hook: &'a str,
    pub matrix: &'a Bindings,
}

/// Executor posting to an HTTP webhook
#[derive(Debug, Clone)]
pub struct WebhookExecutor {
    name: String,
    url: String,
    message: String,
    lenient: bool,
    client: Client,
}

impl WebhookExecutor {
    /// Create a new webhook executor
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            name: name.into(),
            url: url.into(),
            message: DEFAULT_MESSAGE.to_string(),
            lenient: false,
            client,
        }
    }

    /// Set the message template
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Report delivery failures as warnings instead of failures
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Render the message for an invocation
    pub fn render_message(&self, invocation: &Invocation) -> Result<String, ExecutionError> {
        let mut scope = invocation.environment.clone();
        scope.insert("HOOKLINE_HOOK".to_string(), invocation.hook_name.clone());
        render(&self.message, &scope)
            .map_err(|e| ExecutionError::failed(format!("Invalid message template: {}", e)))
    }

    async fn post(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        let payload = WebhookPayload {
            text: self.render_message(invocation)?,
            hook: &invocation.hook_name,
            matrix: &invocation.matrix_binding,
        };

        debug!("Posting to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ExecutionError::failed(format!("Webhook request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ExecutionError::failed(format!(
                "Webhook returned {}: {}",
                status,
                body.trim()
            )))
        }
    }
}

#[async_trait]
impl Executor for WebhookExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        let span = info_span!("webhook", target = %self.name);
        let result = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ExecutionError::Cancelled),
                result = self.post(invocation) => result,
            }
        }
        .instrument(span.clone())
        .await;

        match result {
            Err(ExecutionError::Failed(message)) if self.lenient => {
                span.in_scope(|| warn!("{}", message.trim()));
                Ok(())
            }
            other => other,
        }
    }
}
