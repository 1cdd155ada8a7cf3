//! File-based hook configuration

use anyhow::{bail, Context, Result};
use hookline_core::hooks::{Bindings, ExecutionContext, HookSet, HookWhen, Matrix, host_platform};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::args::PhaseArgs;

/// Webhook used for hooks that declare no command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Announcer name used in logs
    #[serde(default = "default_webhook_name")]
    pub name: String,
    pub url: String,
    /// Message template
    #[serde(default)]
    pub message: Option<String>,
    /// Downgrade delivery failures to warnings
    #[serde(default = "default_lenient")]
    pub lenient: bool,
}

fn default_webhook_name() -> String {
    "webhook".to_string()
}

fn default_lenient() -> bool {
    true
}

/// Contents of a hookline configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooklineConfig {
    /// Base bindings visible to every hook
    pub environment: Bindings,
    /// Matrix applied to hooks with `apply_default_matrix`
    pub default_matrix: Matrix,
    pub hooks: HookSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
}

impl HooklineConfig {
    /// Check every declaration, including matrix expansion
    pub fn validate(&self) -> Result<()> {
        self.default_matrix
            .validate()
            .context("Invalid default_matrix")?;
        self.hooks.validate()?;
        self.validate_webhook()
    }

    /// Check what running one lifecycle point needs.
    ///
    /// Matrix declarations are left to the run itself, which reports an
    /// unexpandable matrix as a failed phase.
    pub fn validate_phase(&self, when: HookWhen) -> Result<()> {
        self.hooks.check_names(when)?;
        self.validate_webhook()
    }

    fn validate_webhook(&self) -> Result<()> {
        if let Some(webhook) = &self.webhook {
            if webhook.url.trim().is_empty() {
                bail!("Webhook '{}' has an empty url", webhook.name);
            }
        }
        Ok(())
    }

    /// Build the execution context for a phase
    pub fn context(&self, args: &PhaseArgs) -> ExecutionContext {
        let platform = args.platform.clone().unwrap_or_else(host_platform);
        let mut bindings = self.environment.clone();
        bindings.extend(args.bindings.iter().cloned());

        ExecutionContext::new(platform)
            .with_bindings(bindings)
            .with_default_matrix(self.default_matrix.clone())
            .with_snapshot(args.snapshot)
    }
}

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// A missing file is an error.
pub fn load_from_file(path: &Path) -> Result<HooklineConfig> {
    if !path.exists() {
        bail!("Configuration file not found: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config: HooklineConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config '{}'", path.display()))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config '{}'", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config '{}'", path.display()))?,
    };

    Ok(config)
}
