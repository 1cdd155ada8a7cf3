//! Shell command executor

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::executor::Executor;
use super::types::Invocation;
use crate::error::ExecutionError;

/// Environment variable carrying the hook name
pub const HOOK_NAME_VAR: &str = "HOOKLINE_HOOK";

/// Only names that are valid shell variables are exported
fn is_exportable(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Runs an invocation's command through the platform shell
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    working_dir: Option<PathBuf>,
}

impl CommandExecutor {
    /// Create a new command executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Run commands from the given directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn build_command(&self, command: &str, invocation: &Invocation) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };

        for (name, value) in &invocation.environment {
            if is_exportable(name) {
                cmd.env(name, value);
            } else {
                debug!("Not exporting '{}': not a valid variable name", name);
            }
        }
        cmd.env(HOOK_NAME_VAR, &invocation.hook_name);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    fn name(&self) -> &str {
        "command"
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        let command = invocation.command.as_deref().ok_or_else(|| {
            ExecutionError::failed(format!("hook '{}' declares no command", invocation.hook_name))
        })?;

        let mut child = self
            .build_command(command, invocation)
            .spawn()
            .map_err(|e| ExecutionError::failed(format!("Failed to spawn command: {}", e)))?;

        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();

        let stdout_future = async move {
            let mut output = String::new();
            if let Some(mut handle) = stdout_handle {
                handle.read_to_string(&mut output).await.ok();
            }
            output
        };

        let stderr_future = async move {
            let mut output = String::new();
            if let Some(mut handle) = stderr_handle {
                handle.read_to_string(&mut output).await.ok();
            }
            output
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                Err(ExecutionError::Cancelled)
            }
            (status, stdout, stderr) = async {
                let (stdout, stderr) = tokio::join!(stdout_future, stderr_future);
                (child.wait().await, stdout, stderr)
            } => {
                let stdout = stdout.trim_end();
                if !stdout.is_empty() {
                    if invocation.verbose {
                        info!("{}", stdout);
                    } else {
                        debug!("{}", stdout);
                    }
                }

                let status = status
                    .map_err(|e| ExecutionError::failed(format!("Failed to wait for command: {}", e)))?;
                if status.success() {
                    Ok(())
                } else {
                    let stderr = stderr.trim();
                    Err(ExecutionError::failed(if stderr.is_empty() {
                        format!("Command failed with exit code: {:?}", status.code())
                    } else {
                        stderr.to_string()
                    }))
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::hooks::types::Bindings;

    fn invocation(command: &str) -> Invocation {
        Invocation {
            hook_name: "test_hook".to_string(),
            command: Some(command.to_string()),
            environment: Bindings::new(),
            matrix_binding: Bindings::new(),
            verbose: false,
            continue_on_error: false,
            timeout: None,
        }
    }

    #[test]
    fn test_is_exportable() {
        assert!(is_exportable("HOME"));
        assert!(is_exportable("_private1"));
        assert!(!is_exportable("env.HOME"));
        assert!(!is_exportable("1ABC"));
        assert!(!is_exportable(""));
    }

    #[tokio::test]
    async fn test_command_success() {
        let result = CommandExecutor::new()
            .invoke(&invocation("echo test"), &CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_command_failure_uses_stderr() {
        let result = CommandExecutor::new()
            .invoke(&invocation("echo broken >&2; exit 3"), &CancellationToken::new())
            .await;
        assert_eq!(result, Err(ExecutionError::failed("broken")));
    }

    #[tokio::test]
    async fn test_command_failure_exit_code() {
        let result = CommandExecutor::new()
            .invoke(&invocation("exit 1"), &CancellationToken::new())
            .await;
        match result {
            Err(ExecutionError::Failed(msg)) => assert!(msg.contains("exit code")),
            other => panic!("Expected failure, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_environment_exported() {
        let mut inv = invocation("test \"$TARGET\" = linux && test \"$HOOKLINE_HOOK\" = test_hook");
        inv.environment
            .insert("TARGET".to_string(), "linux".to_string());
        inv.environment
            .insert("env.IGNORED".to_string(), "x".to_string());
        let result = CommandExecutor::new()
            .invoke(&inv, &CancellationToken::new())
            .await;
        assert!(result.is_ok(), "{:?}", result);
    }

    #[tokio::test]
    async fn test_missing_command() {
        let mut inv = invocation("unused");
        inv.command = None;
        let result = CommandExecutor::new()
            .invoke(&inv, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ExecutionError::Failed(_))));
    }

    #[tokio::test]
    async fn test_cancellation_kills_command() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = CommandExecutor::new()
            .invoke(&invocation("sleep 5"), &cancel)
            .await;
        assert_eq!(result, Err(ExecutionError::Cancelled));
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = std::env::temp_dir();
        let result = CommandExecutor::new()
            .with_working_dir(&dir)
            .invoke(&invocation("test -d ."), &CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }
}
