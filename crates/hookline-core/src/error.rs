//! Error types for Hookline

use std::time::Duration;
use thiserror::Error;

use crate::hooks::condition::EvaluationError;
use crate::hooks::matrix::MatrixError;

/// Result type alias for Hookline operations
pub type HookResult<T> = Result<T, HookError>;

/// Main error type for Hookline
#[derive(Error, Debug, Clone)]
pub enum HookError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Condition or template evaluation failed
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Matrix declaration could not be expanded
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Hook execution errors
    #[error("Execution error: {hook}: {message}")]
    Execution { hook: String, message: String },

    /// Hook execution timeout
    #[error("Hook execution timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Phase was cancelled
    #[error("Phase was cancelled")]
    Cancelled,

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HookError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new execution error
    pub fn execution(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a new timeout error
    pub const fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }
}

impl From<std::io::Error> for HookError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for HookError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<reqwest::Error> for HookError {
    fn from(error: reqwest::Error) -> Self {
        Self::Http(error.to_string())
    }
}

/// Failure reported by an executor for a single invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The action ran and failed
    #[error("{0}")]
    Failed(String),

    /// The action did not finish in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The action was interrupted through its cancellation token
    #[error("cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Create a new failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<ExecutionError> for HookError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::Failed(message) => Self::Execution {
                hook: String::new(),
                message,
            },
            ExecutionError::Timeout(duration) => Self::timeout(duration.as_secs()),
            ExecutionError::Cancelled => Self::Cancelled,
        }
    }
}
