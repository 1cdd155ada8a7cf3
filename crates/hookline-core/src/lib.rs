//! Hookline Core Library
//!
//! This crate decides which lifecycle hooks run for a phase, expands them
//! across their matrices, and drives their execution through a pluggable
//! executor.

pub mod error;
pub mod hooks;

// Re-export commonly used types
pub use error::{ExecutionError, HookError, HookResult};
pub use hooks::{
    ExecutionContext, ExecutionCoordinator, Executor, Hook, HookSet, Invocation, Matrix, Phase,
    PhaseReport, PhaseStatus,
};
