//! Hook execution engine
//!
//! Hooks are declared per lifecycle point of a step (before it runs, after it
//! succeeds, after it fails). Running a phase goes through three stages:
//!
//! 1. each hook is filtered by its activation policy and platform filter,
//! 2. its matrix is expanded and every cell is checked against the hook's
//!    condition, producing ordered [`Invocation`]s,
//! 3. the [`ExecutionCoordinator`] hands invocations to an [`Executor`] one
//!    at a time and collects a [`PhaseReport`].
//!
//! # Examples
//!
//! ```rust
//! use hookline_core::hooks::{
//!     ExecutionContext, ExecutionCoordinator, FnExecutor, Hook, Matrix, Phase,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let hooks = vec![
//!     Hook::new("package")
//!         .with_command("make dist OS={{ matrix.os }}")
//!         .with_matrix(Matrix::new().with_axis("os", ["linux", "windows"])),
//!     Hook::new("mac-only").with_platform("osx"),
//! ];
//!
//! let executor = FnExecutor::new("print", |invocation| {
//!     println!("{}", invocation);
//!     Ok(())
//! });
//! let coordinator = ExecutionCoordinator::new(Arc::new(executor));
//! let context = ExecutionContext::new("linux-x86_64").with_binding("VERSION", "1.0.0");
//!
//! let report = coordinator
//!     .run_phase(&Phase::before("release"), &hooks, &context, &CancellationToken::new())
//!     .await;
//!
//! assert!(report.is_success());
//! assert_eq!(report.outcomes.len(), 2);
//! # }
//! ```

pub mod command;
pub mod condition;
pub mod context;
pub mod coordinator;
pub mod executor;
pub mod matrix;
pub mod platform;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod template;
pub mod types;
pub mod webhook;

// Re-export main types
pub use command::CommandExecutor;
pub use condition::{evaluate, Condition, EvaluationError};
pub use context::ExecutionContext;
pub use coordinator::ExecutionCoordinator;
pub use executor::{DryRunExecutor, Executor, FnExecutor};
pub use matrix::{expand, Matrix, MatrixAxis, MatrixError};
pub use platform::{accepts, host_platform, platform_matches};
pub use registry::HookSet;
pub use report::{HookSummary, InvocationOutcome, OutcomeStatus, PhaseReport, PhaseStatus};
pub use resolver::{resolve, Exclusion, Resolution, ResolvedCell, SkipReason};
pub use types::{Activation, Bindings, Filter, Hook, HookWhen, Invocation, Phase};
pub use webhook::WebhookExecutor;
