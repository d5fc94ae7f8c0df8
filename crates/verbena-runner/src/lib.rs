//! Verbena Runner
//!
//! Drives resolved workflow files against an execution backend. The
//! orchestrator owns the per-file pipeline (parse, validate, graph build,
//! skip/filter surgery, reachability check, staged execution) and the
//! on-failure fallback, which re-runs a configured action when the backend
//! reports an execution failure. Validation errors are never retried.
//!
//! Actual container invocation sits behind the `ExecutionBackend` trait;
//! `ContainerBackend` is the docker/singularity implementation. Whether a
//! stage's actions actually run in parallel is the backend's business;
//! the orchestrator only hands over batches that are safe to.

mod backend;
mod container;
mod error;
mod runner;

pub use backend::{ContainerRuntime, ExecutionBackend, RunContext};
pub use container::ContainerBackend;
pub use error::RunnerError;
pub use runner::{RunOptions, WorkflowRunner};
