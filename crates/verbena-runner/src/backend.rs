use std::fmt;
use std::path::PathBuf;

use verbena_workflow::Action;

use crate::error::RunnerError;

/// Which container runtime executes actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerRuntime {
  #[default]
  Docker,
  Singularity,
}

impl ContainerRuntime {
  /// Name of the host binary this runtime requires.
  pub fn binary(&self) -> &'static str {
    match self {
      ContainerRuntime::Docker => "docker",
      ContainerRuntime::Singularity => "singularity",
    }
  }
}

impl fmt::Display for ContainerRuntime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.binary())
  }
}

/// Runtime flags for one invocation, passed explicitly into the
/// orchestrator rather than held in process-wide state.
#[derive(Debug, Clone)]
pub struct RunContext {
  /// Host directory mounted as the action workspace.
  pub workspace: PathBuf,
  /// Persist container state between executions.
  pub reuse: bool,
  /// Resolve and stage everything but execute nothing.
  pub dry_run: bool,
  /// Allow the backend to run a stage's actions concurrently.
  pub parallel: bool,
  /// Suppress output generated by actions.
  pub quiet: bool,
  /// Skip pulling container images.
  pub skip_pull: bool,
  /// Skip cloning remote action repositories.
  pub skip_clone: bool,
  pub runtime: ContainerRuntime,
}

impl Default for RunContext {
  fn default() -> Self {
    Self {
      workspace: PathBuf::from("."),
      reuse: false,
      dry_run: false,
      parallel: false,
      quiet: false,
      skip_pull: false,
      skip_clone: false,
      runtime: ContainerRuntime::default(),
    }
  }
}

/// The execution seam between the graph engine and whatever actually runs
/// actions.
///
/// The orchestrator guarantees that actions handed to `execute_stage`
/// have no dependency relation among them; the backend is free to run
/// them in any order or in parallel.
pub trait ExecutionBackend {
  /// Execute a single action.
  fn execute(&self, action: &Action, ctx: &RunContext) -> Result<(), RunnerError>;

  /// Execute one stage. The default runs actions sequentially in order.
  fn execute_stage(&self, stage: &[&Action], ctx: &RunContext) -> Result<(), RunnerError> {
    for action in stage {
      self.execute(action, ctx)?;
    }
    Ok(())
  }

  /// Gate on minimum host capability before any execution starts.
  fn check_host(&self, _ctx: &RunContext) -> Result<(), RunnerError> {
    Ok(())
  }
}
