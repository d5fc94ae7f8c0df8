use thiserror::Error;
use verbena_config::ConfigError;
use verbena_workflow::WorkflowError;

#[derive(Debug, Error)]
pub enum RunnerError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Workflow(#[from] WorkflowError),

  #[error("container runtime '{runtime}' is not available on this host")]
  RuntimeUnavailable { runtime: &'static str },

  #[error("secret '{secret}' for action '{action}' is not defined in the environment")]
  MissingSecret { action: String, secret: String },

  #[error("failed to invoke the backend for action '{action}': {message}")]
  Backend { action: String, message: String },

  #[error("action '{action}' exited with status {code}")]
  ExecutionFailed { action: String, code: i32 },
}

impl RunnerError {
  /// Whether this is a backend-reported execution failure, the only kind
  /// the on-failure fallback is allowed to intercept.
  pub fn is_execution_failure(&self) -> bool {
    matches!(self, RunnerError::ExecutionFailed { .. })
  }
}
