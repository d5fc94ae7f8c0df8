use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("action '{0}' doesn't exist")]
  UnknownAction(String),

  #[error("can't resolve any of the actions")]
  NoResolvableTarget,

  #[error("dependency cycle detected: {0}")]
  DependencyCycle(String),

  #[error("actions {0} are unreachable")]
  UnreachableActions(String),
}
