//! Per-file run orchestration.

use std::path::Path;

use tracing::{info, warn};
use verbena_workflow::{Action, Workflow};

use crate::backend::{ExecutionBackend, RunContext};
use crate::error::RunnerError;

/// What to run and what to leave out, resolved from the CLI.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// Run only this action instead of the whole workflow.
  pub action: Option<String>,
  /// Actions to disconnect before running.
  pub skip: Vec<String>,
  /// Retain the target's dependency closure when filtering.
  pub with_dependencies: bool,
  /// Action to run against the same file if the backend reports a failure.
  pub on_failure: Option<String>,
}

/// Orchestrates workflow files against an execution backend.
pub struct WorkflowRunner<B: ExecutionBackend> {
  backend: B,
}

impl<B: ExecutionBackend> WorkflowRunner<B> {
  pub fn new(backend: B) -> Self {
    Self { backend }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  /// Run one workflow file.
  ///
  /// A backend-reported execution failure is re-dispatched to the
  /// configured on-failure action with the skip list cleared; every other
  /// error propagates as-is. Validation errors are never retried.
  pub fn run_file(
    &self,
    wfile: &Path,
    opts: &RunOptions,
    ctx: &RunContext,
  ) -> Result<(), RunnerError> {
    let outcome = self.execute_file(
      wfile,
      opts.action.as_deref(),
      &opts.skip,
      opts.with_dependencies,
      ctx,
    );

    match outcome {
      Err(err) if err.is_execution_failure() => match &opts.on_failure {
        Some(fallback) => {
          warn!(
            error = %err,
            action = %fallback,
            "execution failed, running the on-failure action"
          );
          self.execute_file(wfile, Some(fallback), &[], opts.with_dependencies, ctx)
        }
        None => Err(err),
      },
      other => other,
    }
  }

  fn execute_file(
    &self,
    wfile: &Path,
    action: Option<&str>,
    skip: &[String],
    with_dependencies: bool,
    ctx: &RunContext,
  ) -> Result<(), RunnerError> {
    // A fresh workflow per invocation; all validation happens here.
    let def = verbena_config::load(wfile)?;
    let workflow = Workflow::from_def(def)?;

    let strict = !skip.is_empty();
    let mut workflow = if skip.is_empty() {
      workflow
    } else {
      workflow.skip(skip)
    };
    if let Some(target) = action {
      workflow = workflow.filter(target, with_dependencies)?;
    }
    workflow.validate_reachable(strict)?;

    if ctx.parallel {
      warn!("--parallel may result in interleaved output; use --quiet to avoid confusion");
    }
    self.backend.check_host(ctx)?;

    for stage in workflow.stages() {
      let actions: Vec<&Action> = stage.iter().filter_map(|id| workflow.action(id)).collect();
      self.backend.execute_stage(&actions, ctx)?;
    }

    match action {
      Some(target) => info!(action = %target, "action finished successfully"),
      None => info!(workflow = %workflow.name, "workflow finished successfully"),
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;
  use std::path::PathBuf;
  use std::sync::Mutex;

  use verbena_config::ConfigError;

  /// Records executed action ids and fails on request.
  #[derive(Default)]
  struct MockBackend {
    executed: Mutex<Vec<String>>,
    fail_on: Option<String>,
  }

  impl MockBackend {
    fn failing_on(action: &str) -> Self {
      Self {
        executed: Mutex::new(Vec::new()),
        fail_on: Some(action.to_string()),
      }
    }

    fn executed(&self) -> Vec<String> {
      self.executed.lock().unwrap().clone()
    }
  }

  impl ExecutionBackend for MockBackend {
    fn execute(&self, action: &Action, _ctx: &RunContext) -> Result<(), RunnerError> {
      self.executed.lock().unwrap().push(action.id.clone());
      if self.fail_on.as_deref() == Some(action.id.as_str()) {
        return Err(RunnerError::ExecutionFailed {
          action: action.id.clone(),
          code: 1,
        });
      }
      Ok(())
    }
  }

  const DIAMOND: &str = r#"
    workflow "ci" { resolves = ["c"] }
    action "r" { uses = "./r" }
    action "a" { uses = "./a" needs = "r" }
    action "b" { uses = "./b" needs = "r" }
    action "c" { uses = "./c" needs = ["a", "b"] }
  "#;

  fn write_workflow(source: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.workflow");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(source.as_bytes()).unwrap();
    (dir, path)
  }

  #[test]
  fn runs_actions_in_stage_order() {
    let (_dir, path) = write_workflow(DIAMOND);
    let runner = WorkflowRunner::new(MockBackend::default());
    runner
      .run_file(&path, &RunOptions::default(), &RunContext::default())
      .unwrap();
    assert_eq!(runner.backend().executed(), vec!["r", "a", "b", "c"]);
  }

  #[test]
  fn filters_to_a_single_action() {
    let (_dir, path) = write_workflow(DIAMOND);
    let runner = WorkflowRunner::new(MockBackend::default());
    let opts = RunOptions {
      action: Some("a".to_string()),
      ..RunOptions::default()
    };
    runner
      .run_file(&path, &opts, &RunContext::default())
      .unwrap();
    assert_eq!(runner.backend().executed(), vec!["a"]);
  }

  #[test]
  fn filters_with_dependencies() {
    let (_dir, path) = write_workflow(DIAMOND);
    let runner = WorkflowRunner::new(MockBackend::default());
    let opts = RunOptions {
      action: Some("a".to_string()),
      with_dependencies: true,
      ..RunOptions::default()
    };
    runner
      .run_file(&path, &opts, &RunContext::default())
      .unwrap();
    assert_eq!(runner.backend().executed(), vec!["r", "a"]);
  }

  #[test]
  fn skipped_actions_never_reach_the_backend() {
    let (_dir, path) = write_workflow(DIAMOND);
    let runner = WorkflowRunner::new(MockBackend::default());
    let opts = RunOptions {
      skip: vec!["b".to_string()],
      ..RunOptions::default()
    };
    runner
      .run_file(&path, &opts, &RunContext::default())
      .unwrap();
    assert_eq!(runner.backend().executed(), vec!["r", "a", "c"]);
  }

  #[test]
  fn execution_failure_propagates_without_on_failure() {
    let (_dir, path) = write_workflow(DIAMOND);
    let runner = WorkflowRunner::new(MockBackend::failing_on("a"));
    let err = runner
      .run_file(&path, &RunOptions::default(), &RunContext::default())
      .unwrap_err();
    assert!(err.is_execution_failure());
  }

  #[test]
  fn on_failure_action_runs_against_the_same_file() {
    let (_dir, path) = write_workflow(DIAMOND);
    let runner = WorkflowRunner::new(MockBackend::failing_on("a"));
    let opts = RunOptions {
      skip: vec!["b".to_string()],
      on_failure: Some("b".to_string()),
      ..RunOptions::default()
    };
    runner
      .run_file(&path, &opts, &RunContext::default())
      .unwrap();
    // The fallback run clears the skip list, so b is runnable again.
    let executed = runner.backend().executed();
    assert_eq!(executed.last().map(String::as_str), Some("b"));
  }

  #[test]
  fn validation_errors_are_not_retried() {
    let (_dir, path) = write_workflow(r#"workflow "ci" { resolves = "x" }"#);
    let runner = WorkflowRunner::new(MockBackend::default());
    let opts = RunOptions {
      on_failure: Some("b".to_string()),
      ..RunOptions::default()
    };
    let err = runner
      .run_file(&path, &opts, &RunContext::default())
      .unwrap_err();
    assert!(matches!(
      err,
      RunnerError::Config(ConfigError::NoActionBlocks)
    ));
    assert!(runner.backend().executed().is_empty());
  }

  #[test]
  fn strict_reachability_applies_when_skip_is_supplied() {
    let source = r#"
      workflow "ci" { resolves = ["c"] }
      action "r" { uses = "./r" }
      action "a" { uses = "./a" needs = "r" }
      action "c" { uses = "./c" needs = "a" }
    "#;
    let (_dir, path) = write_workflow(source);
    let runner = WorkflowRunner::new(MockBackend::default());
    let opts = RunOptions {
      skip: vec!["r".to_string()],
      ..RunOptions::default()
    };
    let err = runner
      .run_file(&path, &opts, &RunContext::default())
      .unwrap_err();
    assert!(matches!(
      err,
      RunnerError::Workflow(verbena_workflow::WorkflowError::UnreachableActions(_))
    ));
    assert!(runner.backend().executed().is_empty());
  }
}
