//! Docker/singularity command backend.
//!
//! Thin by design: remote-repository import and image cache management are
//! external collaborators, so an action's `uses` reference (minus an
//! optional `docker://` prefix) is handed to the runtime as the image name.

use std::process::{Command, Stdio};

use tracing::{debug, info};
use verbena_workflow::Action;

use crate::backend::{ContainerRuntime, ExecutionBackend, RunContext};
use crate::error::RunnerError;

#[derive(Debug, Default)]
pub struct ContainerBackend;

impl ContainerBackend {
  pub fn new() -> Self {
    Self
  }

  fn image_for(action: &Action) -> &str {
    action.uses.strip_prefix("docker://").unwrap_or(&action.uses)
  }

  fn pull_image(&self, action: &Action, ctx: &RunContext) -> Result<(), RunnerError> {
    if ctx.skip_pull || ctx.runtime != ContainerRuntime::Docker {
      return Ok(());
    }
    let image = Self::image_for(action);
    debug!(action = %action.id, image = %image, "pulling image");
    let status = Command::new("docker")
      .arg("pull")
      .arg(image)
      .stdout(Stdio::null())
      .status()
      .map_err(|err| RunnerError::Backend {
        action: action.id.clone(),
        message: err.to_string(),
      })?;
    if !status.success() {
      return Err(RunnerError::Backend {
        action: action.id.clone(),
        message: format!(
          "pull of '{image}' exited with status {}",
          status.code().unwrap_or(-1)
        ),
      });
    }
    Ok(())
  }

  /// Resolve each declared secret from the host environment.
  fn secrets_for(action: &Action) -> Result<Vec<(String, String)>, RunnerError> {
    action
      .secrets
      .iter()
      .map(|secret| match std::env::var(secret) {
        Ok(value) => Ok((secret.clone(), value)),
        Err(_) => Err(RunnerError::MissingSecret {
          action: action.id.clone(),
          secret: secret.clone(),
        }),
      })
      .collect()
  }

  fn command_for(&self, action: &Action, ctx: &RunContext) -> Result<Command, RunnerError> {
    let image = Self::image_for(action);
    let secrets = Self::secrets_for(action)?;
    let mut cmd = Command::new(ctx.runtime.binary());

    match ctx.runtime {
      ContainerRuntime::Docker => {
        cmd.arg("run");
        if !ctx.reuse {
          cmd.arg("--rm");
        }
        cmd
          .arg("--volume")
          .arg(format!("{}:/workspace", ctx.workspace.display()))
          .arg("--workdir")
          .arg("/workspace");
        for (key, value) in &action.env {
          cmd.arg("--env").arg(format!("{key}={value}"));
        }
        for (key, value) in &secrets {
          cmd.arg("--env").arg(format!("{key}={value}"));
        }
        if let Some(entrypoint) = action.runs.first() {
          cmd.arg("--entrypoint").arg(entrypoint);
        }
        cmd.arg(image);
        if action.runs.len() > 1 {
          cmd.args(&action.runs[1..]);
        }
        cmd.args(&action.args);
      }
      ContainerRuntime::Singularity => {
        cmd
          .arg("exec")
          .arg("--pwd")
          .arg("/workspace")
          .arg("--bind")
          .arg(format!("{}:/workspace", ctx.workspace.display()))
          .arg(format!("docker://{image}"));
        cmd.args(&action.runs);
        cmd.args(&action.args);
        for (key, value) in &action.env {
          cmd.env(format!("SINGULARITYENV_{key}"), value);
        }
        for (key, value) in &secrets {
          cmd.env(format!("SINGULARITYENV_{key}"), value);
        }
      }
    }

    if ctx.quiet {
      cmd.stdout(Stdio::null());
    }
    Ok(cmd)
  }
}

impl ExecutionBackend for ContainerBackend {
  fn execute(&self, action: &Action, ctx: &RunContext) -> Result<(), RunnerError> {
    if ctx.dry_run {
      info!(action = %action.id, uses = %action.uses, "dry-run, skipping execution");
      return Ok(());
    }

    self.pull_image(action, ctx)?;

    info!(action = %action.id, uses = %action.uses, "running action");
    let mut cmd = self.command_for(action, ctx)?;
    let status = cmd.status().map_err(|err| RunnerError::Backend {
      action: action.id.clone(),
      message: err.to_string(),
    })?;

    if !status.success() {
      return Err(RunnerError::ExecutionFailed {
        action: action.id.clone(),
        code: status.code().unwrap_or(-1),
      });
    }
    Ok(())
  }

  fn execute_stage(&self, stage: &[&Action], ctx: &RunContext) -> Result<(), RunnerError> {
    if !ctx.parallel || stage.len() <= 1 {
      for action in stage {
        self.execute(action, ctx)?;
      }
      return Ok(());
    }

    std::thread::scope(|scope| {
      let handles: Vec<_> = stage
        .iter()
        .map(|action| {
          let action = *action;
          (action.id.clone(), scope.spawn(move || self.execute(action, ctx)))
        })
        .collect();

      let mut first_failure = None;
      for (id, handle) in handles {
        let outcome = match handle.join() {
          Ok(outcome) => outcome,
          Err(_) => Err(RunnerError::Backend {
            action: id,
            message: "executor thread panicked".to_string(),
          }),
        };
        if let Err(err) = outcome {
          first_failure.get_or_insert(err);
        }
      }
      match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
      }
    })
  }

  fn check_host(&self, ctx: &RunContext) -> Result<(), RunnerError> {
    if ctx.dry_run {
      return Ok(());
    }
    which::which(ctx.runtime.binary()).map_err(|_| RunnerError::RuntimeUnavailable {
      runtime: ctx.runtime.binary(),
    })?;
    Ok(())
  }
}
