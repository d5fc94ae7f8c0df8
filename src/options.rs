//! CLI option resolution.
//!
//! Maps the four interacting run flags (positional target, skip list,
//! `--with-dependencies`, `--recursive`) onto a concrete plan: which
//! workflow files to run, which action to filter to, and which actions to
//! skip. Every contradictory combination fails here, before any workflow
//! is constructed.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::discover::{find_default, find_recursive, is_workflow_file};

#[derive(Debug, Error)]
pub enum OptionError {
  #[error("this arrangement of workflow files and actions does not make any sense")]
  InvalidCombination,

  #[error("cannot use --with-dependencies when no action argument is passed")]
  WithDependenciesWithoutAction,

  #[error("cannot run in recursive mode when a workflow file is passed")]
  RecursiveWithWorkflowFile,

  #[error("cannot specify an action to run in recursive mode")]
  RecursiveWithAction,

  #[error("cannot skip workflow files in non-recursive mode")]
  SkipWorkflowsWithoutRecursive,

  #[error("unable to find a main.workflow file under '{0}'")]
  NoDefaultWorkflow(String),

  #[error("workflow discovery failed: {0}")]
  Discovery(String),
}

/// What the CLI flags resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
  /// Workflow files to run, in order.
  pub files: Vec<PathBuf>,
  /// Action to filter each workflow down to, if any.
  pub action: Option<String>,
  /// Actions to disconnect via graph surgery, if any.
  pub skip_actions: Vec<String>,
}

/// The raw flag values the decision table consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunRequest<'a> {
  pub target: Option<&'a str>,
  pub skip: &'a [String],
  pub with_dependencies: bool,
  pub recursive: bool,
}

/// A skip list is a workflow-file list only when every entry looks like one.
fn skips_are_workflow_files(skip: &[String]) -> bool {
  !skip.is_empty() && skip.iter().all(|entry| is_workflow_file(entry))
}

/// Resolve the decision table over (target, skip, with-dependencies,
/// recursive). `base` is the directory discovery operates from.
pub fn resolve(request: &RunRequest, base: &Path) -> Result<ResolvedRun, OptionError> {
  let RunRequest {
    target,
    skip,
    with_dependencies,
    recursive,
  } = *request;

  match (target, skip.is_empty()) {
    // Both a target and a skip list: only a workflow file with action
    // skips makes sense, and there is no action to take dependencies of.
    (Some(target), false) => {
      if !is_workflow_file(target) || skips_are_workflow_files(skip) {
        return Err(OptionError::InvalidCombination);
      }
      if with_dependencies {
        return Err(OptionError::WithDependenciesWithoutAction);
      }
      Ok(ResolvedRun {
        files: vec![PathBuf::from(target)],
        action: None,
        skip_actions: skip.to_vec(),
      })
    }

    // A target alone: a workflow file runs as-is, an action name runs
    // against the default file set.
    (Some(target), true) => {
      if is_workflow_file(target) {
        if with_dependencies {
          return Err(OptionError::WithDependenciesWithoutAction);
        }
        if recursive {
          return Err(OptionError::RecursiveWithWorkflowFile);
        }
        Ok(ResolvedRun {
          files: vec![PathBuf::from(target)],
          action: None,
          skip_actions: Vec::new(),
        })
      } else {
        if recursive {
          return Err(OptionError::RecursiveWithAction);
        }
        Ok(ResolvedRun {
          files: find_default(base)?,
          action: Some(target.to_string()),
          skip_actions: Vec::new(),
        })
      }
    }

    // A skip list alone: either whole workflow files are dropped from the
    // recursive set, or actions are skipped later by graph surgery.
    (None, false) => {
      if skips_are_workflow_files(skip) {
        if !recursive {
          return Err(OptionError::SkipWorkflowsWithoutRecursive);
        }
        let mut files = find_recursive(base)?;
        files.retain(|file| {
          let relative = file.strip_prefix(base).unwrap_or(file);
          !skip
            .iter()
            .any(|entry| relative == Path::new(entry) || file == Path::new(entry))
        });
        Ok(ResolvedRun {
          files,
          action: None,
          skip_actions: Vec::new(),
        })
      } else {
        let files = if recursive {
          find_recursive(base)?
        } else {
          find_default(base)?
        };
        Ok(ResolvedRun {
          files,
          action: None,
          skip_actions: skip.to_vec(),
        })
      }
    }

    // Neither: run everything discovery finds.
    (None, true) => {
      if with_dependencies {
        return Err(OptionError::WithDependenciesWithoutAction);
      }
      let files = if recursive {
        find_recursive(base)?
      } else {
        find_default(base)?
      };
      Ok(ResolvedRun {
        files,
        action: None,
        skip_actions: Vec::new(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn base_with(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
      let path = dir.path().join(file);
      if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
      }
      fs::write(path, "").unwrap();
    }
    dir
  }

  fn strings(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn workflow_file_alone() {
    let dir = base_with(&[]);
    let resolved = resolve(
      &RunRequest {
        target: Some("build.workflow"),
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(resolved.files, vec![PathBuf::from("build.workflow")]);
    assert_eq!(resolved.action, None);
    assert!(resolved.skip_actions.is_empty());
  }

  #[test]
  fn action_alone_uses_the_default_file_set() {
    let dir = base_with(&["main.workflow"]);
    let resolved = resolve(
      &RunRequest {
        target: Some("deploy"),
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(resolved.files, vec![dir.path().join("main.workflow")]);
    assert_eq!(resolved.action.as_deref(), Some("deploy"));
  }

  #[test]
  fn action_with_dependencies_is_allowed() {
    let dir = base_with(&["main.workflow"]);
    let resolved = resolve(
      &RunRequest {
        target: Some("deploy"),
        with_dependencies: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(resolved.action.as_deref(), Some("deploy"));
  }

  #[test]
  fn skip_actions_in_recursive_mode() {
    let dir = base_with(&["one.workflow", "sub/two.workflow"]);
    let skip = strings(&["lint"]);
    let resolved = resolve(
      &RunRequest {
        skip: &skip,
        recursive: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(
      resolved.files,
      vec![
        dir.path().join("one.workflow"),
        dir.path().join("sub/two.workflow"),
      ]
    );
    assert_eq!(resolved.action, None);
    assert_eq!(resolved.skip_actions, vec!["lint"]);
  }

  #[test]
  fn skip_actions_in_default_mode() {
    let dir = base_with(&["main.workflow"]);
    let skip = strings(&["lint"]);
    let resolved = resolve(
      &RunRequest {
        skip: &skip,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(resolved.files, vec![dir.path().join("main.workflow")]);
    assert_eq!(resolved.skip_actions, vec!["lint"]);
  }

  #[test]
  fn skip_workflow_files_requires_recursive() {
    let dir = base_with(&["one.workflow"]);
    let skip = strings(&["one.workflow"]);
    let err = resolve(
      &RunRequest {
        skip: &skip,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, OptionError::SkipWorkflowsWithoutRecursive));
  }

  #[test]
  fn skipped_workflow_files_are_subtracted_from_the_recursive_set() {
    let dir = base_with(&["one.workflow", "sub/two.workflow"]);
    let skip = strings(&["sub/two.workflow"]);
    let resolved = resolve(
      &RunRequest {
        skip: &skip,
        recursive: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(resolved.files, vec![dir.path().join("one.workflow")]);
  }

  #[test]
  fn workflow_file_with_action_skips() {
    let dir = base_with(&[]);
    let skip = strings(&["lint", "docs"]);
    let resolved = resolve(
      &RunRequest {
        target: Some("x.workflow"),
        skip: &skip,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(resolved.files, vec![PathBuf::from("x.workflow")]);
    assert_eq!(resolved.skip_actions, vec!["lint", "docs"]);
  }

  #[test]
  fn workflow_file_with_skips_and_dependencies_conflicts() {
    let dir = base_with(&[]);
    let skip = strings(&["y"]);
    let err = resolve(
      &RunRequest {
        target: Some("x.workflow"),
        skip: &skip,
        with_dependencies: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, OptionError::WithDependenciesWithoutAction));
  }

  #[test]
  fn workflow_file_target_with_workflow_skips_conflicts() {
    let dir = base_with(&[]);
    let skip = strings(&["y.workflow"]);
    let err = resolve(
      &RunRequest {
        target: Some("x.workflow"),
        skip: &skip,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, OptionError::InvalidCombination));
  }

  #[test]
  fn recursive_with_workflow_file_conflicts() {
    let dir = base_with(&[]);
    let err = resolve(
      &RunRequest {
        target: Some("x.workflow"),
        recursive: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, OptionError::RecursiveWithWorkflowFile));
  }

  #[test]
  fn recursive_with_action_conflicts() {
    let dir = base_with(&["main.workflow"]);
    let err = resolve(
      &RunRequest {
        target: Some("deploy"),
        recursive: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, OptionError::RecursiveWithAction));
  }

  #[test]
  fn bare_run_uses_default_or_recursive_discovery() {
    let dir = base_with(&["main.workflow", "sub/two.workflow"]);
    let default = resolve(&RunRequest::default(), dir.path()).unwrap();
    assert_eq!(default.files, vec![dir.path().join("main.workflow")]);

    let recursive = resolve(
      &RunRequest {
        recursive: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap();
    assert_eq!(
      recursive.files,
      vec![
        dir.path().join("main.workflow"),
        dir.path().join("sub/two.workflow"),
      ]
    );
  }

  #[test]
  fn bare_run_with_dependencies_conflicts() {
    let dir = base_with(&["main.workflow"]);
    let err = resolve(
      &RunRequest {
        with_dependencies: true,
        ..RunRequest::default()
      },
      dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, OptionError::WithDependenciesWithoutAction));
  }
}
