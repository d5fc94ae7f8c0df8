//! Workflow-file discovery.
//!
//! A token names a workflow file purely by its suffix; anything else is an
//! action name. When no file is given on the command line, the default
//! location is `main.workflow` in the base directory (or the legacy
//! `.github/main.workflow`); recursive mode picks up every `*.workflow`
//! under the base directory.

use std::path::{Path, PathBuf};

use glob::glob;

use crate::options::OptionError;

pub const WORKFLOW_SUFFIX: &str = ".workflow";

/// Whether a command-line token refers to a workflow file.
pub fn is_workflow_file(token: &str) -> bool {
  token.ends_with(WORKFLOW_SUFFIX)
}

/// The default workflow file for a directory.
pub fn find_default(base: &Path) -> Result<Vec<PathBuf>, OptionError> {
  for candidate in [
    base.join("main.workflow"),
    base.join(".github").join("main.workflow"),
  ] {
    if candidate.is_file() {
      return Ok(vec![candidate]);
    }
  }
  Err(OptionError::NoDefaultWorkflow(base.display().to_string()))
}

/// Every `*.workflow` file under the base directory, sorted.
pub fn find_recursive(base: &Path) -> Result<Vec<PathBuf>, OptionError> {
  let pattern = base.join("**").join("*.workflow");
  let entries = glob(&pattern.to_string_lossy())
    .map_err(|err| OptionError::Discovery(err.to_string()))?;
  let mut files: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
  files.sort();
  Ok(files)
}
