use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use verbena_config::ActionDef;

/// A named unit of work in the graph.
///
/// `needs` is authored; `next` is always derived by the graph builder and
/// never user-supplied. An action is owned by exactly one `Workflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
  pub id: String,
  pub uses: String,
  pub needs: BTreeSet<String>,
  pub next: BTreeSet<String>,
  pub args: Vec<String>,
  pub runs: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub secrets: Vec<String>,
}

impl From<ActionDef> for Action {
  fn from(def: ActionDef) -> Self {
    Self {
      id: def.id,
      uses: def.uses,
      needs: def.needs.into_iter().collect(),
      next: BTreeSet::new(),
      args: def.args,
      runs: def.runs,
      env: def.env,
      secrets: def.secrets,
    }
  }
}
