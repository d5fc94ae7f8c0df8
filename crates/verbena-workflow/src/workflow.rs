use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;
use verbena_config::WorkflowDef;

use crate::action::Action;
use crate::error::WorkflowError;
use crate::stages::Stages;

/// An executable workflow graph.
///
/// Built once from a `WorkflowDef` and treated as logically immutable:
/// the surgery operations (`skip`, `filter`) clone the whole graph and
/// return a new `Workflow`, so the original stays valid; the on-failure
/// path relies on that to re-run a different action against the same
/// declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
  pub name: String,
  pub on: String,
  pub resolves: Vec<String>,
  pub actions: BTreeMap<String, Action>,
  /// Actions with no unmet dependency. Derived.
  pub root: BTreeSet<String>,
  /// Ids deliberately excluded by `skip`, exempt from reachability failure.
  pub skipped: BTreeSet<String>,
}

impl Workflow {
  /// Build the graph from a validated declaration.
  ///
  /// Fails if no resolve target exists among the defined actions, if any
  /// `needs` or `resolves` entry references an undefined action, or if the
  /// authored dependencies contain a cycle.
  pub fn from_def(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let actions: BTreeMap<String, Action> = def
      .actions
      .into_values()
      .map(|action| (action.id.clone(), Action::from(action)))
      .collect();

    let mut workflow = Self {
      name: def.name,
      on: def.on,
      resolves: def.resolves,
      actions,
      root: BTreeSet::new(),
      skipped: BTreeSet::new(),
    };
    workflow.complete_graph()?;
    Ok(workflow)
  }

  /// Get an action by id.
  pub fn action(&self, id: &str) -> Option<&Action> {
    self.actions.get(id)
  }

  /// Iterate over stages of mutually-independent actions, starting at the
  /// root set. Dropping the iterator early is the cancellation mechanism.
  pub fn stages(&self) -> Stages<'_> {
    Stages::new(self)
  }

  /// Materialize forward edges and the root set from the backward `needs`
  /// pointers, walking from every resolve target.
  ///
  /// The walk deliberately revisits shared dependencies on every path that
  /// reaches them; `next` has set semantics so revisits are idempotent.
  /// Cycles are rejected up front, otherwise the recursion would be
  /// unbounded.
  fn complete_graph(&mut self) -> Result<(), WorkflowError> {
    if !self.resolves.iter().any(|id| self.actions.contains_key(id)) {
      return Err(WorkflowError::NoResolvableTarget);
    }
    self.detect_cycle()?;
    for target in self.resolves.clone() {
      self.add_forward_edges(&target)?;
    }
    Ok(())
  }

  fn add_forward_edges(&mut self, node: &str) -> Result<(), WorkflowError> {
    let needs: Vec<String> = match self.actions.get(node) {
      Some(action) => action.needs.iter().cloned().collect(),
      None => return Err(WorkflowError::UnknownAction(node.to_string())),
    };

    if needs.is_empty() {
      self.root.insert(node.to_string());
      return Ok(());
    }

    for need in needs {
      self.add_forward_edges(&need)?;
      if let Some(dependency) = self.actions.get_mut(&need) {
        dependency.next.insert(node.to_string());
      }
    }
    Ok(())
  }

  /// Visited-state depth-first search over the authored `needs` edges.
  /// References to undefined actions are ignored here; the forward-edge
  /// walk reports those.
  fn detect_cycle(&self) -> Result<(), WorkflowError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
      InProgress,
      Done,
    }

    fn visit<'a>(
      actions: &'a BTreeMap<String, Action>,
      id: &'a str,
      marks: &mut BTreeMap<&'a str, Mark>,
      path: &mut Vec<&'a str>,
    ) -> Result<(), WorkflowError> {
      match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
          let start = path.iter().position(|entry| *entry == id).unwrap_or(0);
          let mut cycle: Vec<&str> = path[start..].to_vec();
          cycle.push(id);
          return Err(WorkflowError::DependencyCycle(cycle.join(" -> ")));
        }
        None => {}
      }

      marks.insert(id, Mark::InProgress);
      path.push(id);
      if let Some(action) = actions.get(id) {
        for need in &action.needs {
          visit(actions, need, marks, path)?;
        }
      }
      path.pop();
      marks.insert(id, Mark::Done);
      Ok(())
    }

    let mut marks = BTreeMap::new();
    let mut path = Vec::new();
    for id in self.actions.keys() {
      visit(&self.actions, id, &mut marks, &mut path)?;
    }
    Ok(())
  }

  /// Check for actions no execution path can reach.
  ///
  /// Forward-walks from the root set via `next`; anything not reached and
  /// not deliberately skipped is unreachable. In strict mode (the caller
  /// supplied an explicit skip list) this fails listing the ids; otherwise
  /// the actions are pruned from the live graph with a warning. This is
  /// the only place pruning happens outside explicit skip/filter calls.
  pub fn validate_reachable(&mut self, strict: bool) -> Result<(), WorkflowError> {
    let mut reachable: BTreeSet<String> = BTreeSet::new();
    let mut frontier: Vec<String> = self.root.iter().cloned().collect();
    while let Some(id) = frontier.pop() {
      if !reachable.insert(id.clone()) {
        continue;
      }
      if let Some(action) = self.actions.get(&id) {
        frontier.extend(action.next.iter().cloned());
      }
    }

    let unreachable: Vec<String> = self
      .actions
      .keys()
      .filter(|id| !reachable.contains(*id) && !self.skipped.contains(*id))
      .cloned()
      .collect();
    if unreachable.is_empty() {
      return Ok(());
    }

    if strict {
      return Err(WorkflowError::UnreachableActions(unreachable.join(", ")));
    }

    warn!(
      workflow = %self.name,
      actions = %unreachable.join(", "),
      "unreachable actions pruned from the graph"
    );
    for id in &unreachable {
      self.actions.remove(id);
      self.root.remove(id);
    }
    // Strip dangling references so survivors never point at a pruned id.
    for action in self.actions.values_mut() {
      for id in &unreachable {
        action.next.remove(id);
        action.needs.remove(id);
      }
    }
    Ok(())
  }
}
