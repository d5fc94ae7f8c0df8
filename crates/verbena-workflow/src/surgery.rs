//! Structural transforms for partial re-execution.
//!
//! Both transforms copy the whole graph and return a new consistent
//! `Workflow`; the original is never mutated.

use std::collections::BTreeSet;

use crate::error::WorkflowError;
use crate::workflow::Workflow;

impl Workflow {
  /// Disconnect a set of actions from the graph.
  ///
  /// Each skipped action has its own `next`/`needs` cleared, is removed
  /// from the root set, and is stripped from every other action's edges.
  /// Skipped actions remain in `actions`, disconnected rather than
  /// deleted, and are recorded in the returned workflow's skip list so a
  /// later reachability check can tell "deliberately skipped" from
  /// "accidentally unreachable". Postcondition: no surviving action
  /// references a skipped id.
  pub fn skip(&self, skip_list: &[String]) -> Workflow {
    let mut workflow = self.clone();
    for id in skip_list {
      if let Some(action) = workflow.actions.get_mut(id) {
        action.next.clear();
        action.needs.clear();
      }
      workflow.root.remove(id);

      for (other_id, other) in workflow.actions.iter_mut() {
        if other_id == id {
          continue;
        }
        other.next.remove(id);
        other.needs.remove(id);
      }

      workflow.skipped.insert(id.clone());
    }
    workflow
  }

  /// Filter the graph down to one action.
  ///
  /// With dependencies, the target's whole dependency closure is retained
  /// and re-rooted; without, the target is isolated and becomes the only
  /// root. Postcondition in both modes: no surviving edge references a
  /// deleted id.
  pub fn filter(&self, target: &str, with_dependencies: bool) -> Result<Workflow, WorkflowError> {
    let mut workflow = self.clone();
    if !workflow.actions.contains_key(target) {
      return Err(WorkflowError::UnknownAction(target.to_string()));
    }

    let mut required: BTreeSet<String> = BTreeSet::new();
    if with_dependencies {
      // The target plus its transitive needs. The graph is cycle-free by
      // construction, so the walk terminates.
      let mut frontier = vec![target.to_string()];
      while let Some(id) = frontier.pop() {
        if !required.insert(id.clone()) {
          continue;
        }
        if let Some(action) = workflow.actions.get(&id) {
          frontier.extend(action.needs.iter().cloned());
        }
      }

      // Re-root any required action with no required dependency and strip
      // next edges that leave the closure.
      for (id, action) in workflow.actions.iter_mut() {
        if !required.contains(id) {
          continue;
        }
        if action.needs.is_empty() {
          workflow.root.insert(id.clone());
        }
        action.next.retain(|next| required.contains(next));
      }
    } else {
      required.insert(target.to_string());
      if let Some(action) = workflow.actions.get_mut(target) {
        action.next.clear();
        action.needs.clear();
      }
      workflow.root.insert(target.to_string());
    }

    workflow.root.retain(|id| required.contains(id));
    workflow.actions.retain(|id, _| required.contains(id));
    Ok(workflow)
  }
}
