//! Staged-execution generation.
//!
//! A stage is a batch of actions with no dependency relation among them:
//! the contract to any backend is that actions within one stage may run in
//! any order or in parallel. Generation is pure and performs no I/O;
//! consuming the iterator is the only way to advance it, and dropping it
//! early is a valid cancellation.

use std::collections::BTreeSet;

use crate::workflow::Workflow;

/// An ordered batch of mutually-independent action ids.
pub type Stage = Vec<String>;

/// Ready-set frontier over the forward graph.
///
/// Starts at the root set. After a stage is yielded, its actions' `next`
/// targets become pending; a pending action is admitted to a later stage
/// only once every one of its dependencies has appeared in a strictly
/// earlier stage. Each action is therefore yielded exactly once and never
/// before all of its dependencies.
pub struct Stages<'a> {
  workflow: &'a Workflow,
  emitted: BTreeSet<String>,
  pending: BTreeSet<String>,
  frontier: Vec<String>,
}

impl<'a> Stages<'a> {
  pub(crate) fn new(workflow: &'a Workflow) -> Self {
    Self {
      workflow,
      emitted: BTreeSet::new(),
      pending: BTreeSet::new(),
      frontier: workflow.root.iter().cloned().collect(),
    }
  }

  fn is_ready(&self, id: &str) -> bool {
    self
      .workflow
      .action(id)
      .is_some_and(|action| action.needs.iter().all(|need| self.emitted.contains(need)))
  }
}

impl Iterator for Stages<'_> {
  type Item = Stage;

  fn next(&mut self) -> Option<Stage> {
    if self.frontier.is_empty() {
      return None;
    }
    let stage = std::mem::take(&mut self.frontier);

    for id in &stage {
      self.emitted.insert(id.clone());
    }
    for id in &stage {
      if let Some(action) = self.workflow.action(id) {
        for next in &action.next {
          if !self.emitted.contains(next) {
            self.pending.insert(next.clone());
          }
        }
      }
    }

    let ready: Vec<String> = self
      .pending
      .iter()
      .filter(|id| self.is_ready(id))
      .cloned()
      .collect();
    for id in &ready {
      self.pending.remove(id);
    }
    self.frontier = ready;

    Some(stage)
  }
}
