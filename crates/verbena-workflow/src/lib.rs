//! Verbena Workflow
//!
//! This crate provides the executable graph representation for verbena.
//! A `Workflow` is built once from a validated `WorkflowDef` and is
//! logically immutable afterwards.
//!
//! Building materializes the view the declaration leaves implicit: authors
//! state dependencies backward ("what I need"), so the builder walks the
//! `needs` pointers from every resolve target, records the forward `next`
//! edges, and collects the root set. From there the crate offers:
//!
//! - `Workflow::stages()`: batches of mutually-independent actions in
//!   dependency order, for concurrent execution
//! - `Workflow::skip()` / `Workflow::filter()`: structural transforms for
//!   partial re-execution; both clone the graph and return a new workflow
//! - `Workflow::validate_reachable()`: detects actions no execution path
//!   can reach and prunes or rejects them
//!
//! The engine is single-threaded and synchronous; nothing here performs
//! I/O or blocks.

mod action;
mod error;
mod stages;
mod surgery;
mod workflow;

pub use action::Action;
pub use error::WorkflowError;
pub use stages::{Stage, Stages};
pub use workflow::Workflow;
