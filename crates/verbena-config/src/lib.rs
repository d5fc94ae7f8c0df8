//! Verbena Config
//!
//! This crate contains the declaration types for verbena workflows and the
//! parser that produces them from `.workflow` files.
//!
//! A declaration file holds exactly one `workflow` block and one or more
//! `action` blocks:
//!
//! ```text
//! workflow "ci" {
//!   resolves = ["deploy"]
//! }
//!
//! action "deploy" {
//!   uses = "docker://alpine:3.9"
//!   needs = ["build", "test"]
//! }
//! ```
//!
//! Loading validates every attribute against an allow-list and normalizes
//! multi-shape fields, so a `WorkflowDef` is only ever produced from a file
//! that passed schema validation in full. The graph itself (forward edges,
//! roots, stages) is built from these types by `verbena-workflow`.

mod action;
mod error;
mod parser;
mod value;
mod workflow;

pub use action::{ActionDef, VALID_ACTION_ATTRS};
pub use error::ConfigError;
pub use value::{Value, normalize_tokens};
pub use workflow::{VALID_WORKFLOW_ATTRS, WorkflowDef, load};
