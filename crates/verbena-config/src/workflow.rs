use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::ActionDef;
use crate::error::ConfigError;
use crate::parser::{Block, parse_blocks};
use crate::value::{Value, normalize_tokens};

/// Attributes the workflow block may carry.
pub const VALID_WORKFLOW_ATTRS: &[&str] = &["resolves", "on"];

const DEFAULT_TRIGGER: &str = "push";

/// A validated workflow declaration: one workflow block plus its actions.
///
/// This is the parse-time view. Forward edges and the root set are derived
/// from it by `verbena-workflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub name: String,
  pub on: String,
  pub resolves: Vec<String>,
  pub actions: BTreeMap<String, ActionDef>,
}

/// Load and validate a workflow declaration from a file.
pub fn load(path: &Path) -> Result<WorkflowDef, ConfigError> {
  let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
    path: path.display().to_string(),
    source,
  })?;
  WorkflowDef::parse(&source)
}

impl WorkflowDef {
  /// Parse and validate a workflow declaration from source text.
  ///
  /// Validation order follows the loader this format comes from: block
  /// composition first (workflow block count, presence of actions,
  /// duplicate action ids), then workflow attributes, then each action's
  /// attributes. Any failure aborts the whole load.
  pub fn parse(source: &str) -> Result<Self, ConfigError> {
    let blocks = parse_blocks(source)?;

    let mut workflow_blocks: Vec<Block> = Vec::new();
    let mut action_blocks: Vec<Block> = Vec::new();
    for block in blocks {
      if block.kind == "workflow" {
        workflow_blocks.push(block);
      } else {
        action_blocks.push(block);
      }
    }

    let workflow_block = match workflow_blocks.len() {
      1 => workflow_blocks.remove(0),
      count => return Err(ConfigError::WorkflowBlockCount(count)),
    };

    if action_blocks.is_empty() {
      return Err(ConfigError::NoActionBlocks);
    }

    let mut raw_actions: BTreeMap<String, Block> = BTreeMap::new();
    for block in action_blocks {
      raw_actions.insert(block.name.clone(), block);
    }

    // Duplicate ids collapse in the map above, so the parsed count is
    // compared against a literal scan for action-declaration lines.
    let declared = source
      .lines()
      .filter(|line| line.trim().starts_with("action "))
      .count();
    if raw_actions.len() != declared {
      return Err(ConfigError::DuplicateActionIds);
    }

    let (name, on, resolves) = validate_workflow_block(workflow_block)?;

    let mut actions = BTreeMap::new();
    for (id, block) in raw_actions {
      let action = ActionDef::from_attrs(id.clone(), block.attrs)?;
      actions.insert(id, action);
    }

    Ok(Self {
      name,
      on,
      resolves,
      actions,
    })
  }
}

fn validate_workflow_block(mut block: Block) -> Result<(String, String, Vec<String>), ConfigError> {
  for key in block.attrs.keys() {
    if !VALID_WORKFLOW_ATTRS.contains(&key.as_str()) {
      return Err(ConfigError::UnknownAttribute {
        block: "workflow",
        key: key.clone(),
      });
    }
  }

  let resolves = match block.attrs.remove("resolves") {
    Some(value) => normalize_tokens(&value).ok_or(ConfigError::WrongShape {
      key: "resolves".to_string(),
      expected: "a string or a list",
    })?,
    None => Vec::new(),
  };
  if resolves.is_empty() {
    return Err(ConfigError::MissingAttribute {
      block: "workflow",
      key: "resolves",
    });
  }

  let on = match block.attrs.remove("on") {
    None => DEFAULT_TRIGGER.to_string(),
    Some(Value::Str(on)) => on,
    Some(_) => {
      return Err(ConfigError::WrongShape {
        key: "on".to_string(),
        expected: "a string",
      });
    }
  };

  Ok((block.name, on, resolves))
}
