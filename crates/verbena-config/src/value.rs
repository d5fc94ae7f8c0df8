use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw attribute value as it appears in a declaration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Str(String),
  List(Vec<String>),
  Map(BTreeMap<String, String>),
}

impl Value {
  /// Human-readable shape name, used in validation errors.
  pub fn shape(&self) -> &'static str {
    match self {
      Value::Str(_) => "a string",
      Value::List(_) => "a list",
      Value::Map(_) => "a mapping",
    }
  }
}

/// Normalize a token-sequence attribute into a flat list of tokens.
///
/// A string is split on whitespace. A list is joined with spaces and
/// re-split, so an element containing internal whitespace is exploded into
/// multiple tokens. Normalizing an already-normalized sequence is a no-op.
/// Returns `None` for mappings, which have no token form.
pub fn normalize_tokens(value: &Value) -> Option<Vec<String>> {
  match value {
    Value::Str(s) => Some(s.split_whitespace().map(str::to_string).collect()),
    Value::List(items) => Some(
      items
        .join(" ")
        .split_whitespace()
        .map(str::to_string)
        .collect(),
    ),
    Value::Map(_) => None,
  }
}
