use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::value::{Value, normalize_tokens};

/// Attributes an action block may carry. Anything else aborts the load.
pub const VALID_ACTION_ATTRS: &[&str] = &["uses", "args", "needs", "runs", "secrets", "env"];

/// A validated action declaration.
///
/// Token-sequence fields (`needs`, `args`, `runs`, `secrets`) are already
/// normalized: however they were authored, they are flat lists of
/// whitespace-split tokens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
  pub id: String,
  pub uses: String,
  #[serde(default)]
  pub needs: Vec<String>,
  #[serde(default)]
  pub args: Vec<String>,
  #[serde(default)]
  pub runs: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  #[serde(default)]
  pub secrets: Vec<String>,
}

impl ActionDef {
  /// Validate a raw attribute bag against the action schema.
  pub(crate) fn from_attrs(
    id: String,
    mut attrs: BTreeMap<String, Value>,
  ) -> Result<Self, ConfigError> {
    for key in attrs.keys() {
      if !VALID_ACTION_ATTRS.contains(&key.as_str()) {
        return Err(ConfigError::UnknownAttribute {
          block: "action",
          key: key.clone(),
        });
      }
    }

    let uses = match attrs.remove("uses") {
      Some(Value::Str(uses)) => uses,
      Some(_) => {
        return Err(ConfigError::WrongShape {
          key: "uses".to_string(),
          expected: "a string",
        });
      }
      None => {
        return Err(ConfigError::MissingAttribute {
          block: "action",
          key: "uses",
        });
      }
    };

    Ok(Self {
      id,
      uses,
      needs: take_tokens(&mut attrs, "needs")?,
      args: take_tokens(&mut attrs, "args")?,
      runs: take_tokens(&mut attrs, "runs")?,
      secrets: take_tokens(&mut attrs, "secrets")?,
      env: take_env(&mut attrs)?,
    })
  }
}

fn take_tokens(
  attrs: &mut BTreeMap<String, Value>,
  key: &'static str,
) -> Result<Vec<String>, ConfigError> {
  match attrs.remove(key) {
    None => Ok(Vec::new()),
    Some(value) => normalize_tokens(&value).ok_or(ConfigError::WrongShape {
      key: key.to_string(),
      expected: "a string or a list",
    }),
  }
}

fn take_env(attrs: &mut BTreeMap<String, Value>) -> Result<BTreeMap<String, String>, ConfigError> {
  match attrs.remove("env") {
    None => Ok(BTreeMap::new()),
    Some(Value::Map(env)) => Ok(env),
    Some(_) => Err(ConfigError::WrongShape {
      key: "env".to_string(),
      expected: "a mapping",
    }),
  }
}
