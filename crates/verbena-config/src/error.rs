use thiserror::Error;

/// Errors raised while loading a workflow declaration.
///
/// Every variant is terminal for the file being loaded; no partial
/// `WorkflowDef` is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read workflow file '{path}'")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("syntax error at line {line}: {message}")]
  Syntax { line: usize, message: String },

  #[error("invalid {block} attribute '{key}' was found")]
  UnknownAttribute { block: &'static str, key: String },

  #[error("[{key}] attribute must be present in the {block} block")]
  MissingAttribute {
    block: &'static str,
    key: &'static str,
  },

  #[error("[{key}] attribute must be {expected}")]
  WrongShape {
    key: String,
    expected: &'static str,
  },

  #[error("only a single workflow block is allowed per workflow file, found {0}")]
  WorkflowBlockCount(usize),

  #[error("at least one action block must be present")]
  NoActionBlocks,

  #[error("duplicate action identifiers found")]
  DuplicateActionIds,
}
