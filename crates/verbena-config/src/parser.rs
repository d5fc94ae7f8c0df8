//! Recursive-descent parser for the `.workflow` block format.
//!
//! The grammar is a small block language:
//!
//! ```text
//! file  := block*
//! block := ident string "{" attr* "}"
//! attr  := ident "=" value
//! value := string | "[" (string ","?)* "]" | "{" (ident "=" string ","?)* "}"
//! ```
//!
//! `#` and `//` start a comment that runs to the end of the line. The parser
//! only recognizes shapes; attribute semantics are checked by the `ActionDef`
//! and `WorkflowDef` validators.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::value::Value;

/// A raw parsed block, before schema validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
  pub kind: String,
  pub name: String,
  pub attrs: BTreeMap<String, Value>,
}

pub(crate) fn parse_blocks(source: &str) -> Result<Vec<Block>, ConfigError> {
  let mut parser = Parser::new(source);
  let mut blocks = Vec::new();
  loop {
    parser.skip_trivia();
    if parser.at_end() {
      break;
    }
    blocks.push(parser.parse_block()?);
  }
  Ok(blocks)
}

struct Parser<'a> {
  src: &'a [u8],
  pos: usize,
  line: usize,
}

impl<'a> Parser<'a> {
  fn new(source: &'a str) -> Self {
    Self {
      src: source.as_bytes(),
      pos: 0,
      line: 1,
    }
  }

  fn at_end(&self) -> bool {
    self.pos >= self.src.len()
  }

  fn peek(&self) -> Option<u8> {
    self.src.get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<u8> {
    let byte = self.peek()?;
    self.pos += 1;
    if byte == b'\n' {
      self.line += 1;
    }
    Some(byte)
  }

  fn error(&self, message: impl Into<String>) -> ConfigError {
    ConfigError::Syntax {
      line: self.line,
      message: message.into(),
    }
  }

  fn skip_trivia(&mut self) {
    while let Some(byte) = self.peek() {
      match byte {
        b' ' | b'\t' | b'\r' | b'\n' => {
          self.bump();
        }
        b'#' => self.skip_line(),
        b'/' if self.src.get(self.pos + 1) == Some(&b'/') => self.skip_line(),
        _ => break,
      }
    }
  }

  fn skip_line(&mut self) {
    while let Some(byte) = self.bump() {
      if byte == b'\n' {
        break;
      }
    }
  }

  fn expect(&mut self, expected: u8) -> Result<(), ConfigError> {
    self.skip_trivia();
    match self.peek() {
      Some(byte) if byte == expected => {
        self.bump();
        Ok(())
      }
      Some(byte) => Err(self.error(format!(
        "expected '{}', found '{}'",
        expected as char, byte as char
      ))),
      None => Err(self.error(format!("expected '{}', found end of file", expected as char))),
    }
  }

  fn parse_ident(&mut self) -> Result<String, ConfigError> {
    self.skip_trivia();
    let start = self.pos;
    while let Some(byte) = self.peek() {
      if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
        self.bump();
      } else {
        break;
      }
    }
    if start == self.pos {
      return Err(self.error("expected an identifier"));
    }
    Ok(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
  }

  fn parse_string(&mut self) -> Result<String, ConfigError> {
    self.expect(b'"')?;
    let mut out: Vec<u8> = Vec::new();
    loop {
      match self.bump() {
        None => return Err(self.error("unterminated string")),
        Some(b'"') => break,
        Some(b'\\') => match self.bump() {
          Some(b'n') => out.push(b'\n'),
          Some(b't') => out.push(b'\t'),
          Some(b'"') => out.push(b'"'),
          Some(b'\\') => out.push(b'\\'),
          Some(other) => {
            return Err(self.error(format!("unknown escape sequence '\\{}'", other as char)));
          }
          None => return Err(self.error("unterminated string")),
        },
        Some(byte) => out.push(byte),
      }
    }
    String::from_utf8(out).map_err(|_| self.error("string is not valid UTF-8"))
  }

  fn parse_value(&mut self) -> Result<Value, ConfigError> {
    self.skip_trivia();
    match self.peek() {
      Some(b'"') => Ok(Value::Str(self.parse_string()?)),
      Some(b'[') => self.parse_list(),
      Some(b'{') => self.parse_map(),
      _ => Err(self.error("expected a string, list, or mapping value")),
    }
  }

  fn parse_list(&mut self) -> Result<Value, ConfigError> {
    self.expect(b'[')?;
    let mut items = Vec::new();
    loop {
      self.skip_trivia();
      if self.peek() == Some(b']') {
        self.bump();
        break;
      }
      items.push(self.parse_string()?);
      self.skip_trivia();
      if self.peek() == Some(b',') {
        self.bump();
      }
    }
    Ok(Value::List(items))
  }

  fn parse_map(&mut self) -> Result<Value, ConfigError> {
    self.expect(b'{')?;
    let mut entries = BTreeMap::new();
    loop {
      self.skip_trivia();
      if self.peek() == Some(b'}') {
        self.bump();
        break;
      }
      let key = self.parse_ident()?;
      self.expect(b'=')?;
      let value = self.parse_string()?;
      entries.insert(key, value);
      self.skip_trivia();
      if self.peek() == Some(b',') {
        self.bump();
      }
    }
    Ok(Value::Map(entries))
  }

  fn parse_block(&mut self) -> Result<Block, ConfigError> {
    let kind = self.parse_ident()?;
    if kind != "workflow" && kind != "action" {
      return Err(self.error(format!("unknown block type '{kind}'")));
    }
    let name = self.parse_string()?;
    self.expect(b'{')?;
    let mut attrs = BTreeMap::new();
    loop {
      self.skip_trivia();
      if self.peek() == Some(b'}') {
        self.bump();
        break;
      }
      if self.at_end() {
        return Err(self.error(format!("unterminated '{kind}' block")));
      }
      let key = self.parse_ident()?;
      self.expect(b'=')?;
      let value = self.parse_value()?;
      attrs.insert(key, value);
    }
    Ok(Block { kind, name, attrs })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_all_value_shapes() {
    let source = r#"
      # a comment
      action "build" {
        uses = "docker://golang:1.12" // trailing comment
        args = ["make", "all"]
        env = { CGO_ENABLED = "0", GOOS = "linux" }
      }
    "#;
    let blocks = parse_blocks(source).unwrap();
    assert_eq!(blocks.len(), 1);
    let block = &blocks[0];
    assert_eq!(block.kind, "action");
    assert_eq!(block.name, "build");
    assert_eq!(
      block.attrs["uses"],
      Value::Str("docker://golang:1.12".to_string())
    );
    assert_eq!(
      block.attrs["args"],
      Value::List(vec!["make".to_string(), "all".to_string()])
    );
    let Value::Map(env) = &block.attrs["env"] else {
      panic!("env should be a mapping");
    };
    assert_eq!(env["CGO_ENABLED"], "0");
    assert_eq!(env["GOOS"], "linux");
  }

  #[test]
  fn parses_multiple_blocks() {
    let source = r#"
      workflow "ci" { resolves = ["test"] }
      action "build" { uses = "./build" }
      action "test" { uses = "./test" needs = "build" }
    "#;
    let blocks = parse_blocks(source).unwrap();
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].kind, "workflow");
    assert_eq!(blocks[2].attrs["needs"], Value::Str("build".to_string()));
  }

  #[test]
  fn string_escapes() {
    let blocks = parse_blocks(r#"action "a" { uses = "a\"b\\c\n" }"#).unwrap();
    assert_eq!(blocks[0].attrs["uses"], Value::Str("a\"b\\c\n".to_string()));
  }

  #[test]
  fn syntax_error_reports_line() {
    let source = "workflow \"ci\" {\n  resolves = )\n}";
    let err = parse_blocks(source).unwrap_err();
    match err {
      ConfigError::Syntax { line, .. } => assert_eq!(line, 2),
      other => panic!("expected syntax error, got {other:?}"),
    }
  }

  #[test]
  fn unknown_block_type_is_rejected() {
    let err = parse_blocks("job \"a\" { uses = \"x\" }").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { .. }));
  }

  #[test]
  fn unterminated_block_is_rejected() {
    let err = parse_blocks("action \"a\" { uses = \"x\"").unwrap_err();
    assert!(matches!(err, ConfigError::Syntax { .. }));
  }
}
