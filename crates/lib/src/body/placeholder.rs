//! Placeholders in command arguments.
//!
//! # Formats
//!
//! - `{in:N}` / `{out:N}` - the N-th declared input / output, resolved
//! - `{inputs}` / `{outputs}` - every declared input / output
//! - `{config:KEY}` - the job's value for argument `KEY`
//! - `{build_dir}` - the snapshot directory the job writes into
//!
//! Braces that do not form one of these pass through unchanged, so shell
//! syntax such as `${HOME}` or `awk '{print $1}'` needs no escaping.
//!
//! ```
//! use wikimap_lib::body::placeholder::{parse, Placeholder, Segment};
//!
//! let segments = parse("--model={out:0}").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Literal("--model=".to_string()),
//!     Segment::Placeholder(Placeholder::Output(0)),
//! ]);
//! ```

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
  Input(usize),
  Output(usize),
  Inputs,
  Outputs,
  Config(String),
  BuildDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaceholderError {
  #[error("invalid index in placeholder '{0}'")]
  InvalidIndex(String),

  #[error("empty argument name in placeholder '{0}'")]
  EmptyKey(String),
}

/// Split `input` into literal text and placeholders.
pub fn parse(input: &str) -> Result<Vec<Segment>, PlaceholderError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(open) = rest.find('{') {
    let Some(close) = rest[open..].find('}').map(|offset| open + offset) else {
      break;
    };
    let content = &rest[open + 1..close];

    match parse_content(content)? {
      Some(placeholder) => {
        literal.push_str(&rest[..open]);
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Placeholder(placeholder));
        rest = &rest[close + 1..];
      }
      None => {
        // Not ours; keep the brace and rescan after it.
        literal.push_str(&rest[..=open]);
        rest = &rest[open + 1..];
      }
    }
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }
  Ok(segments)
}

fn parse_content(content: &str) -> Result<Option<Placeholder>, PlaceholderError> {
  let placeholder = match content {
    "inputs" => Placeholder::Inputs,
    "outputs" => Placeholder::Outputs,
    "build_dir" => Placeholder::BuildDir,
    _ => match content.split_once(':') {
      Some(("in", index)) => Placeholder::Input(parse_index(content, index)?),
      Some(("out", index)) => Placeholder::Output(parse_index(content, index)?),
      Some(("config", key)) => {
        if key.is_empty() {
          return Err(PlaceholderError::EmptyKey(content.to_string()));
        }
        Placeholder::Config(key.to_string())
      }
      _ => return Ok(None),
    },
  };
  Ok(Some(placeholder))
}

fn parse_index(content: &str, index: &str) -> Result<usize, PlaceholderError> {
  index
    .parse()
    .map_err(|_| PlaceholderError::InvalidIndex(content.to_string()))
}
