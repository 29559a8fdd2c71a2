//! Dot paths, for addressing a field inside a document.
//!
//! A path is a `.`-separated list of nodes. A node made only of digits is an index into an array
//! or column; anything else is an object key. Keys containing `.`, `"`, or spaces, or made only
//! of digits, are written in double quotes, where `\"` and `\\` escape a quote and a backslash:
//!
//! ```text
//! users.0."display name"
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DotNode {
    Key(String),
    Index(u32),
}

/// A parsed dot path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DotPath {
    nodes: Vec<DotNode>,
}

fn bad_path(path: &str, why: &str) -> Error {
    Error::IllegalArgument(format!("malformed dot path {:?}: {}", path, why))
}

impl DotPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a path. The empty string is the empty path, which addresses the document root.
    pub fn parse(path: &str) -> Result<DotPath> {
        let mut nodes = Vec::new();
        if path.is_empty() {
            return Ok(DotPath { nodes });
        }
        let mut chars = path.chars().peekable();
        loop {
            let node = match chars.peek() {
                Some('"') => {
                    chars.next();
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(c @ ('"' | '\\')) => key.push(c),
                                _ => return Err(bad_path(path, "bad escape in quoted key")),
                            },
                            Some(c) => key.push(c),
                            None => return Err(bad_path(path, "unterminated quoted key")),
                        }
                    }
                    DotNode::Key(key)
                }
                _ => {
                    let mut text = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '.' {
                            break;
                        }
                        if c == '"' {
                            return Err(bad_path(path, "quote inside an unquoted key"));
                        }
                        text.push(c);
                        chars.next();
                    }
                    if text.is_empty() {
                        return Err(bad_path(path, "empty node"));
                    }
                    if text.bytes().all(|b| b.is_ascii_digit()) {
                        let index = text
                            .parse::<u32>()
                            .map_err(|_| bad_path(path, "index out of range"))?;
                        DotNode::Index(index)
                    } else {
                        DotNode::Key(text)
                    }
                }
            };
            nodes.push(node);
            match chars.next() {
                None => break,
                Some('.') => {
                    if chars.peek().is_none() {
                        return Err(bad_path(path, "trailing '.'"));
                    }
                }
                Some(_) => return Err(bad_path(path, "expected '.' after quoted key")),
            }
        }
        Ok(DotPath { nodes })
    }

    pub fn push_key(mut self, key: impl Into<String>) -> Self {
        self.nodes.push(DotNode::Key(key.into()));
        self
    }

    pub fn push_index(mut self, index: u32) -> Self {
        self.nodes.push(DotNode::Index(index));
        self
    }

    pub fn nodes(&self) -> &[DotNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromStr for DotPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DotPath::parse(s)
    }
}

fn needs_quotes(key: &str) -> bool {
    key.is_empty()
        || key.bytes().all(|b| b.is_ascii_digit())
        || key.contains(|c: char| c == '.' || c == '"' || c == '\\' || c.is_whitespace())
}

impl fmt::Display for DotPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match node {
                DotNode::Index(index) => write!(f, "{}", index)?,
                DotNode::Key(key) if needs_quotes(key) => {
                    f.write_str("\"")?;
                    for c in key.chars() {
                        if c == '"' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{}", c)?;
                    }
                    f.write_str("\"")?;
                }
                DotNode::Key(key) => f.write_str(key)?,
            }
        }
        Ok(())
    }
}
