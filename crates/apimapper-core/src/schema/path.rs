//! Field access paths
//!
//! A field path addresses one location inside a record using dotted keys,
//! bracketed array indices and bracket-quoted keys:
//!
//! ```
//! use apimapper_core::schema::FieldPath;
//! use serde_json::json;
//!
//! let path = FieldPath::parse("user.emails[0]").unwrap();
//! let record = json!({"user": {"emails": ["ada@example.com"]}});
//! assert_eq!(path.resolve(&record), Some(&json!("ada@example.com")));
//!
//! let quoted = FieldPath::parse(r#"meta["content-type"]"#).unwrap();
//! assert_eq!(quoted.segments().len(), 2);
//! ```
//!
//! A leading `$` or `$.` is accepted and ignored so JSONPath-style input
//! from UI layers normalizes to the same path.
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use super::error::SchemaError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

/// A parsed access path into a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a path expression
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        PathParser::new(input).parse()
    }

    /// Path consisting of a single key
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Read the value at this path, borrowing from the record
    pub fn resolve<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        let mut current = record;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Key(key) => {
                    write!(f, "[\"{}\"]", key.replace('\\', "\\\\").replace('"', "\\\""))?
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for FieldPath {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// Keys that print bare; a leading `$` would read back as the root marker
fn is_plain_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('$') && !key.contains(['.', '[', ']', '"', '\''])
}

/// Recursive descent parser over path characters
struct PathParser<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<FieldPath, SchemaError> {
        if self.input.trim().is_empty() {
            return Err(SchemaError::invalid_path(self.input, 0, "empty path"));
        }

        self.skip_root();

        let mut segments = Vec::new();
        let mut expect_key = true;

        while let Some(&(pos, ch)) = self.chars.peek() {
            match ch {
                '[' => {
                    self.chars.next();
                    segments.push(self.parse_bracket(pos)?);
                    expect_key = false;
                }
                '.' => {
                    if expect_key {
                        return Err(SchemaError::invalid_path(self.input, pos, "empty segment"));
                    }
                    self.chars.next();
                    expect_key = true;
                    if self.chars.peek().is_none() {
                        return Err(SchemaError::invalid_path(self.input, pos, "trailing '.'"));
                    }
                }
                ']' => {
                    return Err(SchemaError::invalid_path(self.input, pos, "unexpected ']'"));
                }
                _ => {
                    if !expect_key {
                        return Err(SchemaError::invalid_path(
                            self.input,
                            pos,
                            "expected '.' or '[' after ']'",
                        ));
                    }
                    segments.push(PathSegment::Key(self.parse_identifier()));
                    expect_key = false;
                }
            }
        }

        if segments.is_empty() {
            return Err(SchemaError::invalid_path(self.input, 0, "path has no segments"));
        }

        Ok(FieldPath { segments })
    }

    /// Consume an optional `$` or `$.` prefix
    fn skip_root(&mut self) {
        if let Some(&(_, '$')) = self.chars.peek() {
            self.chars.next();
            if let Some(&(_, '.')) = self.chars.peek() {
                self.chars.next();
            }
        }
    }

    fn parse_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch == '.' || ch == '[' || ch == ']' {
                break;
            }
            ident.push(ch);
            self.chars.next();
        }
        ident
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed
    fn parse_bracket(&mut self, open: usize) -> Result<PathSegment, SchemaError> {
        match self.chars.peek() {
            Some(&(_, quote @ ('"' | '\''))) => {
                self.chars.next();
                let key = self.parse_quoted(quote, open)?;
                self.expect_close(open)?;
                Ok(PathSegment::Key(key))
            }
            Some(_) => {
                let mut digits = String::new();
                while let Some(&(pos, ch)) = self.chars.peek() {
                    if ch == ']' {
                        break;
                    }
                    if !ch.is_ascii_digit() {
                        return Err(SchemaError::invalid_path(
                            self.input,
                            pos,
                            "array index must be a non-negative integer",
                        ));
                    }
                    digits.push(ch);
                    self.chars.next();
                }
                if digits.is_empty() {
                    return Err(SchemaError::invalid_path(self.input, open, "empty brackets"));
                }
                self.expect_close(open)?;
                digits
                    .parse::<usize>()
                    .map(PathSegment::Index)
                    .map_err(|_| SchemaError::invalid_path(self.input, open, "array index too large"))
            }
            None => Err(SchemaError::invalid_path(self.input, open, "unterminated '['")),
        }
    }

    fn parse_quoted(&mut self, quote: char, open: usize) -> Result<String, SchemaError> {
        let mut key = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, escaped)) => key.push(escaped),
                    None => break,
                },
                Some((_, ch)) if ch == quote => return Ok(key),
                Some((_, ch)) => key.push(ch),
                None => break,
            }
        }
        Err(SchemaError::invalid_path(self.input, open, "unterminated quoted key"))
    }

    fn expect_close(&mut self, open: usize) -> Result<(), SchemaError> {
        match self.chars.next() {
            Some((_, ']')) => Ok(()),
            Some((pos, _)) => Err(SchemaError::invalid_path(self.input, pos, "expected ']'")),
            None => Err(SchemaError::invalid_path(self.input, open, "unterminated '['")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dotted() {
        let path = FieldPath::parse("user.address.city").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("user".into()),
                PathSegment::Key("address".into()),
                PathSegment::Key("city".into()),
            ]
        );
        assert_eq!(path.to_string(), "user.address.city");
    }

    #[test]
    fn test_parse_brackets_and_root_prefix() {
        let path = FieldPath::parse("$.items[2]['unit price']").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Key("items".into()),
                PathSegment::Index(2),
                PathSegment::Key("unit price".into()),
            ]
        );
        assert_eq!(path.to_string(), "items[2].unit price");
        assert_eq!(FieldPath::parse("$.a").unwrap(), FieldPath::parse("a").unwrap());
    }

    #[test]
    fn test_display_quotes_awkward_keys() {
        let path = FieldPath::parse(r#"meta["a.b"]"#).unwrap();
        assert_eq!(path.to_string(), r#"meta["a.b"]"#);
        assert_eq!(FieldPath::parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn test_dollar_keys_survive_display() {
        let path = FieldPath::key("$ref");
        assert_eq!(path.to_string(), r#"["$ref"]"#);
        assert_eq!(FieldPath::parse(&path.to_string()).unwrap(), path);

        let nested = FieldPath::parse(r#"schema["$id"]"#).unwrap();
        assert_eq!(nested.to_string(), r#"schema["$id"]"#);
        let decoded: FieldPath = serde_json::from_value(serde_json::to_value(&nested).unwrap()).unwrap();
        assert_eq!(decoded, nested);
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["", "   ", ".a", "a.", "a..b", "a[", "a[]", "a[x]", "a[-1]", "a]b", "a[0]b", "a['k"] {
            let err = FieldPath::parse(bad).unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidPath { .. }),
                "expected InvalidPath for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_resolve() {
        let record = json!({
            "order": {"lines": [{"sku": "A1"}, {"sku": "B2"}]},
            "flag": false
        });

        let sku = FieldPath::parse("order.lines[1].sku").unwrap();
        assert_eq!(sku.resolve(&record), Some(&json!("B2")));

        let flag = FieldPath::key("flag");
        assert_eq!(flag.resolve(&record), Some(&json!(false)));

        let out_of_bounds = FieldPath::parse("order.lines[5].sku").unwrap();
        assert_eq!(out_of_bounds.resolve(&record), None);

        let wrong_shape = FieldPath::parse("flag.inner").unwrap();
        assert_eq!(wrong_shape.resolve(&record), None);
    }

    #[test]
    fn test_serde_as_string() {
        let path = FieldPath::parse("a[0].b").unwrap();
        let encoded = serde_json::to_value(&path).unwrap();
        assert_eq!(encoded, json!("a[0].b"));

        let decoded: FieldPath = serde_json::from_value(json!("a[0].b")).unwrap();
        assert_eq!(decoded, path);
        assert!(serde_json::from_value::<FieldPath>(json!("a..b")).is_err());
    }
}
