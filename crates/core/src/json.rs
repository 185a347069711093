//! JSON helpers for document blobs
//!
//! This module defines how nested fields inside a stored document are
//! addressed and compared:
//! - JsonValue: alias for `serde_json::Value`
//! - JsonPath: path into a document (e.g., `user.name` or `items[0]`)
//! - PathSegment: individual path component (Key or Index)
//! - get_at_path: read a nested field
//! - compare_values: ordering used by range predicates and sorting

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// JSON value stored in a document blob
pub type JsonValue = serde_json::Value;

/// Maximum path length in segments
pub const MAX_PATH_LENGTH: usize = 256;

/// Error type for JSON path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    /// Path exceeds [`MAX_PATH_LENGTH`]
    #[error("path length {0} exceeds maximum of {MAX_PATH_LENGTH} segments")]
    TooLong(usize),
}

/// A segment in a JSON path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key: `.foo`
    Key(String),
    /// Array index: `[0]`
    Index(usize),
}

/// A path into a JSON document
///
/// | Syntax | Meaning | Example |
/// |--------|---------|---------|
/// | `key` | Object property | `name` |
/// | `a.b` | Nested property | `metadata.number` |
/// | `key[n]` | Property then index | `items[0]` |
/// | (empty) | Root | `` |
///
/// # Examples
///
/// ```
/// use docmap_core::json::JsonPath;
///
/// let path: JsonPath = "metadata.number".parse().unwrap();
/// assert_eq!(path, JsonPath::root().key("metadata").key("number"));
/// assert_eq!(path.to_string(), "metadata.number");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        JsonPath {
            segments: Vec::new(),
        }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Whether the path is a single top-level key
    pub fn is_top_level(&self) -> bool {
        matches!(self.segments.as_slice(), [PathSegment::Key(_)])
    }
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(JsonPath::root());
        }

        let mut segments = Vec::new();
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        if chars[0] == '.' {
            i += 1;
        }

        while i < chars.len() {
            if chars[i] == '.' {
                i += 1;
                if i >= chars.len() || chars[i] == '.' {
                    return Err(PathParseError::EmptyKey(i));
                }
            }

            if chars[i] == '[' {
                let start = i;
                i += 1;
                let idx_start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(PathParseError::UnclosedBracket(start));
                }
                let idx_str: String = chars[idx_start..i].iter().collect();
                let idx = idx_str
                    .parse::<usize>()
                    .map_err(|_| PathParseError::InvalidIndex(idx_start, idx_str))?;
                segments.push(PathSegment::Index(idx));
                i += 1;
            } else if is_key_char(chars[i]) {
                let key_start = i;
                while i < chars.len() && is_key_char(chars[i]) {
                    i += 1;
                }
                segments.push(PathSegment::Key(chars[key_start..i].iter().collect()));
            } else {
                return Err(PathParseError::UnexpectedChar(chars[i], i));
            }
        }

        if segments.len() > MAX_PATH_LENGTH {
            return Err(PathParseError::TooLong(segments.len()));
        }
        Ok(JsonPath { segments })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '$'
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(k) if n == 0 => write!(f, "{}", k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

/// Get value at path within a JSON document
///
/// Returns `None` if the path doesn't exist or crosses a type mismatch.
///
/// ```
/// use docmap_core::json::{get_at_path, JsonPath};
/// use serde_json::json;
///
/// let doc = json!({"user": {"scores": [90, 95]}});
/// let path: JsonPath = "user.scores[1]".parse().unwrap();
/// assert_eq!(get_at_path(&doc, &path), Some(&json!(95)));
/// ```
pub fn get_at_path<'a>(value: &'a JsonValue, path: &JsonPath) -> Option<&'a JsonValue> {
    let mut current = value;
    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Key(key), JsonValue::Object(obj)) => obj.get(key)?,
            (PathSegment::Index(idx), JsonValue::Array(arr)) => arr.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Compare two JSON values for range predicates and ordering
///
/// Numbers compare numerically (so `1` equals `1.0`), strings
/// lexicographically, booleans `false < true`. Values of different kinds
/// are unordered (`None`), except that `null` sorts before everything.
pub fn compare_values(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Some(Ordering::Equal),
        (JsonValue::Null, _) => Some(Ordering::Less),
        (_, JsonValue::Null) => Some(Ordering::Greater),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        (JsonValue::Bool(x), JsonValue::Bool(y)) => Some(x.cmp(y)),
        (JsonValue::Array(_), JsonValue::Array(_)) | (JsonValue::Object(_), JsonValue::Object(_)) => {
            if a == b {
                Some(Ordering::Equal)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Equality used by predicates: numeric-aware, structural otherwise
pub fn values_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(_), JsonValue::Number(_)) => {
            compare_values(a, b) == Some(Ordering::Equal)
        }
        _ => a == b,
    }
}
