//! Path queries over JSON resource documents.
//!
//! Supports a small jq-style subset: `.spec.containers[0].image`,
//! `spec.containers.0.image`, quoted keys such as
//! `.metadata.annotations["example.com/owner"]`, and `[]` iteration
//! (`.spec.containers[].image`), of which only the first output is kept.

use serde_json::Value;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryPathError {
    #[error("malformed path '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("cannot index {found} with {segment} in path '{path}'")]
    TypeMismatch {
        path: String,
        segment: String,
        found: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Bare dotted segment: object key, or array index when numeric.
    Name(String),
    /// Quoted key, only valid on objects.
    Key(String),
    /// Bracket index, only valid on arrays.
    Index(usize),
    /// `[]`: every element of an array or every value of an object.
    Iterate,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(name) => write!(f, "'{}'", name),
            Segment::Key(key) => write!(f, "\"{}\"", key),
            Segment::Index(index) => write!(f, "[{}]", index),
            Segment::Iterate => f.write_str("[]"),
        }
    }
}

/// Evaluate `path` against `object`, keeping the first output.
///
/// Returns `Ok(None)` when the path does not resolve (missing key, index out of
/// range, empty iteration, or a `null` along the way). Malformed paths and
/// traversals through scalars are errors.
pub fn run_single_output(path: &str, object: &Value) -> Result<Option<Value>, QueryPathError> {
    let segments = parse(path)?;
    first_output(path, &segments, object)
}

fn first_output(
    path: &str,
    segments: &[Segment],
    current: &Value,
) -> Result<Option<Value>, QueryPathError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(Some(current.clone()).filter(|v| !v.is_null()));
    };

    let next = match (segment, current) {
        (_, Value::Null) => return Ok(None),
        (Segment::Iterate, Value::Array(items)) => return first_of(path, rest, items.iter()),
        (Segment::Iterate, Value::Object(map)) => return first_of(path, rest, map.values()),
        (Segment::Name(key) | Segment::Key(key), Value::Object(map)) => map.get(key),
        (Segment::Index(index), Value::Array(items)) => items.get(*index),
        (Segment::Name(name), Value::Array(items)) => match name.parse::<usize>() {
            Ok(index) => items.get(index),
            Err(_) => return Err(mismatch(path, segment, current)),
        },
        _ => return Err(mismatch(path, segment, current)),
    };

    match next {
        Some(value) => first_output(path, rest, value),
        None => Ok(None),
    }
}

fn first_of<'a>(
    path: &str,
    rest: &[Segment],
    values: impl Iterator<Item = &'a Value>,
) -> Result<Option<Value>, QueryPathError> {
    for value in values {
        if let Some(found) = first_output(path, rest, value)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn mismatch(path: &str, segment: &Segment, found: &Value) -> QueryPathError {
    QueryPathError::TypeMismatch {
        path: path.to_string(),
        segment: segment.to_string(),
        found: type_name(found),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse(path: &str) -> Result<Vec<Segment>, QueryPathError> {
    let malformed = |reason: &str| QueryPathError::Malformed {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(malformed("empty path"));
    }
    if trimmed == "." {
        return Ok(Vec::new());
    }

    let mut chars = trimmed.chars().peekable();
    if chars.peek() == Some(&'.') {
        chars.next();
    }

    let mut segments = Vec::new();
    loop {
        match chars.peek() {
            None => return Err(malformed("trailing '.'")),
            Some('[') => {}
            Some('"') => {
                chars.next();
                let key = read_quoted(&mut chars)
                    .ok_or_else(|| malformed("unterminated quoted key"))?;
                segments.push(Segment::Key(key));
            }
            Some(_) => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if matches!(c, '.' | '[' | ']' | '"') {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(malformed("empty key"));
                }
                segments.push(Segment::Name(name));
            }
        }

        while chars.peek() == Some(&'[') {
            chars.next();
            segments.push(read_bracket(&mut chars).map_err(|reason| malformed(reason))?);
        }

        match chars.next() {
            None => break,
            Some('.') => continue,
            Some(c) => return Err(malformed(&format!("unexpected character '{}'", c))),
        }
    }

    Ok(segments)
}

/// Reads up to and including the closing quote. The opening quote is already consumed.
fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut key = String::new();
    loop {
        match chars.next()? {
            '"' => return Some(key),
            '\\' => key.push(chars.next()?),
            c => key.push(c),
        }
    }
}

/// Reads a bracket body and its closing `]`. The opening `[` is already consumed.
fn read_bracket(chars: &mut Peekable<Chars<'_>>) -> Result<Segment, &'static str> {
    let segment = if chars.peek() == Some(&']') {
        Segment::Iterate
    } else if chars.peek() == Some(&'"') {
        chars.next();
        Segment::Key(read_quoted(chars).ok_or("unterminated quoted key")?)
    } else {
        let mut digits = String::new();
        while let Some(&c) = chars.peek() {
            if c == ']' {
                break;
            }
            digits.push(c);
            chars.next();
        }
        let index = digits
            .parse::<usize>()
            .map_err(|_| "bracket index must be a non-negative integer")?;
        Segment::Index(index)
    };

    match chars.next() {
        Some(']') => Ok(segment),
        _ => Err("unterminated '['"),
    }
}
