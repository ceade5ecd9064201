use crate::errors::OpsError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parses `a.b[0].c` style lookups into segments.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, OpsError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(OpsError::invalid_params("Path must be a non-empty string"));
    }
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;
    for ch in trimmed.chars() {
        match ch {
            '.' if !in_brackets => flush(&mut current, &mut segments),
            '[' if !in_brackets => {
                flush(&mut current, &mut segments);
                in_brackets = true;
            }
            ']' if in_brackets => {
                flush(&mut current, &mut segments);
                in_brackets = false;
            }
            _ => current.push(ch),
        }
    }
    if in_brackets {
        return Err(OpsError::invalid_params(format!(
            "Path '{}' has an unclosed '['",
            trimmed
        )));
    }
    flush(&mut current, &mut segments);
    Ok(segments)
}

fn flush(current: &mut String, segments: &mut Vec<PathSegment>) {
    let raw = current.trim().trim_matches('"').trim_matches('\'').trim();
    if !raw.is_empty() {
        segments.push(match raw.parse::<usize>() {
            Ok(index) => PathSegment::Index(index),
            Err(_) => PathSegment::Key(raw.to_string()),
        });
    }
    current.clear();
}

pub fn lookup<'a>(target: &'a Value, path: &str) -> Result<Option<&'a Value>, OpsError> {
    let mut current = target;
    for segment in parse_path(path)? {
        let next = match &segment {
            PathSegment::Key(key) => current.get(key.as_str()),
            PathSegment::Index(index) => current.as_array().and_then(|arr| arr.get(*index)),
        };
        match next {
            Some(value) => current = value,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

pub fn require_str<'a>(target: &'a Value, path: &str) -> Result<&'a str, OpsError> {
    match lookup(target, path)? {
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(other) => Err(OpsError::validation(format!(
            "Field '{}' must be a string, got {}",
            path, other
        ))),
        None => Err(OpsError::validation(format!("Field '{}' not found", path))),
    }
}
