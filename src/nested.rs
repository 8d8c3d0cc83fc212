// Nested JSON map traversal.
// Resolves a path of keys through mappings, reporting the key where lookup failed.

use serde_json::Value;

use crate::error::{LazyOrgError, Result};

/// Follow `path` through nested objects and return the value it ends at.
///
/// Every step must land on an object containing the next key. A missing key, or a
/// non-object reached before the path is exhausted, fails with
/// [`LazyOrgError::Key`] naming the key that could not be resolved.
pub fn access_nested_map<'a>(map: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = map;
    for key in path {
        current = current
            .as_object()
            .and_then(|object| object.get(*key))
            .ok_or_else(|| LazyOrgError::Key((*key).to_string()))?;
    }
    Ok(current)
}

/// Like [`access_nested_map`], but the leaf must be a string.
pub fn access_str<'a>(map: &'a Value, path: &[&str]) -> Result<&'a str> {
    let value = access_nested_map(map, path)?;
    value.as_str().ok_or_else(|| {
        LazyOrgError::Other(format!(
            "expected string at {}, found {}",
            path.join("."),
            value
        ))
    })
}
