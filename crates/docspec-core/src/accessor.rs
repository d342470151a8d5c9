//! Dot-path access into document values
//!
//! Paths use the same notation the mapper produces: `house.rooms[0].name`.
//! Purely numeric dot segments (`rooms.0`) address array elements too.
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use crate::value::{FieldKey, Value};
use crate::{Error, Result};

/// Split a dot/bracket path into keys; the empty path addresses the root
pub fn parse_path(path: &str) -> Result<Vec<FieldKey>> {
    let mut keys = Vec::new();
    if path.is_empty() {
        return Ok(keys);
    }

    let invalid = |message: &str| Error::InvalidPath {
        path: path.to_string(),
        message: message.to_string(),
    };

    for segment in path.split('.') {
        let (name, mut rest) = match segment.find('[') {
            Some(open) => segment.split_at(open),
            None => (segment, ""),
        };
        if name.is_empty() && rest.is_empty() {
            return Err(invalid("empty segment"));
        }
        if !name.is_empty() {
            keys.push(segment_key(name));
        }
        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(|| invalid("unclosed '['"))?;
            let index = rest[1..close]
                .parse::<usize>()
                .map_err(|_| invalid("bracket index must be a non-negative integer"))?;
            keys.push(FieldKey::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("unexpected text after ']'"));
            }
        }
    }

    Ok(keys)
}

fn segment_key(name: &str) -> FieldKey {
    match name.parse::<usize>() {
        Ok(index) if name.bytes().all(|b| b.is_ascii_digit()) => FieldKey::Index(index),
        _ => FieldKey::Name(name.to_string()),
    }
}

fn step<'a>(value: &'a Value, key: &FieldKey) -> Option<&'a Value> {
    match (value, key) {
        (Value::Object(map), FieldKey::Index(index)) => map.get(&index.to_string()),
        _ => value.child(key),
    }
}

fn step_mut<'a>(value: &'a mut Value, key: &FieldKey) -> Option<&'a mut Value> {
    match (value, key) {
        (Value::Object(map), FieldKey::Index(index)) => map.get_mut(&index.to_string()),
        (value, key) => value.child_mut(key),
    }
}

/// Get, set and unset values by dot path
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectPathAccessor;

impl ObjectPathAccessor {
    pub fn new() -> Self {
        Self
    }

    /// Value at `path`, or `None` when any segment is missing
    pub fn get_path<'a>(&self, path: &str, root: &'a Value) -> Result<Option<&'a Value>> {
        let keys = parse_path(path)?;
        Ok(keys.iter().try_fold(root, |current, key| step(current, key)))
    }

    /// Store `value` at `path`, creating intermediate containers as needed
    pub fn set_path(&self, path: &str, value: Value, root: &mut Value) -> Result<()> {
        let keys = parse_path(path)?;
        let Some((last, parents)) = keys.split_last() else {
            *root = value;
            return Ok(());
        };

        let mut current = root;
        for (position, key) in parents.iter().enumerate() {
            let next = &keys[position + 1];
            current = Self::entry(current, key, next, path)?;
        }
        Self::store(current, last, value, path)
    }

    /// Remove the value at `path`, returning it
    ///
    /// Array elements are replaced by null so sibling indexes stay stable.
    pub fn unset_path(&self, path: &str, root: &mut Value) -> Result<Option<Value>> {
        let keys = parse_path(path)?;
        let Some((last, parents)) = keys.split_last() else {
            return Ok(Some(std::mem::take(root)));
        };

        let mut current = root;
        for key in parents {
            match step_mut(current, key) {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }

        Ok(match (current, last) {
            (Value::Object(map), key) => map.shift_remove(&key.to_string()),
            (Value::Array(items), FieldKey::Index(index)) => {
                items.get_mut(*index).map(std::mem::take)
            }
            _ => None,
        })
    }

    fn entry<'a>(
        current: &'a mut Value,
        key: &FieldKey,
        next: &FieldKey,
        path: &str,
    ) -> Result<&'a mut Value> {
        let missing = match step(current, key) {
            None => true,
            Some(child) => !(child.is_object() || child.is_array()),
        };
        if missing {
            let container = match next {
                FieldKey::Index(_) => Value::array(),
                FieldKey::Name(_) => Value::object(),
            };
            Self::store(current, key, container, path)?;
        }
        step_mut(current, key).ok_or_else(|| Error::InvalidPath {
            path: path.to_string(),
            message: format!("cannot descend into '{}'", key),
        })
    }

    fn store(container: &mut Value, key: &FieldKey, value: Value, path: &str) -> Result<()> {
        if container.is_null() {
            *container = Value::object();
        }
        match (container, key) {
            (Value::Object(map), key) => {
                map.insert(key.to_string(), value);
                Ok(())
            }
            (Value::Array(items), FieldKey::Index(index)) => {
                if *index >= items.len() {
                    items.resize(*index + 1, Value::Null);
                }
                items[*index] = value;
                Ok(())
            }
            (_, key) => Err(Error::InvalidPath {
                path: path.to_string(),
                message: format!("cannot set '{}' on a scalar value", key),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("house.rooms[1].name").unwrap(),
            vec![
                FieldKey::from("house"),
                FieldKey::from("rooms"),
                FieldKey::Index(1),
                FieldKey::from("name"),
            ]
        );
        assert_eq!(
            parse_path("rooms.0").unwrap(),
            vec![FieldKey::from("rooms"), FieldKey::Index(0)]
        );
        assert_eq!(
            parse_path("grid[0][2]").unwrap(),
            vec![FieldKey::from("grid"), FieldKey::Index(0), FieldKey::Index(2)]
        );
        assert!(parse_path("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_path_errors() {
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a[1").is_err());
        assert!(parse_path("a[x]").is_err());
        assert!(parse_path("a[1]b").is_err());
    }

    #[test]
    fn test_get_path() {
        let root = Value::from(json!({"house": {"rooms": [{"name": "hall"}]}, "3": "three"}));
        let accessor = ObjectPathAccessor;

        assert_eq!(
            accessor.get_path("house.rooms[0].name", &root).unwrap(),
            Some(&Value::from("hall"))
        );
        assert_eq!(accessor.get_path("3", &root).unwrap(), Some(&Value::from("three")));
        assert_eq!(accessor.get_path("house.garden", &root).unwrap(), None);
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut root = Value::from(json!({}));
        let accessor = ObjectPathAccessor;

        accessor.set_path("a.b[1]", Value::from("x"), &mut root).unwrap();
        assert_eq!(root, Value::from(json!({"a": {"b": [null, "x"]}})));
    }

    #[test]
    fn test_set_path_replaces_scalar_parent() {
        let mut root = Value::from(json!({"a": 1}));
        ObjectPathAccessor.set_path("a[0]", Value::from("x"), &mut root).unwrap();
        assert_eq!(root, Value::from(json!({"a": ["x"]})));
    }

    #[test]
    fn test_set_path_on_scalar_root_fails() {
        let mut root = Value::from("scalar");
        assert!(ObjectPathAccessor.set_path("a", Value::Null, &mut root).is_err());
    }

    #[test]
    fn test_unset_path() {
        let mut root = Value::from(json!({"a": {"b": 1, "c": [1, 2]}}));
        let accessor = ObjectPathAccessor;

        assert_eq!(accessor.unset_path("a.b", &mut root).unwrap(), Some(Value::Number(1.0)));
        assert_eq!(accessor.unset_path("a.c[0]", &mut root).unwrap(), Some(Value::Number(1.0)));
        assert_eq!(accessor.unset_path("a.missing.x", &mut root).unwrap(), None);
        assert_eq!(root, Value::from(json!({"a": {"c": [null, 2]}})));
    }
}
