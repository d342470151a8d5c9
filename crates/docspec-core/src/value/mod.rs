//! Document value model
//!
//! The data tree walked by the mapper is a [`Value`]: a JSON-like structure
//! extended with the two scalar kinds a document store needs that JSON cannot
//! tell apart from strings, dates and object identities. Objects keep
//! insertion order so traversal is deterministic.
//!
//! "Undefined" is not a value: an absent map key (or `None` where an
//! `Option<Value>` is used) plays that role, while [`Value::Null`] is an
//! explicit, present null.

mod location;
mod object_id;

pub use location::{FieldKey, Location};
pub use object_id::ObjectId;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Ordered string-keyed mapping used for object values
pub type Map = IndexMap<String, Value>;

/// A node of a document tree
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    ObjectId(ObjectId),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    /// Build an empty object value
    pub fn object() -> Self {
        Value::Object(Map::new())
    }

    /// Build an empty array value
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a direct child by key or index
    pub fn child(&self, key: &FieldKey) -> Option<&Value> {
        match (self, key) {
            (Value::Object(map), FieldKey::Name(name)) => map.get(name),
            (Value::Array(items), FieldKey::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    /// Mutable lookup of a direct child by key or index
    pub fn child_mut(&mut self, key: &FieldKey) -> Option<&mut Value> {
        match (self, key) {
            (Value::Object(map), FieldKey::Name(name)) => map.get_mut(name),
            (Value::Array(items), FieldKey::Index(index)) => items.get_mut(*index),
            _ => None,
        }
    }

    /// Follow a location from this value
    pub fn at(&self, location: &Location) -> Option<&Value> {
        location
            .segments()
            .iter()
            .try_fold(self, |current, key| current.child(key))
    }

    /// Follow a location from this value, mutably
    pub fn at_mut(&mut self, location: &Location) -> Option<&mut Value> {
        let mut current = self;
        for key in location.segments() {
            current = current.child_mut(key)?;
        }
        Some(current)
    }

    /// JavaScript-style truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy,
    /// every container, date and identity is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::ObjectId(_) | Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Convert to plain JSON; dates become RFC 3339 strings, identities hex
    /// strings, integral numbers integers and non-finite numbers `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(date) => {
                serde_json::Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::ObjectId(id) => serde_json::Value::String(id.to_hex()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Render a number the way a JavaScript runtime would (`33`, `3.14`, `NaN`)
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(date) => write!(f, "{}", date.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::ObjectId(id) => write!(f, "{}", id),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                write!(f, "{}", parts.join(","))
            }
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(date: DateTime<Utc>) -> Self {
        Value::Date(date)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_key_order() {
        let value = Value::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::array().is_truthy());
        assert!(Value::object().is_truthy());
        assert!(Value::from("0").is_truthy());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(Value::Number(33.0).to_string(), "33");
        assert_eq!(Value::Number(3.14).to_string(), "3.14");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::object().to_string(), "[object Object]");
    }

    #[test]
    fn test_to_json_integral_numbers() {
        let value = Value::from(json!({"age": 33, "pi": 3.5, "tags": ["a"]}));
        assert_eq!(value.to_json(), json!({"age": 33, "pi": 3.5, "tags": ["a"]}));
        assert_eq!(Value::Number(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_location_lookup() {
        let mut value = Value::from(json!({"names": ["Kevin", "Ann"]}));
        let location = Location::root()
            .child(FieldKey::from("names"))
            .child(FieldKey::Index(1));
        assert_eq!(value.at(&location), Some(&Value::from("Ann")));

        *value.at_mut(&location).unwrap() = Value::from("Anna");
        assert_eq!(value.to_json(), json!({"names": ["Kevin", "Anna"]}));
    }

    #[test]
    fn test_deserialize_via_json() {
        let value: Value = serde_json::from_str(r#"{"a": [1, null, true]}"#).unwrap();
        assert_eq!(
            value.as_object().unwrap()["a"],
            Value::Array(vec![Value::Number(1.0), Value::Null, Value::Bool(true)])
        );
    }
}
