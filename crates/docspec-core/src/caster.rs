//! Type inspection and casting
//!
//! The orchestrator only relies on the [`TypeCaster`] interface; casting is
//! judged successful by comparing canonical type names afterwards, so a caster
//! signals "cannot convert" simply by returning the value unchanged.

use crate::types::TypeTag;
use crate::value::{format_number, ObjectId, Value};
use crate::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Name reported for explicit null values
pub const NULL_TYPE_NAME: &str = "Null";

/// Inspects and converts document values
pub trait TypeCaster: Send + Sync {
    /// Type tag of a value, `None` for null
    fn get_type(&self, value: &Value) -> Option<TypeTag>;

    /// Canonical type name of a value
    fn get_type_name(&self, value: &Value) -> String {
        self.get_type(value)
            .map(|tag| self.type_tag_name(tag).to_string())
            .unwrap_or_else(|| NULL_TYPE_NAME.to_string())
    }

    /// Canonical name of a type tag
    fn type_tag_name(&self, tag: TypeTag) -> &'static str {
        tag.canonical_name()
    }

    /// Best-effort conversion of `value` to `tag`
    fn cast(&self, tag: TypeTag, value: &Value) -> Result<Value>;
}

/// Default caster with JavaScript-flavoured coercions
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTypeCaster;

impl StandardTypeCaster {
    pub fn new() -> Self {
        Self
    }

    fn to_string(value: &Value) -> Value {
        match value {
            Value::Number(n) => Value::String(format_number(*n)),
            Value::Bool(_) | Value::Date(_) | Value::ObjectId(_) => {
                Value::String(value.to_string())
            }
            _ => value.clone(),
        }
    }

    fn to_number(value: &Value) -> Value {
        match value {
            Value::String(s) => Value::Number(parse_number(s)),
            Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
            Value::Date(date) => Value::Number(date.timestamp_millis() as f64),
            _ => value.clone(),
        }
    }

    fn to_boolean(value: &Value) -> Value {
        match value {
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Value::Bool(true),
                "false" | "0" | "no" | "off" | "" => Value::Bool(false),
                _ => value.clone(),
            },
            Value::Number(n) => Value::Bool(*n != 0.0 && !n.is_nan()),
            _ => value.clone(),
        }
    }

    fn to_date(value: &Value) -> Value {
        match value {
            Value::String(s) => parse_date(s.trim())
                .map(Value::Date)
                .unwrap_or_else(|| value.clone()),
            Value::Number(n) if n.is_finite() => Utc
                .timestamp_millis_opt(*n as i64)
                .single()
                .map(Value::Date)
                .unwrap_or_else(|| value.clone()),
            _ => value.clone(),
        }
    }

    fn to_object_id(value: &Value) -> Value {
        match value {
            Value::String(s) => ObjectId::parse_str(s.trim())
                .map(Value::ObjectId)
                .unwrap_or_else(|_| value.clone()),
            _ => value.clone(),
        }
    }

    fn to_array(value: &Value) -> Value {
        match value {
            Value::Array(_) | Value::Object(_) => value.clone(),
            scalar => Value::Array(vec![scalar.clone()]),
        }
    }
}

impl TypeCaster for StandardTypeCaster {
    fn get_type(&self, value: &Value) -> Option<TypeTag> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(TypeTag::Boolean),
            Value::Number(_) => Some(TypeTag::Number),
            Value::String(_) => Some(TypeTag::String),
            Value::Date(_) => Some(TypeTag::Date),
            Value::ObjectId(_) => Some(TypeTag::ObjectId),
            Value::Array(_) => Some(TypeTag::Array),
            Value::Object(_) => Some(TypeTag::Object),
        }
    }

    fn cast(&self, tag: TypeTag, value: &Value) -> Result<Value> {
        let result = match tag {
            TypeTag::String => Self::to_string(value),
            TypeTag::Number => Self::to_number(value),
            TypeTag::Boolean => Self::to_boolean(value),
            TypeTag::Date => Self::to_date(value),
            TypeTag::ObjectId => Self::to_object_id(value),
            TypeTag::Array => Self::to_array(value),
            TypeTag::Object | TypeTag::Any => value.clone(),
        };
        Ok(result)
    }
}

/// Parse a decimal number; anything unparseable becomes NaN
fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .unwrap_or(f64::NAN),
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if s.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cast(tag: TypeTag, value: Value) -> Value {
        StandardTypeCaster.cast(tag, &value).unwrap()
    }

    #[test]
    fn test_type_names() {
        let caster = StandardTypeCaster;
        assert_eq!(caster.get_type_name(&Value::from("x")), "String");
        assert_eq!(caster.get_type_name(&Value::Null), "Null");
        assert_eq!(caster.get_type_name(&Value::ObjectId(ObjectId::new())), "ObjectID");
        assert_eq!(caster.get_type_name(&Value::from(json!({"a": 1}))), "Object");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(cast(TypeTag::Number, Value::from("33")), Value::Number(33.0));
        assert_eq!(cast(TypeTag::Number, Value::from(" 3.5 ")), Value::Number(3.5));
        assert!(cast(TypeTag::Number, Value::from("abc")).as_f64().unwrap().is_nan());
        assert!(cast(TypeTag::Number, Value::from("inf")).as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_string_to_boolean() {
        assert_eq!(cast(TypeTag::Boolean, Value::from("1")), Value::Bool(true));
        assert_eq!(cast(TypeTag::Boolean, Value::from("0")), Value::Bool(false));
        assert_eq!(cast(TypeTag::Boolean, Value::from("maybe")), Value::from("maybe"));
    }

    #[test]
    fn test_scalars_to_string() {
        assert_eq!(cast(TypeTag::String, Value::Number(33.0)), Value::from("33"));
        assert_eq!(cast(TypeTag::String, Value::Bool(false)), Value::from("false"));
    }

    #[test]
    fn test_object_is_not_cast_to_primitive() {
        let object = Value::from(json!({"age": "33"}));
        assert_eq!(cast(TypeTag::String, object.clone()), object);
        assert_eq!(cast(TypeTag::Number, object.clone()), object);
    }

    #[test]
    fn test_string_to_date() {
        let date = cast(TypeTag::Date, Value::from("2024-02-29"));
        match date {
            Value::Date(d) => assert_eq!(d.to_rfc3339(), "2024-02-29T00:00:00+00:00"),
            other => panic!("expected date, got {:?}", other),
        }
        assert!(matches!(cast(TypeTag::Date, Value::from("now")), Value::Date(_)));
        assert_eq!(cast(TypeTag::Date, Value::from("soon")), Value::from("soon"));
    }

    #[test]
    fn test_string_to_object_id() {
        let id = ObjectId::new();
        assert_eq!(cast(TypeTag::ObjectId, Value::from(id.to_hex())), Value::ObjectId(id));
    }

    #[test]
    fn test_scalar_to_array() {
        assert_eq!(
            cast(TypeTag::Array, Value::from("a")),
            Value::Array(vec![Value::from("a")])
        );
    }
}
