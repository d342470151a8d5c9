//! The per-field default, cast, filter and validate pipeline
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use super::{ErrorAccumulator, FieldUnit};
use crate::collaborators::Collaborators;
use crate::mapper::join_path;
use crate::rules::{FilterConfig, ValidationContext};
use crate::spec::{compute_default, resolve_type, Descriptor, SpecNode};
use crate::types::TypeTag;
use crate::value::{FieldKey, Value};
use crate::Result;
use std::sync::Arc;

const SCALAR_TYPE_NAMES: [&str; 3] = ["String", "Number", "Boolean"];

/// Field keys must be non-empty and must not start with `$`
pub fn is_valid_field_name(field: &FieldKey) -> bool {
    match field {
        FieldKey::Index(_) => true,
        FieldKey::Name(name) => !name.is_empty() && !name.starts_with('$'),
    }
}

/// Runs the pipeline for individual fields, reporting into one accumulator
pub struct FieldPipeline<'a> {
    collaborators: &'a Collaborators,
    accumulator: &'a ErrorAccumulator,
    strict_checks: bool,
    default_not_null: Option<bool>,
}

impl<'a> FieldPipeline<'a> {
    pub fn new(collaborators: &'a Collaborators, accumulator: &'a ErrorAccumulator) -> Self {
        Self {
            collaborators,
            accumulator,
            strict_checks: true,
            default_not_null: None,
        }
    }

    /// Disable the unknown-field check, e.g. for query operands
    pub fn with_strict_checks(mut self, enabled: bool) -> Self {
        self.strict_checks = enabled;
        self
    }

    /// Schema-level `notNull` applied where a field does not set its own
    pub fn with_default_not_null(mut self, default_not_null: Option<bool>) -> Self {
        self.default_not_null = default_not_null;
        self
    }

    /// Default, cast, strict-check and filter one field
    ///
    /// Returns the value to write back; `None` is undefined. Validators run
    /// separately in [`FieldPipeline::check`] once every field is written back.
    pub async fn prepare(&self, unit: &FieldUnit<'_>) -> Result<Option<Value>> {
        let path = unit.path.as_str();
        let descriptor = unit.spec.and_then(SpecNode::as_descriptor);
        let filter = &self.collaborators.filter;

        if !is_valid_field_name(&unit.field) {
            self.accumulator.append(path, "Invalid field name");
        }

        let field_type = resolve_type(unit.spec, &self.collaborators.registry);
        let mut value = unit.value.clone();

        // Defaults run before casting so that e.g. "now" can become a Date
        let default = compute_default(field_type, &unit.field)
            .or_else(|| descriptor.and_then(|d| d.filter.default_value.clone()));
        if let Some(default) = default {
            value = filter.filter(value, &FilterConfig::with_default(default)).await?;
        }

        value = match (value, field_type) {
            (Some(current), Some(tag)) if tag.is_castable() && !current.is_null() => {
                Some(self.type_cast(tag, current, path)?)
            }
            (value, _) => value,
        };

        if field_type == Some(TypeTag::Object) && unit.strict && self.strict_checks {
            self.check_declared(unit.spec, value.as_ref(), path);
        }

        let empty = FilterConfig::default();
        let filters = descriptor.map(|d| &d.filter).unwrap_or(&empty);
        value = filter.filter(value, filters).await?;

        tracing::trace!("Field '{}' prepared", path);
        Ok(value)
    }

    /// Run the validators of one field against its final `value`
    ///
    /// `root` is the written-back data the field belongs to.
    pub async fn check(
        &self,
        unit: &FieldUnit<'_>,
        value: Option<&Value>,
        root: Arc<Value>,
    ) -> Result<()> {
        let descriptor = unit.spec.and_then(SpecNode::as_descriptor);
        let mut rules = descriptor.map(|d| d.validate.clone()).unwrap_or_default();
        if !rules.contains("notNull") {
            if let Some(not_null) = self.default_not_null {
                rules.insert("notNull", serde_json::Value::Bool(not_null));
            }
        }
        if rules.is_empty() {
            return Ok(());
        }

        let display_name = descriptor
            .and_then(Descriptor::label)
            .map(str::to_string)
            .unwrap_or_else(|| unit.field.to_string());
        let context = ValidationContext::new(display_name, root);
        let messages = self
            .collaborators
            .validator
            .validate(value, &rules, &context)
            .await?;
        for message in messages {
            self.accumulator.append(&unit.path, message);
        }
        Ok(())
    }

    fn check_declared(&self, spec: Option<&SpecNode>, value: Option<&Value>, path: &str) {
        let Some(Value::Object(map)) = value else {
            return;
        };
        for key in map.keys() {
            if !spec.is_some_and(|spec| spec.declares(key)) {
                self.accumulator
                    .append(&join_path(path, key), "Field not specified");
            }
        }
    }

    /// Cast `value` to `required`, reporting at `path` when the cast fails
    ///
    /// The best-effort result is returned even on failure.
    pub fn type_cast(&self, required: TypeTag, value: Value, path: &str) -> Result<Value> {
        if required == TypeTag::Object
            && matches!(value, Value::Object(_) | Value::Date(_) | Value::ObjectId(_))
        {
            return Ok(value);
        }

        let caster = &self.collaborators.caster;
        let required_name = caster.type_tag_name(required);
        let value_name = caster.get_type_name(&value);
        if required_name == value_name {
            return Ok(value);
        }

        let result = caster.cast(required, &value)?;
        let result_name = caster.get_type_name(&result);
        let not_a_number = value_name != "Number"
            && result_name == "Number"
            && result.as_f64().is_some_and(f64::is_nan);

        if result_name != required_name || not_a_number {
            self.accumulator
                .append(path, cast_error(&value, &value_name, required_name));
        }
        Ok(result)
    }
}

fn cast_error(value: &Value, value_name: &str, required_name: &str) -> String {
    if SCALAR_TYPE_NAMES.contains(&value_name) {
        format!(
            "'{}' of type {} cannot be cast to type {}",
            value, value_name, required_name
        )
    } else {
        format!(
            "Value of type {} cannot be cast to type {}",
            value_name, required_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Location;
    use serde_json::json;

    fn unit<'s>(spec: Option<&'s SpecNode>, field: &str, value: Option<Value>) -> FieldUnit<'s> {
        FieldUnit {
            spec,
            field: FieldKey::from(field),
            path: field.to_string(),
            location: Location::root().child(FieldKey::from(field)),
            value,
            strict: false,
        }
    }

    fn root() -> Arc<Value> {
        Arc::new(Value::object())
    }

    #[test]
    fn test_field_names() {
        assert!(is_valid_field_name(&FieldKey::from("name")));
        assert!(is_valid_field_name(&FieldKey::from("name.first")));
        assert!(is_valid_field_name(&FieldKey::Index(3)));
        assert!(!is_valid_field_name(&FieldKey::from("$where")));
        assert!(!is_valid_field_name(&FieldKey::from("")));
    }

    #[test]
    fn test_type_cast_messages() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator);

        let cast = pipeline.type_cast(TypeTag::Number, Value::from("33"), "age").unwrap();
        assert_eq!(cast, Value::Number(33.0));

        let cast = pipeline.type_cast(TypeTag::Number, Value::from("abc"), "pi").unwrap();
        assert!(cast.as_f64().unwrap().is_nan());

        let object = Value::from(json!({"age": "33"}));
        let cast = pipeline.type_cast(TypeTag::String, object.clone(), "person").unwrap();
        assert_eq!(cast, object);

        let result = accumulator.into_result();
        assert!(result.errors_at("age").is_empty());
        assert_eq!(result.errors_at("pi"), ["'abc' of type String cannot be cast to type Number"]);
        assert_eq!(
            result.errors_at("person"),
            ["Value of type Object cannot be cast to type String"]
        );
    }

    #[test]
    fn test_object_accepts_any_non_array_object() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator);

        for (value, path) in [
            (Value::from(json!({"a": 1})), "a"),
            (Value::from(chrono::Utc::now()), "b"),
            (Value::from(json!([1])), "c"),
        ] {
            pipeline.type_cast(TypeTag::Object, value, path).unwrap();
        }

        let result = accumulator.into_result();
        assert_eq!(result.errors.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[tokio::test]
    async fn test_prepare_defaults_then_casts() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator);
        let spec = SpecNode::from_json(&json!({"$type": "Number", "$filter": {"defaultValue": "5"}}))
            .unwrap();

        let value = pipeline.prepare(&unit(Some(&spec), "count", None)).await.unwrap();
        assert_eq!(value, Some(Value::Number(5.0)));
        assert!(accumulator.is_empty());
    }

    #[tokio::test]
    async fn test_prepare_generates_identity() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator);
        let spec = SpecNode::Named("ObjectId".into());

        let value = pipeline.prepare(&unit(Some(&spec), "_id", None)).await.unwrap();
        assert!(matches!(value, Some(Value::ObjectId(_))));
    }

    #[tokio::test]
    async fn test_prepare_null_is_not_cast() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator);
        let spec = SpecNode::Named("Number".into());

        let value = pipeline
            .prepare(&unit(Some(&spec), "age", Some(Value::Null)))
            .await
            .unwrap();
        assert_eq!(value, Some(Value::Null));
        assert!(accumulator.is_empty());
    }

    #[tokio::test]
    async fn test_strict_checks_and_default_not_null() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator).with_default_not_null(Some(true));
        let spec = SpecNode::from_json(&json!({"age": "Number"})).unwrap();

        let mut strict = unit(Some(&spec), "person", Some(Value::from(json!({"age": 1, "pi": 3}))));
        strict.strict = true;
        pipeline.prepare(&strict).await.unwrap();
        let nothing = unit(None, "nothing", Some(Value::Null));
        pipeline.check(&nothing, Some(&Value::Null), root()).await.unwrap();

        let result = accumulator.into_result();
        assert_eq!(result.errors_at("person.pi"), ["Field not specified"]);
        assert_eq!(result.errors_at("nothing"), ["nothing cannot be null"]);
    }

    #[tokio::test]
    async fn test_strict_checks_can_be_disabled() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator).with_strict_checks(false);
        let spec = SpecNode::from_json(&json!({"age": "Number"})).unwrap();

        let mut strict = unit(Some(&spec), "person", Some(Value::from(json!({"pi": 3}))));
        strict.strict = true;
        pipeline.prepare(&strict).await.unwrap();
        assert!(accumulator.is_empty());
    }

    #[tokio::test]
    async fn test_check_reads_siblings_from_root() {
        let collaborators = Collaborators::standard();
        let accumulator = ErrorAccumulator::new();
        let pipeline = FieldPipeline::new(&collaborators, &accumulator);
        let spec = SpecNode::from_json(&json!({"$type": "Number", "$validate": {"equality": "pin"}}))
            .unwrap();
        let confirm = unit(Some(&spec), "confirm", Some(Value::Number(1234.0)));

        let root = Arc::new(Value::from(json!({"pin": 1234, "confirm": 1234})));
        pipeline.check(&confirm, Some(&Value::Number(1234.0)), root).await.unwrap();
        assert!(accumulator.is_empty());

        let root = Arc::new(Value::from(json!({"pin": "1234", "confirm": 1234})));
        pipeline.check(&confirm, Some(&Value::Number(1234.0)), root).await.unwrap();
        assert_eq!(accumulator.into_result().errors_at("confirm"), ["confirm does not match pin"]);
    }
}
