//! Standard validation rules
//!
//! Every rule receives its configuration from `$validate`: `true` enables it,
//! `false` or `null` disables it, and any other value is the rule's options.
//! Options objects may carry a `message` overriding the default text, where
//! `{name}` expands to the field's display name.
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use super::{is_null, RuleSet, ValidationContext, Validator};
use crate::accessor::ObjectPathAccessor;
use crate::value::Value;
use crate::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// A rule check: `Ok(Some(message))` when the value fails the rule
pub type RuleFn = Arc<
    dyn Fn(Option<&Value>, &serde_json::Value, &ValidationContext) -> Result<Option<String>>
        + Send
        + Sync,
>;

/// Validator with the built-in rules and any registered custom rules
#[derive(Clone)]
pub struct StandardValidator {
    rules: IndexMap<String, RuleFn>,
}

impl std::fmt::Debug for StandardValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardValidator")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardValidator {
    pub fn new() -> Self {
        let mut validator = Self {
            rules: IndexMap::new(),
        };
        validator.register("required", required);
        validator.register("notNull", not_null);
        validator.register("notEmpty", not_empty);
        validator.register("regex", regex_rule);
        validator.register("email", email);
        validator.register("valueLength", value_length);
        validator.register("equality", equality);
        validator.register("enumeration", enumeration);
        validator
    }

    /// Register or replace a rule
    pub fn register<F>(&mut self, name: impl Into<String>, rule: F)
    where
        F: Fn(Option<&Value>, &serde_json::Value, &ValidationContext) -> Result<Option<String>>
            + Send
            + Sync
            + 'static,
    {
        self.rules.insert(name.into(), Arc::new(rule));
    }

    pub fn with_rule<F>(mut self, name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &serde_json::Value, &ValidationContext) -> Result<Option<String>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, rule);
        self
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }
}

#[async_trait]
impl Validator for StandardValidator {
    async fn validate(
        &self,
        value: Option<&Value>,
        rules: &RuleSet,
        context: &ValidationContext,
    ) -> Result<Vec<String>> {
        let mut messages = Vec::new();

        for (name, config) in rules.iter() {
            if matches!(config, serde_json::Value::Bool(false) | serde_json::Value::Null) {
                continue;
            }
            let Some(rule) = self.rules.get(name) else {
                log::warn!("Skipping unknown validation rule '{}'", name);
                continue;
            };
            if let Some(message) = rule(value, config, context)? {
                messages.push(custom_message(config, context).unwrap_or(message));
            }
        }

        Ok(messages)
    }
}

fn custom_message(config: &serde_json::Value, context: &ValidationContext) -> Option<String> {
    config
        .get("message")
        .and_then(serde_json::Value::as_str)
        .map(|message| message.replace("{name}", &context.display_name))
}

/// The rule's main option: the config itself, or `key` inside an options object
fn option<'a>(config: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    match config {
        serde_json::Value::Object(options) => options.get(key),
        serde_json::Value::Bool(true) => None,
        other => Some(other),
    }
}

/// Present, non-null value
fn defined(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| !value.is_null())
}

fn required(
    value: Option<&Value>,
    _config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    Ok(value
        .is_none()
        .then(|| format!("{} is required", context.display_name)))
}

fn not_null(
    value: Option<&Value>,
    _config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    Ok(value
        .filter(|value| is_null(value))
        .map(|_| format!("{} cannot be null", context.display_name)))
}

fn not_empty(
    value: Option<&Value>,
    _config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    let empty = match value {
        None => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(value) => !value.is_truthy(),
    };
    Ok(empty.then(|| format!("{} cannot be empty", context.display_name)))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Configuration {
        message: format!("Invalid regex pattern '{}'", pattern),
        source: Some(e.into()),
    })
}

fn regex_rule(
    value: Option<&Value>,
    config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    let pattern = option(config, "pattern")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::configuration("regex rule needs a pattern"))?;
    let regex = compile(pattern)?;

    Ok(defined(value)
        .filter(|value| !regex.is_match(&value.to_string()))
        .map(|_| format!("{} is invalid", context.display_name)))
}

fn email(
    value: Option<&Value>,
    _config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let regex = match EMAIL.get() {
        Some(regex) => regex,
        None => {
            let compiled = compile(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")?;
            EMAIL.get_or_init(|| compiled)
        }
    };

    Ok(defined(value)
        .filter(|value| !regex.is_match(&value.to_string()))
        .map(|_| format!("{} must be a valid email address", context.display_name)))
}

fn value_length(
    value: Option<&Value>,
    config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    let bound = |key: &str| option(config, key).and_then(serde_json::Value::as_u64);
    let (min, max) = match config {
        serde_json::Value::Number(n) => (None, n.as_u64()),
        _ => (bound("min"), bound("max")),
    };
    if min.is_none() && max.is_none() {
        return Err(Error::configuration("valueLength rule needs a min or max"));
    }

    let length = match defined(value) {
        Some(Value::String(s)) => s.chars().count() as u64,
        Some(Value::Array(items)) => items.len() as u64,
        _ => return Ok(None),
    };

    let name = &context.display_name;
    Ok(match (min, max) {
        (Some(min), _) if length < min => {
            Some(format!("{} must have a length of at least {}", name, min))
        }
        (_, Some(max)) if length > max => {
            Some(format!("{} must have a length of at most {}", name, max))
        }
        _ => None,
    })
}

fn equality(
    value: Option<&Value>,
    config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    let path = option(config, "path")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| Error::configuration("equality rule needs a path"))?;
    let other = ObjectPathAccessor.get_path(path, &context.root)?;

    Ok((value != other).then(|| format!("{} does not match {}", context.display_name, path)))
}

fn enumeration(
    value: Option<&Value>,
    config: &serde_json::Value,
    context: &ValidationContext,
) -> Result<Option<String>> {
    let allowed: Vec<Value> = option(config, "values")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| Error::configuration("enumeration rule needs a list of values"))?
        .iter()
        .cloned()
        .map(Value::from)
        .collect();

    Ok(defined(value)
        .filter(|value| !allowed.contains(value))
        .map(|_| {
            let names: Vec<String> = allowed.iter().map(Value::to_string).collect();
            format!("{} must be one of: {}", context.display_name, names.join(", "))
        }))
}
