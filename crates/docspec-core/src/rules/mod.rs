//! Filter and Validator collaborators
//!
//! The orchestrator talks to filters and validators only through the async
//! [`Filter`] and [`Validator`] traits. This module also ships the standard
//! implementations used when a schema is built without custom collaborators:
//!
//! - [`filters`] - `defaultValue`, `trim`, `lowercase` and `uppercase` effects
//! - [`validators`] - `required`, `notNull`, `notEmpty`, `regex`, `email`,
//!   `valueLength`, `equality` and `enumeration` rules
//!
//! Collaborator failures are returned as `Err` and abort the enclosing call;
//! data that merely fails a rule is reported as messages.
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

pub mod filters;
pub mod validators;

pub use filters::{DefaultValue, FilterConfig, Privacy, StandardFilter};
pub use validators::{RuleFn, StandardValidator};

use crate::value::Value;
use crate::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

/// Applies filter effects to a field value
#[async_trait]
pub trait Filter: Send + Sync {
    /// Filter a value; `None` stands for an undefined value
    async fn filter(&self, value: Option<Value>, config: &FilterConfig) -> Result<Option<Value>>;
}

/// Runs validation rules against a field value
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate a value, returning zero or more failure messages
    async fn validate(
        &self,
        value: Option<&Value>,
        rules: &RuleSet,
        context: &ValidationContext,
    ) -> Result<Vec<String>>;
}

/// Context handed to validators for one field
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Human-readable field name used in messages
    pub display_name: String,
    /// The top-level data the field belongs to
    pub root: Arc<Value>,
}

impl ValidationContext {
    pub fn new(display_name: impl Into<String>, root: Arc<Value>) -> Self {
        Self {
            display_name: display_name.into(),
            root,
        }
    }
}

/// Ordered rule configuration from a `$validate` descriptor key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet(IndexMap<String, serde_json::Value>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rule: &str) -> Option<&serde_json::Value> {
        self.0.get(rule)
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.0.contains_key(rule)
    }

    pub fn insert(&mut self, rule: impl Into<String>, config: serde_json::Value) {
        self.0.insert(rule.into(), config);
    }

    /// Builder-style insert
    pub fn with(mut self, rule: impl Into<String>, config: serde_json::Value) -> Self {
        self.insert(rule, config);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Overlay another rule set on top of this one
    pub fn extend(&mut self, other: &RuleSet) {
        for (rule, config) in other.iter() {
            self.insert(rule, config.clone());
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RuleSet {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

/// `null`, or a string spelling null in any case, counts as null
pub fn is_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.eq_ignore_ascii_case("null"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_null() {
        assert!(is_null(&Value::Null));
        assert!(is_null(&Value::from("NULL")));
        assert!(is_null(&Value::from("null")));
        assert!(!is_null(&Value::from("nullable")));
        assert!(!is_null(&Value::Number(0.0)));
    }

    #[test]
    fn test_rule_set_keeps_order_and_overlays() {
        let mut rules = RuleSet::new()
            .with("required", json!(true))
            .with("notNull", json!(false));
        rules.extend(&RuleSet::new().with("notNull", json!(true)));

        let names: Vec<&str> = rules.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["required", "notNull"]);
        assert_eq!(rules.get("notNull"), Some(&json!(true)));
    }
}
