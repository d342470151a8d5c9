//! Filter configuration and the standard filter effects
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use super::Filter;
use crate::value::Value;
use crate::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;

/// A default applied to undefined values
#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned on use
    Literal(Value),
    /// A generator called once per use, e.g. for fresh identities
    Generate(fn() -> Value),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Generate(generate) => generate(),
        }
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultValue::Literal(a), DefaultValue::Literal(b)) => a == b,
            (DefaultValue::Generate(a), DefaultValue::Generate(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

/// Privacy marker of a field: always private, or private in one named mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Privacy {
    Always,
    Mode(String),
}

impl Privacy {
    /// Whether a field with this marker is private under `mode`
    ///
    /// `None` is the default mode, matched only by [`Privacy::Always`].
    pub fn applies(&self, mode: Option<&str>) -> bool {
        match self {
            Privacy::Always => true,
            Privacy::Mode(name) => mode == Some(name.as_str()),
        }
    }

    fn from_json(key: &str, json: &serde_json::Value) -> Result<Option<Self>> {
        match json {
            serde_json::Value::Bool(true) => Ok(Some(Privacy::Always)),
            serde_json::Value::Bool(false) | serde_json::Value::Null => Ok(None),
            serde_json::Value::String(mode) => Ok(Some(Privacy::Mode(mode.clone()))),
            other => Err(Error::configuration(format!(
                "'{}' must be a boolean or a mode name, got {}",
                key, other
            ))),
        }
    }
}

/// Contents of a `$filter` descriptor key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    pub default_value: Option<DefaultValue>,
    pub private: Option<Privacy>,
    pub private_value: Option<Privacy>,
    /// Effect name to effect configuration, applied in order
    pub effects: IndexMap<String, serde_json::Value>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A config carrying only a default
    pub fn with_default(default_value: DefaultValue) -> Self {
        Self {
            default_value: Some(default_value),
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, name: impl Into<String>, config: serde_json::Value) -> Self {
        self.effects.insert(name.into(), config);
        self
    }

    pub fn with_private(mut self, privacy: Privacy) -> Self {
        self.private = Some(privacy);
        self
    }

    pub fn with_private_value(mut self, privacy: Privacy) -> Self {
        self.private_value = Some(privacy);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.default_value.is_none()
            && self.private.is_none()
            && self.private_value.is_none()
            && self.effects.is_empty()
    }

    /// Parse a `$filter` object
    pub fn from_json(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut config = FilterConfig::new();
        for (key, json) in map {
            match key.as_str() {
                "defaultValue" => {
                    config.default_value = Some(DefaultValue::Literal(Value::from(json.clone())))
                }
                "private" => config.private = Privacy::from_json(key, json)?,
                "privateValue" => config.private_value = Privacy::from_json(key, json)?,
                _ => {
                    config.effects.insert(key.clone(), json.clone());
                }
            }
        }
        Ok(config)
    }

    /// Overlay another config on top of this one
    pub fn extend(&mut self, other: &FilterConfig) {
        if other.default_value.is_some() {
            self.default_value = other.default_value.clone();
        }
        if other.private.is_some() {
            self.private = other.private.clone();
        }
        if other.private_value.is_some() {
            self.private_value = other.private_value.clone();
        }
        for (name, config) in &other.effects {
            self.effects.insert(name.clone(), config.clone());
        }
    }
}

/// Standard filter effects: `defaultValue`, `trim`, `lowercase`, `uppercase`
///
/// Effects only run when enabled with `true`; unknown effect names are
/// ignored. Privacy markers are consumed by private filtering, not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFilter;

impl StandardFilter {
    pub fn new() -> Self {
        Self
    }

    fn map_string(value: Option<Value>, f: impl Fn(&str) -> String) -> Option<Value> {
        match value {
            Some(Value::String(s)) => Some(Value::String(f(&s))),
            other => other,
        }
    }
}

#[async_trait]
impl Filter for StandardFilter {
    async fn filter(&self, value: Option<Value>, config: &FilterConfig) -> Result<Option<Value>> {
        let mut value = match (value, &config.default_value) {
            (None, Some(default)) => Some(default.resolve()),
            (value, _) => value,
        };

        for (effect, enabled) in &config.effects {
            if enabled != &serde_json::Value::Bool(true) {
                continue;
            }
            value = match effect.as_str() {
                "trim" => Self::map_string(value, |s| s.trim().to_string()),
                "lowercase" => Self::map_string(value, str::to_lowercase),
                "uppercase" => Self::map_string(value, str::to_uppercase),
                _ => {
                    tracing::trace!("Ignoring unknown filter effect '{}'", effect);
                    value
                }
            };
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(json: serde_json::Value) -> FilterConfig {
        match json {
            serde_json::Value::Object(map) => FilterConfig::from_json(&map).unwrap(),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_default_only_fills_undefined() {
        let config = parse(json!({"defaultValue": "none"}));
        let filter = StandardFilter;

        let filled = filter.filter(None, &config).await.unwrap();
        assert_eq!(filled, Some(Value::from("none")));

        let kept = filter.filter(Some(Value::Null), &config).await.unwrap();
        assert_eq!(kept, Some(Value::Null));
    }

    #[tokio::test]
    async fn test_generator_default() {
        let config = FilterConfig::with_default(DefaultValue::Generate(|| Value::from(7i64)));
        let value = StandardFilter.filter(None, &config).await.unwrap();
        assert_eq!(value, Some(Value::Number(7.0)));
    }

    #[tokio::test]
    async fn test_string_effects_in_order() {
        let config = parse(json!({"trim": true, "uppercase": true, "lowercase": false}));
        let value = StandardFilter
            .filter(Some(Value::from("  Kevin ")), &config)
            .await
            .unwrap();
        assert_eq!(value, Some(Value::from("KEVIN")));
    }

    #[tokio::test]
    async fn test_effects_leave_non_strings_alone() {
        let config = parse(json!({"trim": true}));
        let value = StandardFilter
            .filter(Some(Value::Number(3.0)), &config)
            .await
            .unwrap();
        assert_eq!(value, Some(Value::Number(3.0)));
    }

    #[test]
    fn test_privacy_parsing() {
        let config = parse(json!({"private": true, "privateValue": "read"}));
        assert_eq!(config.private, Some(Privacy::Always));
        assert_eq!(config.private_value, Some(Privacy::Mode("read".into())));
        assert!(config.effects.is_empty());

        assert!(Privacy::Always.applies(None));
        assert!(Privacy::Mode("read".into()).applies(Some("read")));
        assert!(!Privacy::Mode("read".into()).applies(None));
    }

    #[test]
    fn test_privacy_rejects_numbers() {
        let map = match json!({"private": 1}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(FilterConfig::from_json(&map).is_err());
    }
}
