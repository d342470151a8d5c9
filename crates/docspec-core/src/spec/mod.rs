//! Spec trees
//!
//! A spec node is either a type token, a homogeneous list or a descriptor
//! carrying reserved `$` keys next to ordinary nested fields. Specs are
//! normally authored as JSON and parsed with [`SpecNode::from_json`]:
//!
//! ```
//! use docspec_core::spec::SpecNode;
//! use serde_json::json;
//!
//! let spec = SpecNode::from_json(&json!({
//!     "name": {"$type": "String", "$validate": {"required": true}},
//!     "tags": ["String"],
//!     "address": {"city": "String", "*": "Mixed"}
//! })).unwrap();
//! assert!(spec.as_descriptor().is_some());
//! ```
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

mod normalize;
mod resolve;

pub use normalize::normalize;
pub use resolve::{compute_default, resolve_type, spec_at_path};

use crate::rules::{FilterConfig, RuleSet};
use crate::types::TypeTag;
use crate::{Error, Result};
use indexmap::IndexMap;

/// Key that applies one spec to every data key at its level
pub const WILDCARD: &str = "*";

/// A node of a spec tree
#[derive(Debug, Clone, PartialEq)]
pub enum SpecNode {
    /// A concrete type
    Type(TypeTag),
    /// A type named by string, resolved through the type registry
    Named(String),
    /// A homogeneous array, optionally with an element spec
    List(Option<Box<SpecNode>>),
    /// A descriptor mapping
    Descriptor(Box<Descriptor>),
}

/// Reserved keys and nested fields of a descriptor node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    /// `$type`: redirects type resolution; absent means Object
    pub type_spec: Option<Box<SpecNode>>,
    /// `$validate`
    pub validate: RuleSet,
    /// `$filter`
    pub filter: FilterConfig,
    /// `$strict`
    pub strict: Option<bool>,
    /// `$displayName`
    pub display_name: Option<String>,
    /// `$name`
    pub name: Option<String>,
    /// `$spec`: element spec of an Array-typed descriptor
    pub element: Option<Box<SpecNode>>,
    /// `$schema`: name of a sibling schema to expand in place
    pub schema: Option<String>,
    /// `$construct`: name of a registered constructor
    pub construct: Option<String>,
    /// `$pathRef`: transient field populated from another root path
    pub path_ref: Option<String>,
    /// Ordinary nested fields, in declaration order
    pub fields: IndexMap<String, SpecNode>,
    /// `'*'`
    pub wildcard: Option<Box<SpecNode>>,
}

impl SpecNode {
    /// Parse an authored JSON spec
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Self::parse(json, "")
    }

    fn parse(json: &serde_json::Value, path: &str) -> Result<Self> {
        let invalid = |message: String| Error::InvalidSpec {
            path: path.to_string(),
            message,
        };

        match json {
            serde_json::Value::String(name) => Ok(SpecNode::Named(name.clone())),
            serde_json::Value::Array(items) => match items.as_slice() {
                [] => Ok(SpecNode::List(None)),
                [element] => {
                    let element = Self::parse(element, &format!("{}[0]", path))?;
                    Ok(SpecNode::List(Some(Box::new(element))))
                }
                _ => Err(invalid(format!(
                    "a list spec holds one element spec, found {}",
                    items.len()
                ))),
            },
            serde_json::Value::Object(map) => {
                Descriptor::parse(map, path).map(|d| SpecNode::Descriptor(Box::new(d)))
            }
            other => Err(invalid(format!("unsupported spec node {}", other))),
        }
    }

    /// A descriptor node with nested fields only
    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, SpecNode)>,
        S: Into<String>,
    {
        SpecNode::Descriptor(Box::new(Descriptor::with_fields(fields)))
    }

    /// A list node with an element spec
    pub fn list(element: SpecNode) -> Self {
        SpecNode::List(Some(Box::new(element)))
    }

    pub fn as_descriptor(&self) -> Option<&Descriptor> {
        match self {
            SpecNode::Descriptor(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn as_descriptor_mut(&mut self) -> Option<&mut Descriptor> {
        match self {
            SpecNode::Descriptor(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Element spec of an array node: the list element or a descriptor's `$spec`
    pub fn element_spec(&self) -> Option<&SpecNode> {
        match self {
            SpecNode::List(element) => element.as_deref(),
            SpecNode::Descriptor(descriptor) => descriptor.element.as_deref(),
            _ => None,
        }
    }

    /// The descriptor whose fields describe the children of an object node
    ///
    /// An Object-typed descriptor that declares no fields of its own may
    /// describe them under `$spec` instead.
    pub fn field_source(&self) -> Option<&Descriptor> {
        let descriptor = self.as_descriptor()?;
        if descriptor.fields.is_empty() && descriptor.wildcard.is_none() {
            if let Some(SpecNode::Descriptor(nested)) = descriptor.element.as_deref() {
                return Some(nested);
            }
        }
        Some(descriptor)
    }

    /// Spec of the child field `name`, honouring the wildcard
    pub fn field(&self, name: &str) -> Option<&SpecNode> {
        let source = self.field_source()?;
        match source.wildcard.as_deref() {
            Some(wildcard) => Some(wildcard),
            None => source.fields.get(name),
        }
    }

    /// Whether `name` is a declared child at this level
    pub fn declares(&self, name: &str) -> bool {
        self.field_source()
            .map(|source| source.wildcard.is_some() || source.fields.contains_key(name))
            .unwrap_or(false)
    }
}

impl From<TypeTag> for SpecNode {
    fn from(tag: TypeTag) -> Self {
        SpecNode::Type(tag)
    }
}

impl From<Descriptor> for SpecNode {
    fn from(descriptor: Descriptor) -> Self {
        SpecNode::Descriptor(Box::new(descriptor))
    }
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, SpecNode)>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(name, node)| (name.into(), node)).collect(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, type_spec: impl Into<SpecNode>) -> Self {
        self.type_spec = Some(Box::new(type_spec.into()));
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>, config: serde_json::Value) -> Self {
        self.validate.insert(rule, config);
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_element(mut self, element: impl Into<SpecNode>) -> Self {
        self.element = Some(Box::new(element.into()));
        self
    }

    pub fn with_schema(mut self, name: impl Into<String>) -> Self {
        self.schema = Some(name.into());
        self
    }

    pub fn with_construct(mut self, name: impl Into<String>) -> Self {
        self.construct = Some(name.into());
        self
    }

    pub fn with_path_ref(mut self, path: impl Into<String>) -> Self {
        self.path_ref = Some(path.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, node: impl Into<SpecNode>) -> Self {
        self.fields.insert(name.into(), node.into());
        self
    }

    pub fn with_wildcard(mut self, node: impl Into<SpecNode>) -> Self {
        self.wildcard = Some(Box::new(node.into()));
        self
    }

    /// Human readable name: `$displayName`, then `$name`
    pub fn label(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.name.as_deref())
    }

    fn parse(map: &serde_json::Map<String, serde_json::Value>, path: &str) -> Result<Self> {
        let mut descriptor = Descriptor::new();

        for (key, json) in map {
            let key_path = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            let text = |json: &serde_json::Value| -> Result<String> {
                json.as_str().map(str::to_string).ok_or_else(|| Error::InvalidSpec {
                    path: key_path.clone(),
                    message: "expected a string".to_string(),
                })
            };
            let object = |json: &serde_json::Value| {
                json.as_object().cloned().ok_or_else(|| Error::InvalidSpec {
                    path: key_path.clone(),
                    message: "expected an object".to_string(),
                })
            };

            match key.as_str() {
                "$type" => {
                    descriptor.type_spec = Some(Box::new(SpecNode::parse(json, &key_path)?))
                }
                "$validate" => descriptor.validate = RuleSet::from(object(json)?),
                "$filter" => descriptor.filter = FilterConfig::from_json(&object(json)?)?,
                "$strict" => {
                    descriptor.strict = Some(json.as_bool().ok_or_else(|| Error::InvalidSpec {
                        path: key_path.clone(),
                        message: "expected a boolean".to_string(),
                    })?)
                }
                "$displayName" => descriptor.display_name = Some(text(json)?),
                "$name" => descriptor.name = Some(text(json)?),
                "$spec" => descriptor.element = Some(Box::new(SpecNode::parse(json, &key_path)?)),
                "$schema" => descriptor.schema = Some(text(json)?),
                "$construct" => descriptor.construct = Some(text(json)?),
                "$pathRef" => descriptor.path_ref = Some(text(json)?),
                WILDCARD => {
                    descriptor.wildcard = Some(Box::new(SpecNode::parse(json, &key_path)?))
                }
                reserved if reserved.starts_with('$') => {
                    tracing::debug!("Ignoring unknown descriptor key '{}'", key_path);
                }
                _ => {
                    let node = SpecNode::parse(json, &key_path)?;
                    descriptor.fields.insert(key.clone(), node);
                }
            }
        }

        Ok(descriptor)
    }
}
