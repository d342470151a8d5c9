//! Type resolution, structural defaults and path lookup over spec trees
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use super::SpecNode;
use crate::accessor::parse_path;
use crate::rules::DefaultValue;
use crate::types::{TypeRegistry, TypeTag};
use crate::value::{FieldKey, ObjectId, Value};

/// Name of the document identity field
pub const ID_FIELD: &str = "_id";

/// Resolve the type a spec node declares; `None` means unconstrained
///
/// Descriptors without `$type` are objects; `$type` may itself be any node,
/// including another descriptor or a type name.
pub fn resolve_type(node: Option<&SpecNode>, registry: &TypeRegistry) -> Option<TypeTag> {
    match node? {
        SpecNode::Type(tag) => Some(*tag),
        SpecNode::Named(name) => {
            let tag = registry.lookup(name);
            if tag.is_none() {
                tracing::warn!("Unknown type name '{}', treating field as unconstrained", name);
            }
            tag
        }
        SpecNode::List(_) => Some(TypeTag::Array),
        SpecNode::Descriptor(descriptor) => match descriptor.type_spec.as_deref() {
            Some(type_spec) => resolve_type(Some(type_spec), registry),
            None => Some(TypeTag::Object),
        },
    }
}

fn new_object_id() -> Value {
    Value::ObjectId(ObjectId::new())
}

/// Default a field of type `tag` receives when undefined
pub fn compute_default(tag: Option<TypeTag>, field: &FieldKey) -> Option<DefaultValue> {
    match tag? {
        TypeTag::Object => Some(DefaultValue::Literal(Value::object())),
        TypeTag::Array => Some(DefaultValue::Literal(Value::array())),
        TypeTag::ObjectId if field.as_name() == Some(ID_FIELD) => {
            Some(DefaultValue::Generate(new_object_id))
        }
        _ => None,
    }
}

/// The spec node addressed by a dot/bracket path below `root`
///
/// Returns `None` when the path leaves the declared shape or cannot be parsed.
pub fn spec_at_path<'s>(
    root: &'s SpecNode,
    path: &str,
    registry: &TypeRegistry,
) -> Option<&'s SpecNode> {
    let keys = match parse_path(path) {
        Ok(keys) => keys,
        Err(err) => {
            tracing::debug!("No spec for path '{}': {}", path, err);
            return None;
        }
    };

    let mut current = root;
    for key in &keys {
        let is_array = resolve_type(Some(current), registry) == Some(TypeTag::Array);
        current = match key {
            FieldKey::Index(_) if is_array => current.element_spec()?,
            FieldKey::Index(index) => current.field(&index.to_string())?,
            FieldKey::Name(name) if is_array => current.element_spec()?.field(name)?,
            FieldKey::Name(name) => current.field(name)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Descriptor;
    use serde_json::json;

    fn spec(json: serde_json::Value) -> SpecNode {
        SpecNode::from_json(&json).unwrap()
    }

    #[test]
    fn test_resolve_type_precedence() {
        let registry = TypeRegistry::standard();
        let resolve = |node: &SpecNode| resolve_type(Some(node), &registry);

        assert_eq!(resolve(&SpecNode::Type(TypeTag::Date)), Some(TypeTag::Date));
        assert_eq!(resolve(&spec(json!("Number"))), Some(TypeTag::Number));
        assert_eq!(resolve(&spec(json!(["String"]))), Some(TypeTag::Array));
        assert_eq!(resolve(&spec(json!({"a": "String"}))), Some(TypeTag::Object));
        assert_eq!(resolve(&spec(json!({"$type": "Boolean"}))), Some(TypeTag::Boolean));
        assert_eq!(
            resolve(&spec(json!({"$type": {"$type": "Date"}}))),
            Some(TypeTag::Date)
        );
        assert_eq!(resolve(&spec(json!({"$type": ["Number"]}))), Some(TypeTag::Array));
        assert_eq!(resolve(&spec(json!("Unknown"))), None);
        assert_eq!(resolve_type(None, &registry), None);
    }

    #[test]
    fn test_compute_default() {
        assert_eq!(
            compute_default(Some(TypeTag::Object), &FieldKey::from("a")),
            Some(DefaultValue::Literal(Value::object()))
        );
        assert_eq!(
            compute_default(Some(TypeTag::Array), &FieldKey::Index(0)),
            Some(DefaultValue::Literal(Value::array()))
        );
        assert_eq!(compute_default(Some(TypeTag::ObjectId), &FieldKey::from("owner")), None);
        assert_eq!(compute_default(Some(TypeTag::String), &FieldKey::from("_id")), None);
        assert_eq!(compute_default(None, &FieldKey::from("_id")), None);

        match compute_default(Some(TypeTag::ObjectId), &FieldKey::from("_id")) {
            Some(default) => assert!(matches!(default.resolve(), Value::ObjectId(_))),
            None => panic!("identity field should get a generated default"),
        }
    }

    #[test]
    fn test_spec_at_path() {
        let registry = TypeRegistry::standard();
        let root = spec(json!({
            "name": {"first": "String"},
            "children": [{"name": "String", "age": "Number"}],
            "scores": {"$type": "Array", "$spec": "Number"},
            "meta": {"*": "Date"}
        }));
        let at = |path: &str| spec_at_path(&root, path, &registry);

        assert_eq!(at("name.first"), Some(&SpecNode::Named("String".into())));
        assert_eq!(at("children[0].age"), Some(&SpecNode::Named("Number".into())));
        assert_eq!(at("children.1.age"), Some(&SpecNode::Named("Number".into())));
        assert_eq!(at("children.name"), Some(&SpecNode::Named("String".into())));
        assert_eq!(at("scores[3]"), Some(&SpecNode::Named("Number".into())));
        assert_eq!(at("meta.created"), Some(&SpecNode::Named("Date".into())));
        assert_eq!(at(""), Some(&root));
        assert_eq!(at("name.last"), None);
        assert_eq!(at("name..first"), None);
    }

    #[test]
    fn test_spec_at_path_numeric_field_name() {
        let registry = TypeRegistry::standard();
        let root = SpecNode::from(Descriptor::new().with_field("2024", TypeTag::Number));
        assert_eq!(
            spec_at_path(&root, "2024", &registry),
            Some(&SpecNode::Type(TypeTag::Number))
        );
    }
}
