//! `$schema` expansion
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use super::{Descriptor, SpecNode};
use crate::{Error, Result};
use indexmap::IndexMap;

/// Expand every `$schema` reference in `spec` using the registered `schemas`
///
/// Keys set next to `$schema` overlay the referenced spec. A reference to a
/// schema that is already being expanded (`root_name` counts as such) is left
/// in place unexpanded.
pub fn normalize(
    spec: &SpecNode,
    schemas: &IndexMap<String, SpecNode>,
    root_name: Option<&str>,
) -> Result<SpecNode> {
    let mut expanding: Vec<String> = root_name.map(str::to_string).into_iter().collect();
    expand(spec, schemas, &mut expanding)
}

fn expand(
    node: &SpecNode,
    schemas: &IndexMap<String, SpecNode>,
    expanding: &mut Vec<String>,
) -> Result<SpecNode> {
    match node {
        SpecNode::List(Some(element)) => Ok(SpecNode::list(expand(element, schemas, expanding)?)),
        SpecNode::Descriptor(descriptor) => expand_descriptor(descriptor, schemas, expanding),
        other => Ok(other.clone()),
    }
}

fn expand_boxed(
    node: &Option<Box<SpecNode>>,
    schemas: &IndexMap<String, SpecNode>,
    expanding: &mut Vec<String>,
) -> Result<Option<Box<SpecNode>>> {
    node.as_deref()
        .map(|node| expand(node, schemas, expanding).map(Box::new))
        .transpose()
}

fn expand_descriptor(
    descriptor: &Descriptor,
    schemas: &IndexMap<String, SpecNode>,
    expanding: &mut Vec<String>,
) -> Result<SpecNode> {
    let mut fields = IndexMap::with_capacity(descriptor.fields.len());
    for (name, node) in &descriptor.fields {
        fields.insert(name.clone(), expand(node, schemas, expanding)?);
    }
    let mut local = Descriptor {
        type_spec: expand_boxed(&descriptor.type_spec, schemas, expanding)?,
        element: expand_boxed(&descriptor.element, schemas, expanding)?,
        wildcard: expand_boxed(&descriptor.wildcard, schemas, expanding)?,
        fields,
        validate: descriptor.validate.clone(),
        filter: descriptor.filter.clone(),
        strict: descriptor.strict,
        display_name: descriptor.display_name.clone(),
        name: descriptor.name.clone(),
        schema: descriptor.schema.clone(),
        construct: descriptor.construct.clone(),
        path_ref: descriptor.path_ref.clone(),
    };

    let Some(name) = local.schema.clone() else {
        return Ok(local.into());
    };
    if expanding.contains(&name) {
        tracing::warn!("Recursive schema reference '{}' left unexpanded", name);
        return Ok(local.into());
    }
    let referenced = schemas
        .get(&name)
        .ok_or_else(|| Error::SchemaNotFound { name: name.clone() })?;

    expanding.push(name);
    let base = expand(referenced, schemas, expanding);
    expanding.pop();

    local.schema = None;
    Ok(overlay(base?, local))
}

fn overlay(base: SpecNode, local: Descriptor) -> SpecNode {
    match base {
        SpecNode::Descriptor(mut merged) => {
            merged.overlay(local);
            SpecNode::Descriptor(merged)
        }
        other if local == Descriptor::default() => other,
        other => {
            let mut local = local;
            if local.type_spec.is_none() {
                local.type_spec = Some(Box::new(other));
            }
            local.into()
        }
    }
}

impl Descriptor {
    /// Overwrite this descriptor with every key `local` sets
    pub fn overlay(&mut self, local: Descriptor) {
        if local.type_spec.is_some() {
            self.type_spec = local.type_spec;
        }
        self.validate.extend(&local.validate);
        self.filter.extend(&local.filter);
        if local.strict.is_some() {
            self.strict = local.strict;
        }
        if local.display_name.is_some() {
            self.display_name = local.display_name;
        }
        if local.name.is_some() {
            self.name = local.name;
        }
        if local.element.is_some() {
            self.element = local.element;
        }
        if local.construct.is_some() {
            self.construct = local.construct;
        }
        if local.path_ref.is_some() {
            self.path_ref = local.path_ref;
        }
        if local.wildcard.is_some() {
            self.wildcard = local.wildcard;
        }
        self.fields.extend(local.fields);
    }
}
