//! Spec-driven tree walking
//!
//! [`SchemaMapper`] walks a data tree and its spec tree together and calls a
//! visitor once per field, before descending into that field's children. The
//! visitor receives a [`Slot`] through which it may read, replace or remove the
//! field's value; the walk then descends into whatever the slot holds.
//!
//! Top-level data that is an array is treated as a list of documents, each
//! rooted at the empty path. Locations handed to visitors are relative to that
//! document list: a single document is addressed as element `0`.
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

pub mod query;

pub use query::{walk_query, QueryKey, QueryOperator, QueryVisit};

use crate::spec::{compute_default, resolve_type, spec_at_path, SpecNode};
use crate::types::{TypeRegistry, TypeTag};
use crate::value::{FieldKey, Location, Value};
use crate::Result;

/// Compose the path of a named field below `base`
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

/// Compose the path of an array element below `base`
pub fn index_path(base: &str, index: usize) -> String {
    format!("{}[{}]", base, index)
}

/// Mutable handle on one field of a container
#[derive(Debug)]
pub struct Slot<'d> {
    container: &'d mut Value,
    key: &'d FieldKey,
}

impl<'d> Slot<'d> {
    pub fn new(container: &'d mut Value, key: &'d FieldKey) -> Self {
        Self { container, key }
    }

    pub fn key(&self) -> &FieldKey {
        self.key
    }

    /// Current value, `None` when undefined
    pub fn get(&self) -> Option<&Value> {
        self.container.child(self.key)
    }

    pub fn get_mut(&mut self) -> Option<&mut Value> {
        self.container.child_mut(self.key)
    }

    pub fn container(&self) -> &Value {
        self.container
    }

    /// Store a value; out-of-range array indexes are ignored
    pub fn set(&mut self, value: Value) {
        match (&mut *self.container, self.key) {
            (Value::Object(map), FieldKey::Name(name)) => {
                map.insert(name.clone(), value);
            }
            (Value::Array(items), FieldKey::Index(index)) => {
                if let Some(item) = items.get_mut(*index) {
                    *item = value;
                }
            }
            _ => {}
        }
    }

    /// Remove the value; array elements become null so indexes stay stable
    pub fn remove(&mut self) -> Option<Value> {
        match (&mut *self.container, self.key) {
            (Value::Object(map), FieldKey::Name(name)) => map.shift_remove(name),
            (Value::Array(items), FieldKey::Index(index)) => {
                items.get_mut(*index).map(std::mem::take)
            }
            _ => None,
        }
    }

    /// Store `Some`, remove on `None`
    pub fn put(&mut self, value: Option<Value>) {
        match value {
            Some(value) => self.set(value),
            None => {
                self.remove();
            }
        }
    }
}

/// One visited field
#[derive(Debug)]
pub struct Visit<'s, 'd> {
    /// Spec of the field; `None` for unconstrained data keys
    pub spec: Option<&'s SpecNode>,
    pub field: &'d FieldKey,
    /// Display path such as `house.rooms[0]`
    pub path: &'d str,
    /// Structural location below the document list
    pub location: &'d Location,
    pub slot: Slot<'d>,
}

/// How a document list is walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapperKind {
    /// Nested documents walked against the spec tree
    #[default]
    Map,
    /// `{ "dot.path": value }` objects
    MapPaths,
}

/// Walks data trees against one spec
#[derive(Debug, Clone, Copy)]
pub struct SchemaMapper<'s> {
    spec: &'s SpecNode,
    registry: &'s TypeRegistry,
}

impl<'s> SchemaMapper<'s> {
    pub fn new(spec: &'s SpecNode, registry: &'s TypeRegistry) -> Self {
        Self { spec, registry }
    }

    pub fn spec(&self) -> &'s SpecNode {
        self.spec
    }

    /// Walk a document, or every document of a top-level array
    pub fn map<F>(&self, data: &mut Value, visit: F) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        with_document_list(data, |documents| self.map_documents(documents, visit))
    }

    /// Walk an already wrapped document list
    pub fn map_documents<F>(&self, documents: &mut Value, mut visit: F) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        let count = documents.as_array().map(Vec::len).unwrap_or(0);
        for index in 0..count {
            let key = FieldKey::Index(index);
            let location = Location::root().child(key.clone());
            self.map_field(Some(self.spec), key, documents, "", location, &mut visit)?;
        }
        Ok(())
    }

    /// Walk an already wrapped document list the way `kind` says
    pub fn map_as<F>(&self, kind: MapperKind, documents: &mut Value, visit: F) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        match kind {
            MapperKind::Map => self.map_documents(documents, visit),
            MapperKind::MapPaths => self.map_path_documents(documents, visit),
        }
    }

    /// Walk `{ "dot.path": value }` objects, or a top-level array of them
    ///
    /// Each key is visited once, with the spec found at that path.
    pub fn map_paths<F>(&self, paths: &mut Value, visit: F) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        with_document_list(paths, |documents| self.map_path_documents(documents, visit))
    }

    pub fn map_path_documents<F>(&self, documents: &mut Value, mut visit: F) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        let Some(items) = documents.as_array_mut() else {
            return Ok(());
        };
        for (index, object) in items.iter_mut().enumerate() {
            let keys: Vec<String> = match object.as_object() {
                Some(map) => map.keys().cloned().collect(),
                None => continue,
            };
            let base = Location::root().child(FieldKey::Index(index));
            for path in keys {
                let spec = spec_at_path(self.spec, &path, self.registry);
                let location = base.child(FieldKey::Name(path.clone()));
                let key = FieldKey::Name(path.clone());
                self.map_field(spec, key, object, &path, location, &mut visit)?;
            }
        }
        Ok(())
    }

    fn map_field<F>(
        &self,
        spec: Option<&'s SpecNode>,
        key: FieldKey,
        container: &mut Value,
        path: &str,
        location: Location,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        let field_type = resolve_type(spec, self.registry);
        if let Some(TypeTag::Object | TypeTag::Array) = field_type {
            if container.child(&key).is_none() {
                if let Some(default) = compute_default(field_type, &key) {
                    Slot::new(container, &key).set(default.resolve());
                }
            }
        }

        tracing::trace!("Visiting '{}'", path);
        visit(Visit {
            spec,
            field: &key,
            path,
            location: &location,
            slot: Slot::new(container, &key),
        })?;

        let Some(value) = container.child_mut(&key) else {
            return Ok(());
        };
        match field_type {
            Some(TypeTag::Object) if value.is_object() => {
                self.map_object(spec, value, path, &location, visit)
            }
            Some(TypeTag::Array) if value.is_array() => {
                match spec.and_then(SpecNode::element_spec) {
                    Some(element) => self.map_elements(element, value, path, &location, visit),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    fn map_object<F>(
        &self,
        spec: Option<&'s SpecNode>,
        object: &mut Value,
        base: &str,
        location: &Location,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        for (name, field_spec) in derive_fields(spec, object) {
            if name.starts_with('$') {
                continue;
            }
            let path = join_path(base, &name);
            let key = FieldKey::Name(name);
            let child = location.child(key.clone());
            self.map_field(field_spec, key, object, &path, child, visit)?;
        }
        Ok(())
    }

    fn map_elements<F>(
        &self,
        element: &'s SpecNode,
        array: &mut Value,
        base: &str,
        location: &Location,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(Visit<'s, '_>) -> Result<()>,
    {
        let count = array.as_array().map(Vec::len).unwrap_or(0);
        for index in 0..count {
            let path = index_path(base, index);
            let key = FieldKey::Index(index);
            let child = location.child(key.clone());
            self.map_field(Some(element), key, array, &path, child, visit)?;
        }
        Ok(())
    }
}

/// Field names to visit at one object level, with their specs
///
/// With a wildcard every data key gets the wildcard spec. Otherwise declared
/// fields come first, followed by undeclared data keys without a spec.
fn derive_fields<'s>(spec: Option<&'s SpecNode>, object: &Value) -> Vec<(String, Option<&'s SpecNode>)> {
    let source = spec.and_then(SpecNode::field_source);
    let data_keys = object.as_object().into_iter().flat_map(|map| map.keys());

    if let Some(wildcard) = source.and_then(|source| source.wildcard.as_deref()) {
        return data_keys.map(|key| (key.clone(), Some(wildcard))).collect();
    }

    let mut fields: Vec<(String, Option<&'s SpecNode>)> = source
        .map(|source| {
            source
                .fields
                .iter()
                .map(|(name, node)| (name.clone(), Some(node)))
                .collect()
        })
        .unwrap_or_default();
    for key in data_keys {
        if !source.is_some_and(|source| source.fields.contains_key(key)) {
            fields.push((key.clone(), None));
        }
    }
    fields
}

/// Run `f` over `data` as a document list, wrapping a single document
pub(crate) fn with_document_list<R>(data: &mut Value, f: impl FnOnce(&mut Value) -> R) -> R {
    if data.is_array() {
        return f(data);
    }
    let mut documents = Value::Array(vec![std::mem::take(data)]);
    let result = f(&mut documents);
    *data = unwrap_document_list(documents);
    result
}

/// Inverse of wrapping a single document into a list
pub(crate) fn unwrap_document_list(documents: Value) -> Value {
    match documents {
        Value::Array(mut items) if items.len() == 1 => items.pop().unwrap_or_default(),
        other => other,
    }
}
