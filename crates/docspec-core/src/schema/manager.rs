//! Cross-registration of related schemas

use super::{Constructor, Schema};
use crate::spec::SpecNode;
use indexmap::IndexMap;
use std::sync::Arc;

/// Keeps a set of schemas that may reference each other with `$schema`
#[derive(Debug, Default, Clone)]
pub struct SchemaManager {
    schemas: IndexMap<String, Schema>,
    constructors: ConstructorSet,
}

#[derive(Default, Clone)]
struct ConstructorSet(IndexMap<String, Constructor>);

impl std::fmt::Debug for ConstructorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.keys()).finish()
    }
}

impl SchemaManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manage `schema` under its name, replacing any schema of that name
    pub fn add_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.name().to_string(), schema);
    }

    pub fn add_schemas<I>(&mut self, schemas: I)
    where
        I: IntoIterator<Item = Schema>,
    {
        for schema in schemas {
            self.add_schema(schema);
        }
    }

    pub fn add_constructor<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(crate::Value) -> crate::Result<crate::Value> + Send + Sync + 'static,
    {
        self.constructors.0.insert(name.into(), Arc::new(constructor));
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schema_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.schemas.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Register every managed schema and constructor with every managed schema
    pub fn init(&mut self) {
        let specs: Vec<(String, SpecNode)> = self
            .schemas
            .iter()
            .map(|(name, schema)| (name.clone(), schema.source().clone()))
            .collect();

        for schema in self.schemas.values_mut() {
            for (name, spec) in &specs {
                schema.register_spec(name, spec.clone());
            }
            schema.add_constructors(
                self.constructors
                    .0
                    .iter()
                    .map(|(name, constructor)| (name.clone(), constructor.clone())),
            );
        }
        tracing::debug!(
            "Initialised {} schemas with {} constructors",
            self.schemas.len(),
            self.constructors.0.len()
        );
    }
}
