//! The Schema facility
//!
//! A [`Schema`] owns a spec, the schemas it may embed with `$schema`, the
//! constructors it may apply with `$construct` and the collaborators used to
//! filter, cast and validate. It exposes validation of documents, path
//! objects and queries, plus transient handling and privacy filtering.
//!
//! ```
//! use docspec_core::{Schema, SchemaOptions, Value};
//! use serde_json::json;
//!
//! # tokio_test_block(async {
//! let schema = Schema::from_json(
//!     &json!({"house": {"$type": "Number", "$validate": {"required": true}}}),
//!     SchemaOptions::default(),
//! ).unwrap();
//!
//! let mut data = Value::from(json!({"house": "1"}));
//! let result = schema.validate(&mut data).await.unwrap();
//! assert!(result.is_valid);
//! assert_eq!(data, Value::from(json!({"house": 1})));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

mod manager;
mod options;

pub use manager::SchemaManager;
pub use options::SchemaOptions;

use crate::collaborators::Collaborators;
use crate::mapper::{
    unwrap_document_list, walk_query, with_document_list, MapperKind, SchemaMapper, Slot,
};
use crate::spec::{normalize, SpecNode};
use crate::validation::{
    run_batches, Batch, ErrorAccumulator, FieldPipeline, RootScope, ValidationResult,
};
use crate::value::{FieldKey, Location, Map, Value};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Name used when neither the options nor the spec name a schema
pub const DEFAULT_SCHEMA_NAME: &str = "Schema";

/// Factory applied to `$construct` fields
pub type Constructor = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// A spec together with everything needed to apply it
#[derive(Clone)]
pub struct Schema {
    name: String,
    source: SpecNode,
    options: SchemaOptions,
    collaborators: Collaborators,
    schemas: IndexMap<String, SpecNode>,
    constructors: IndexMap<String, Constructor>,
    normalized: OnceLock<SpecNode>,
}

impl Schema {
    pub fn new(spec: SpecNode, options: SchemaOptions) -> Self {
        let name = options
            .name
            .clone()
            .or_else(|| spec.as_descriptor().and_then(|d| d.name.clone()))
            .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string());

        Self {
            name,
            source: spec,
            options,
            collaborators: Collaborators::standard(),
            schemas: IndexMap::new(),
            constructors: IndexMap::new(),
            normalized: OnceLock::new(),
        }
    }

    /// Parse an authored JSON spec
    pub fn from_json(spec: &serde_json::Value, options: SchemaOptions) -> Result<Self> {
        Ok(Self::new(SpecNode::from_json(spec)?, options))
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self.normalized = OnceLock::new();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized = OnceLock::new();
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// The spec as authored, before `$schema` expansion
    pub fn source(&self) -> &SpecNode {
        &self.source
    }

    /// The spec with every `$schema` reference expanded
    ///
    /// Expansion happens on first use and is cached until another schema is
    /// registered.
    pub fn spec(&self) -> Result<&SpecNode> {
        if let Some(spec) = self.normalized.get() {
            return Ok(spec);
        }
        let spec = normalize(&self.source, &self.schemas, Some(&self.name))?;
        Ok(self.normalized.get_or_init(|| spec))
    }

    /// Make `schema` available to `$schema` references under its name
    pub fn add_schema(&mut self, schema: &Schema) {
        self.register_spec(schema.name(), schema.source().clone());
    }

    pub fn add_schemas<'a, I>(&mut self, schemas: I)
    where
        I: IntoIterator<Item = &'a Schema>,
    {
        for schema in schemas {
            self.add_schema(schema);
        }
    }

    pub(crate) fn register_spec(&mut self, name: &str, spec: SpecNode) {
        self.schemas.insert(name.to_string(), spec);
        self.normalized = OnceLock::new();
    }

    /// Names of the schemas available to `$schema`
    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn add_constructor<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn add_constructors<I, S>(&mut self, constructors: I)
    where
        I: IntoIterator<Item = (S, Constructor)>,
        S: Into<String>,
    {
        for (name, constructor) in constructors {
            self.constructors.insert(name.into(), constructor);
        }
    }

    pub fn constructor(&self, name: &str) -> Option<&Constructor> {
        self.constructors.get(name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = (&str, &Constructor)> {
        self.constructors.iter().map(|(name, constructor)| (name.as_str(), constructor))
    }

    fn mapper(&self) -> Result<SchemaMapper<'_>> {
        Ok(SchemaMapper::new(self.spec()?, &self.collaborators.registry))
    }

    fn pipeline<'a>(&'a self, accumulator: &'a ErrorAccumulator) -> FieldPipeline<'a> {
        FieldPipeline::new(&self.collaborators, accumulator)
            .with_default_not_null(self.options.default_not_null)
    }

    /// Default, cast, filter and validate every field of `data` in place
    ///
    /// A top-level array is validated as a list of documents. Data problems
    /// are reported in the result; an `Err` means a spec, constructor or
    /// collaborator failure.
    pub async fn validate(&self, data: &mut Value) -> Result<ValidationResult> {
        let mapper = self.mapper()?;
        let single = !data.is_array();
        let mut documents = wrap(data, single);

        let collected = Batch::collect(&mapper, MapperKind::Map, &mut documents, self.options.strict);
        let batch = match collected {
            Ok(batch) => batch,
            Err(error) => {
                *data = unwrap(documents, single);
                return Err(error);
            }
        };
        // A single document is its own validator root
        let batch = if single {
            batch.with_root_scope(RootScope::Document)
        } else {
            batch
        };

        self.run("validate", data, single, batch).await
    }

    /// Validate `{ "dot.path": value }` objects, or an array of them, in place
    pub async fn validate_paths(&self, paths: &mut Value) -> Result<ValidationResult> {
        let mapper = self.mapper()?;
        let single = !paths.is_array();
        let mut documents = wrap(paths, single);

        let batch = match Batch::collect(
            &mapper,
            MapperKind::MapPaths,
            &mut documents,
            self.options.strict,
        ) {
            Ok(batch) => batch,
            Err(error) => {
                *paths = unwrap(documents, single);
                return Err(error);
            }
        };

        self.run("validate_paths", paths, single, batch).await
    }

    /// Validate, cast and filter every field operand of a query in place
    ///
    /// Undeclared fields are expected in queries, so strict checks are off.
    pub async fn validate_query(&self, query: &mut Value) -> Result<ValidationResult> {
        let mapper = self.mapper()?;

        let mut operands: Vec<(Location, String)> = Vec::new();
        let mut batches = Vec::new();
        walk_query(query, |visit| {
            let mut paths = Map::new();
            paths.insert(
                visit.field_path.to_string(),
                visit.slot.get().cloned().unwrap_or_default(),
            );
            let mut documents = Value::Array(vec![Value::Object(paths)]);
            batches.push(Batch::collect(
                &mapper,
                MapperKind::MapPaths,
                &mut documents,
                false,
            )?);
            operands.push((visit.location.clone(), visit.field_path.to_string()));
            Ok(())
        })?;

        let accumulator = ErrorAccumulator::new();
        let pipeline = self.pipeline(&accumulator).with_strict_checks(false);
        let units: usize = batches.iter().map(|batch| batch.units.len()).sum();
        run_batches(&pipeline, &mut batches).await?;

        for ((location, field_path), batch) in operands.iter().zip(&batches) {
            let value = batch
                .documents
                .as_array()
                .and_then(|items| items.first())
                .and_then(|document| document.child(&FieldKey::Name(field_path.clone())))
                .cloned();
            let Some((parent, key)) = location.split_last() else {
                continue;
            };
            if let Some(container) = query.at_mut(&parent) {
                Slot::new(container, key).put(value);
            }
        }

        let result = accumulator.into_result();
        tracing::debug!(
            "validate_query of '{}': {} operands, {} fields, valid: {}",
            self.name,
            operands.len(),
            units,
            result.is_valid
        );
        Ok(result)
    }

    /// Run one batch and hand its documents back to `data`, even on failure
    async fn run(
        &self,
        operation: &str,
        data: &mut Value,
        single: bool,
        batch: Batch<'_>,
    ) -> Result<ValidationResult> {
        let accumulator = ErrorAccumulator::new();
        let pipeline = self.pipeline(&accumulator);
        let units = batch.units.len();
        let mut batches = [batch];
        let outcome = run_batches(&pipeline, &mut batches).await;

        let [batch] = batches;
        *data = unwrap(batch.documents, single);
        outcome?;

        let result = accumulator.into_result();
        tracing::debug!(
            "{} of '{}': {} fields, valid: {}",
            operation,
            self.name,
            units,
            result.is_valid
        );
        Ok(result)
    }

    /// Populate `$pathRef` fields from the document root and pass
    /// `$construct` fields through their registered constructor
    pub fn apply_transients(&self, data: &mut Value) -> Result<()> {
        let mapper = self.mapper()?;
        let accessor = &self.collaborators.accessor;

        with_document_list(data, |documents| {
            let roots = documents.clone();
            mapper.map_documents(documents, |mut visit| {
                let Some(descriptor) = visit.spec.and_then(SpecNode::as_descriptor) else {
                    return Ok(());
                };

                if let Some(path_ref) = &descriptor.path_ref {
                    let root = document_root(&roots, visit.location);
                    let value = accessor.get_path(path_ref, root)?.cloned();
                    visit.slot.put(value);
                }

                if let Some(name) = &descriptor.construct {
                    let constructor =
                        self.constructors
                            .get(name)
                            .ok_or_else(|| Error::ConstructorNotFound {
                                path: visit.path.to_string(),
                                name: name.clone(),
                            })?;
                    if !visit.slot.get().is_some_and(Value::is_array) {
                        let value = visit.slot.remove().unwrap_or_else(Value::object);
                        visit.slot.set(constructor(value)?);
                    }
                }
                Ok(())
            })
        })
    }

    /// Remove `$pathRef` fields so the data can be persisted
    pub fn strip_transients(&self, data: &mut Value) -> Result<()> {
        self.mapper()?.map(data, |mut visit| {
            let transient = visit
                .spec
                .and_then(SpecNode::as_descriptor)
                .is_some_and(|d| d.path_ref.is_some());
            if transient {
                visit.slot.remove();
            }
            Ok(())
        })
    }

    /// Hide private fields
    ///
    /// Fields whose `private` filter applies under `mode` are removed, and
    /// fields whose `privateValue` applies are replaced by `true`. `None` is
    /// the default mode, matched only by fields marked private in every mode.
    /// Only truthy values are touched.
    pub fn filter_private(&self, data: &mut Value, mode: Option<&str>, kind: MapperKind) -> Result<()> {
        let mapper = self.mapper()?;

        with_document_list(data, |documents| {
            let mut removals = Vec::new();
            let mut replacements = Vec::new();
            mapper.map_as(kind, documents, |visit| {
                let Some(filter) = visit.spec.and_then(SpecNode::as_descriptor).map(|d| &d.filter)
                else {
                    return Ok(());
                };
                if filter.private.as_ref().is_some_and(|p| p.applies(mode)) {
                    removals.push(visit.location.clone());
                }
                if filter.private_value.as_ref().is_some_and(|p| p.applies(mode)) {
                    replacements.push(visit.location.clone());
                }
                Ok(())
            })?;

            for location in &replacements {
                if let Some(value) = documents.at_mut(location) {
                    if value.is_truthy() {
                        *value = Value::Bool(true);
                    }
                }
            }
            for location in &removals {
                let Some((parent, key)) = location.split_last() else {
                    continue;
                };
                if let Some(container) = documents.at_mut(&parent) {
                    let mut slot = Slot::new(container, key);
                    if slot.get().is_some_and(Value::is_truthy) {
                        slot.remove();
                    }
                }
            }
            Ok(())
        })
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("schemas", &self.schemas.keys().collect::<Vec<_>>())
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn wrap(data: &mut Value, single: bool) -> Value {
    let data = std::mem::take(data);
    if single {
        Value::Array(vec![data])
    } else {
        data
    }
}

fn unwrap(documents: Value, single: bool) -> Value {
    if single {
        unwrap_document_list(documents)
    } else {
        documents
    }
}

/// The document of `roots` that contains `location`
fn document_root<'a>(roots: &'a Value, location: &Location) -> &'a Value {
    match location.segments().first() {
        Some(key) => roots.child(key).unwrap_or(roots),
        None => roots,
    }
}
