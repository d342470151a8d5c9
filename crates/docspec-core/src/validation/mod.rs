//! Validation orchestration
//!
//! A validation call runs in four phases:
//!
//! 1. The mapper walks the data synchronously. Every visited field becomes a
//!    [`FieldUnit`] with its effective strict flag, then each unit moves its
//!    own value out of the documents, deepest fields first.
//! 2. All units are defaulted, cast and filtered concurrently by the
//!    [`FieldPipeline`], reporting into one shared [`ErrorAccumulator`].
//! 3. Results are written back in visitation order, so an ancestor's value is
//!    stored before its descendants overwrite their own slots.
//! 4. Validators run concurrently against the written-back data.
//!
//! The first collaborator error aborts the call and puts every unit's
//! original value back.
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

mod accumulator;
mod pipeline;

pub use accumulator::{merge_validation_results, ErrorAccumulator, ValidationResult};
pub use pipeline::{is_valid_field_name, FieldPipeline};

use crate::mapper::{MapperKind, SchemaMapper, Slot, Visit};
use crate::spec::SpecNode;
use crate::value::{FieldKey, Location, Value};
use crate::Result;
use futures_util::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One visited field awaiting its pipeline
#[derive(Debug, Clone)]
pub struct FieldUnit<'s> {
    pub spec: Option<&'s SpecNode>,
    pub field: FieldKey,
    pub path: String,
    /// Where to write the result, below the document list
    pub location: Location,
    /// Value at visit time, with the slots of visited descendants left null;
    /// `None` when undefined
    pub value: Option<Value>,
    /// Effective strict flag for this field
    pub strict: bool,
}

/// Which data validators see as their root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootScope {
    /// The whole document list
    #[default]
    List,
    /// The document a field belongs to
    Document,
}

enum Roots {
    Shared(Arc<Value>),
    PerDocument(Vec<Arc<Value>>),
}

impl Roots {
    fn new(documents: &Value, scope: RootScope) -> Self {
        match scope {
            RootScope::List => Roots::Shared(Arc::new(documents.clone())),
            RootScope::Document => Roots::PerDocument(
                documents
                    .as_array()
                    .map(|items| items.iter().cloned().map(Arc::new).collect())
                    .unwrap_or_default(),
            ),
        }
    }

    fn for_location(&self, location: &Location) -> Arc<Value> {
        match self {
            Roots::Shared(root) => root.clone(),
            Roots::PerDocument(roots) => match location.segments().first() {
                Some(FieldKey::Index(index)) => roots.get(*index).cloned().unwrap_or_default(),
                _ => Arc::default(),
            },
        }
    }
}

/// A document list with its collected units
#[derive(Debug)]
pub struct Batch<'s> {
    pub documents: Value,
    pub units: Vec<FieldUnit<'s>>,
    pub scope: RootScope,
}

impl<'s> Batch<'s> {
    /// Walk `documents` and collect one unit per visited field
    ///
    /// The walk injects structural defaults into `documents` in place; once
    /// it succeeds the batch takes the list over. Fields carrying `$pathRef`,
    /// and everything below them, are skipped. Path objects are their own
    /// validator root; otherwise validators see the whole document list
    /// unless changed with [`Batch::with_root_scope`].
    pub fn collect(
        mapper: &SchemaMapper<'s>,
        kind: MapperKind,
        documents: &mut Value,
        strict: bool,
    ) -> Result<Self> {
        let mut collector = UnitCollector::new(strict);
        mapper.map_as(kind, documents, |visit| collector.visit(visit))?;

        let mut documents = std::mem::take(documents);
        let mut units = collector.units;
        for unit in units.iter_mut().rev() {
            unit.value = documents.at_mut(&unit.location).map(std::mem::take);
        }

        let scope = match kind {
            MapperKind::Map => RootScope::List,
            MapperKind::MapPaths => RootScope::Document,
        };
        Ok(Self {
            documents,
            units,
            scope,
        })
    }

    pub fn with_root_scope(mut self, scope: RootScope) -> Self {
        self.scope = scope;
        self
    }

    fn write_back(&mut self, results: Vec<Option<Value>>) {
        for (unit, value) in self.units.iter().zip(results) {
            put_at(&mut self.documents, &unit.location, value);
        }
    }

    /// Put every unit's original value back, ancestors first
    fn restore(&mut self) {
        for unit in self.units.iter_mut() {
            put_at(&mut self.documents, &unit.location, unit.value.take());
        }
    }
}

fn put_at(documents: &mut Value, location: &Location, value: Option<Value>) {
    let Some((parent, key)) = location.split_last() else {
        return;
    };
    if let Some(container) = documents.at_mut(&parent) {
        Slot::new(container, key).put(value);
    }
}

struct UnitCollector<'s> {
    strict: bool,
    units: Vec<FieldUnit<'s>>,
    effective_strict: HashMap<Location, bool>,
    skipped: HashSet<Location>,
}

impl<'s> UnitCollector<'s> {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            units: Vec::new(),
            effective_strict: HashMap::new(),
            skipped: HashSet::new(),
        }
    }

    fn visit(&mut self, visit: Visit<'s, '_>) -> Result<()> {
        let descriptor = visit.spec.and_then(SpecNode::as_descriptor);
        let parent = visit.location.split_last().map(|(parent, _)| parent);

        let transient = descriptor.is_some_and(|d| d.path_ref.is_some());
        if transient || parent.as_ref().is_some_and(|p| self.skipped.contains(p)) {
            self.skipped.insert(visit.location.clone());
            return Ok(());
        }

        // A local $strict applies to the field and everything below it
        let inherited = parent
            .and_then(|p| self.effective_strict.get(&p).copied())
            .unwrap_or(self.strict);
        let strict = descriptor.and_then(|d| d.strict).unwrap_or(inherited);
        self.effective_strict.insert(visit.location.clone(), strict);

        self.units.push(FieldUnit {
            spec: visit.spec,
            field: visit.field.clone(),
            path: visit.path.to_string(),
            location: visit.location.clone(),
            value: None,
            strict,
        });
        Ok(())
    }
}

/// Run every unit of every batch, writing results back into the batches
///
/// On error every batch holds its original documents again.
pub async fn run_batches(pipeline: &FieldPipeline<'_>, batches: &mut [Batch<'_>]) -> Result<()> {
    let pending = batches
        .iter()
        .flat_map(|batch| batch.units.iter().map(move |unit| pipeline.prepare(unit)));
    let prepared = try_join_all(pending).await;
    let prepared = match prepared {
        Ok(prepared) => prepared,
        Err(error) => {
            batches.iter_mut().for_each(Batch::restore);
            return Err(error);
        }
    };

    let mut results = prepared.into_iter();
    for batch in batches.iter_mut() {
        let count = batch.units.len();
        let batch_results: Vec<Option<Value>> = results.by_ref().take(count).collect();
        batch.write_back(batch_results);
    }

    let roots: Vec<Roots> = batches
        .iter()
        .map(|batch| Roots::new(&batch.documents, batch.scope))
        .collect();
    let pending = batches.iter().zip(&roots).flat_map(|(batch, roots)| {
        batch.units.iter().map(move |unit| {
            let value = batch.documents.at(&unit.location);
            pipeline.check(unit, value, roots.for_location(&unit.location))
        })
    });
    let checked = try_join_all(pending).await;

    if let Err(error) = checked {
        batches.iter_mut().for_each(Batch::restore);
        return Err(error);
    }
    Ok(())
}
