//! Injected services used while validating

use crate::accessor::ObjectPathAccessor;
use crate::caster::{StandardTypeCaster, TypeCaster};
use crate::rules::{Filter, StandardFilter, StandardValidator, Validator};
use crate::types::TypeRegistry;
use std::fmt;
use std::sync::Arc;

/// Filter, validator, caster and type registry used by a schema
#[derive(Clone)]
pub struct Collaborators {
    pub filter: Arc<dyn Filter>,
    pub validator: Arc<dyn Validator>,
    pub caster: Arc<dyn TypeCaster>,
    pub registry: Arc<TypeRegistry>,
    pub accessor: ObjectPathAccessor,
}

impl Collaborators {
    /// The standard implementations
    pub fn standard() -> Self {
        Self {
            filter: Arc::new(StandardFilter::new()),
            validator: Arc::new(StandardValidator::new()),
            caster: Arc::new(StandardTypeCaster::new()),
            registry: TypeRegistry::standard(),
            accessor: ObjectPathAccessor::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_caster(mut self, caster: impl TypeCaster + 'static) -> Self {
        self.caster = Arc::new(caster);
        self
    }

    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("registry", &self.registry.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
