//! Docspec Core - declarative specs for nested documents
//!
//! This crate walks nested data against a declarative spec tree, injecting
//! defaults, casting values to their declared types, applying filters and
//! running validators, and reports every data problem as path-keyed messages.
//!
//! # Main Components
//!
//! - **Value model**: Document values with Date and ObjectId next to JSON types
//! - **Spec model**: Type tokens, list shorthand and `$`-keyed descriptors
//! - **Mappers**: Recursive spec/data traversal and query operand traversal
//! - **Validation**: Concurrent per-field pipelines reporting into one accumulator
//! - **Schema facility**: Validation entry points, transients and privacy filtering
//!
//! # Example
//!
//! ```
//! use docspec_core::{Schema, SchemaOptions, Value};
//! use serde_json::json;
//!
//! # fn main() -> docspec_core::Result<()> {
//! let schema = Schema::from_json(
//!     &json!({"age": "Number", "tags": ["String"]}),
//!     SchemaOptions::default().with_strict(true),
//! )?;
//! assert_eq!(schema.name(), "Schema");
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod caster;
pub mod collaborators;
pub mod error;
pub mod mapper;
pub mod rules;
pub mod schema;
pub mod spec;
pub mod types;
pub mod validation;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use value::{FieldKey, Location, Map, ObjectId, Value};

pub use accessor::ObjectPathAccessor;
pub use caster::{StandardTypeCaster, TypeCaster};
pub use collaborators::Collaborators;
pub use mapper::{MapperKind, QueryOperator, SchemaMapper};
pub use rules::{
    is_null, DefaultValue, Filter, FilterConfig, Privacy, RuleSet, StandardFilter,
    StandardValidator, ValidationContext, Validator,
};
pub use schema::{Constructor, Schema, SchemaManager, SchemaOptions};
pub use spec::{Descriptor, SpecNode};
pub use types::{TypeRegistry, TypeTag};
pub use validation::{merge_validation_results, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
