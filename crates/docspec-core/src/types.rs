//! Type tags and the type-name registry
//!
//! A spec names field types either with a concrete [`TypeTag`] or with a type
//! name string. Names are resolved through an immutable [`TypeRegistry`]
//! built once per process and injected wherever resolution happens.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Canonical field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    ObjectId,
    /// Open type: accepts any value and is never cast
    Any,
}

impl TypeTag {
    /// Name used when comparing logically equivalent types
    pub fn canonical_name(&self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Number => "Number",
            TypeTag::Boolean => "Boolean",
            TypeTag::Array => "Array",
            TypeTag::Object => "Object",
            TypeTag::Date => "Date",
            TypeTag::ObjectId => "ObjectID",
            TypeTag::Any => "Mixed",
        }
    }

    /// Whether values of this type are subject to casting
    pub fn is_castable(&self) -> bool {
        !matches!(self, TypeTag::Any)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, TypeTag::Array | TypeTag::Object)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Immutable mapping from type names to type tags
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRegistry {
    names: IndexMap<String, TypeTag>,
}

static STANDARD: OnceLock<Arc<TypeRegistry>> = OnceLock::new();

impl TypeRegistry {
    /// Build a registry from explicit name/tag pairs
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeTag)>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(|(name, tag)| (name.into(), tag)).collect(),
        }
    }

    /// The process-wide standard registry
    pub fn standard() -> Arc<TypeRegistry> {
        STANDARD
            .get_or_init(|| {
                Arc::new(Self::from_names([
                    ("String", TypeTag::String),
                    ("Number", TypeTag::Number),
                    ("Boolean", TypeTag::Boolean),
                    ("Array", TypeTag::Array),
                    ("Object", TypeTag::Object),
                    ("Date", TypeTag::Date),
                    ("ObjectID", TypeTag::ObjectId),
                    ("ObjectId", TypeTag::ObjectId),
                    ("Mixed", TypeTag::Any),
                    ("Any", TypeTag::Any),
                ]))
            })
            .clone()
    }

    pub fn lookup(&self, name: &str) -> Option<TypeTag> {
        self.names.get(name).copied()
    }

    /// A copy of this registry with one more name registered
    pub fn with_alias(&self, name: impl Into<String>, tag: TypeTag) -> Self {
        let mut names = self.names.clone();
        names.insert(name.into(), tag);
        Self { names }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard().as_ref().clone()
    }
}
