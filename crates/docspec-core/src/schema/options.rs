//! Schema-level options

use serde::{Deserialize, Serialize};

/// Options applied to every validation call of a schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaOptions {
    /// Name used when registering the schema with others
    pub name: Option<String>,

    /// Reject undeclared keys at every Object-typed level unless a field
    /// sets its own `$strict`
    pub strict: bool,

    /// `notNull` applied to fields that do not configure it themselves
    pub default_not_null: Option<bool>,
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_default_not_null(mut self, not_null: bool) -> Self {
        self.default_not_null = Some(not_null);
        self
    }
}
