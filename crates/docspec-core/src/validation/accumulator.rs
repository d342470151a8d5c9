//! Path-keyed error collection
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Outcome of one validation call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Messages per field path, in the order they were reported
    #[serde(default)]
    pub errors: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub is_valid: bool,
}

impl ValidationResult {
    /// A result whose validity is derived from `errors`
    pub fn from_errors(errors: IndexMap<String, Vec<String>>) -> Self {
        let is_valid = errors.is_empty();
        Self { errors, is_valid }
    }

    pub fn valid() -> Self {
        Self::from_errors(IndexMap::new())
    }

    /// Messages reported for `path`
    pub fn errors_at(&self, path: &str) -> &[String] {
        self.errors.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Shallow union of several results; a later result's messages for a path
/// replace an earlier one's
pub fn merge_validation_results<I>(results: I) -> ValidationResult
where
    I: IntoIterator<Item = ValidationResult>,
{
    let mut errors = IndexMap::new();
    for result in results {
        errors.extend(result.errors);
    }
    ValidationResult::from_errors(errors)
}

/// Append-only error map shared by concurrently running field pipelines
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    errors: Mutex<IndexMap<String, Vec<String>>>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, path: &str, message: impl Into<String>) {
        let mut errors = self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        errors.entry(path.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors
            .lock()
            .map(|errors| errors.is_empty())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_empty())
    }

    /// Final verdict, computed once all pipelines have finished
    pub fn into_result(self) -> ValidationResult {
        let errors = self
            .errors
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ValidationResult::from_errors(errors)
    }
}
