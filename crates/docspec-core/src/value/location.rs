//! Field keys and structural locations inside a document tree

use std::fmt;

/// The key of a field within its container: a mapping key or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Name(String),
    Index(usize),
}

impl FieldKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            FieldKey::Name(name) => Some(name),
            FieldKey::Index(_) => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => write!(f, "{}", name),
            FieldKey::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        FieldKey::Name(name.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(name: String) -> Self {
        FieldKey::Name(name)
    }
}

impl From<usize> for FieldKey {
    fn from(index: usize) -> Self {
        FieldKey::Index(index)
    }
}

/// Structural address of a slot, as the sequence of keys followed from a root.
///
/// Unlike the display path, a location is unambiguous: a mapping key that
/// happens to contain a dot is still a single segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    segments: Vec<FieldKey>,
}

impl Location {
    pub fn root() -> Self {
        Self::default()
    }

    /// A new location one level below this one
    pub fn child(&self, key: FieldKey) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key);
        Self { segments }
    }

    pub fn segments(&self) -> &[FieldKey] {
        &self.segments
    }

    /// The containing location and the final key, or `None` at the root
    pub fn split_last(&self) -> Option<(Location, &FieldKey)> {
        let (last, rest) = self.segments.split_last()?;
        Some((
            Location {
                segments: rest.to_vec(),
            },
            last,
        ))
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<Vec<FieldKey>> for Location {
    fn from(segments: Vec<FieldKey>) -> Self {
        Self { segments }
    }
}
