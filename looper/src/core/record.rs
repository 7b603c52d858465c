//! Virtual file records held by the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::core::index::IndexSnapshot;
use crate::core::prop::{Field, PropPath};

/// Stable handle for a record, unaffected by renames.
///
/// Assigned by [`FileSet`](crate::core::registry::FileSet) on insertion. A
/// record's own id doubles as its self-reference for the rendering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(pub(crate) u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved link from one record's property to another record.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// The linked record.
    pub target: RecordId,
    /// Registry key of the target when the link was made.
    pub key: String,
    /// The identifier the property held before resolution.
    pub value: Value,
}

/// One metadata entry: plain data, or a reference produced by linking.
#[derive(Debug, Clone, PartialEq)]
pub enum Meta {
    Value(Value),
    Ref(Reference),
}

impl Meta {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Meta::Value(value) => Some(value),
            Meta::Ref(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Meta::Ref(reference) => Some(reference),
            Meta::Value(_) => None,
        }
    }
}

impl From<Value> for Meta {
    fn from(value: Value) -> Self {
        Meta::Value(value)
    }
}

/// A virtual file: a content page or an asset.
#[derive(Debug, Clone, Default)]
pub struct FileRecord {
    /// Canonical key. Assigning a new name inside a walk callback renames the
    /// record once the callback returns.
    pub name: String,
    pub is_content: bool,
    /// Short classifier, usually the first path segment.
    pub kind: String,
    pub layout: Option<String>,
    pub contents: Option<Vec<u8>>,
    pub meta: BTreeMap<String, Meta>,
    pub(crate) id: Option<RecordId>,
    pub(crate) indexes: Option<Arc<IndexSnapshot>>,
}

impl FileRecord {
    /// A raw record as produced by discovery.
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: Some(contents.into()),
            ..Self::default()
        }
    }

    /// Builder-style metadata assignment.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Finalized indexes, attached at the end of a build pass.
    pub fn indexes(&self) -> Option<&IndexSnapshot> {
        self.indexes.as_deref()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.meta.insert(key.to_string(), Meta::Value(value.into()));
    }

    /// Top-level plain value, ignoring references.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.meta.get(key).and_then(Meta::as_value)
    }

    pub fn reference(&self, key: &str) -> Option<&Reference> {
        self.meta.get(key).and_then(Meta::as_reference)
    }

    pub fn lookup(&self, path: &PropPath) -> Option<Field<'_>> {
        path.resolve(&self.meta)
    }
}
