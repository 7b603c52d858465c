//! Named, grouped, sorted views over content records.
//!
//! Entries accumulate during a pass in [`IndexTable`]; `finalize` sorts every
//! bucket once and freezes the result into an [`IndexSnapshot`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::error::LoopError;
use crate::core::prop::{Field, PropPath};
use crate::core::record::RecordId;
use crate::core::registry::FileSet;

#[derive(Debug, Clone)]
struct IndexDef {
    sort_prop: PropPath,
    reversed: bool,
    groups: BTreeMap<String, Vec<RecordId>>,
}

/// Index declarations and their accumulated, unsorted buckets.
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    indexes: BTreeMap<String, IndexDef>,
}

impl IndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) an index. Redeclaring drops accumulated entries.
    pub fn declare(&mut self, name: &str, sort_prop: &str, reversed: bool) {
        let def = IndexDef {
            sort_prop: PropPath::parse(sort_prop),
            reversed,
            groups: BTreeMap::new(),
        };
        if let Some(previous) = self.indexes.insert(name.to_string(), def) {
            if !previous.groups.is_empty() {
                warn!(index = name, "redeclared index discards accumulated entries");
            }
        }
        debug!(index = name, sort_prop, reversed, "declared index");
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// The mutable bucket for `key`, created empty on first access.
    pub fn bucket(&mut self, name: &str, key: &str) -> Result<&mut Vec<RecordId>, LoopError> {
        let def = self
            .indexes
            .get_mut(name)
            .ok_or_else(|| LoopError::UnknownIndex {
                name: name.to_string(),
            })?;
        Ok(def.groups.entry(key.to_string()).or_default())
    }

    pub fn push(&mut self, name: &str, key: &str, id: RecordId) -> Result<(), LoopError> {
        self.bucket(name, key)?.push(id);
        Ok(())
    }

    /// Sort every bucket by its index's property and freeze the result.
    ///
    /// Records removed since they were indexed are dropped. Sorting is stable,
    /// so ties keep the order in which records were added.
    pub fn finalize(&self, files: &FileSet) -> IndexSnapshot {
        let mut indexes = BTreeMap::new();
        for (name, def) in &self.indexes {
            let mut groups = BTreeMap::new();
            for (key, ids) in &def.groups {
                let mut live: Vec<RecordId> = ids
                    .iter()
                    .copied()
                    .filter(|id| files.record(*id).is_some())
                    .collect();
                live.sort_by(|a, b| {
                    let left = files.record(*a).and_then(|r| r.lookup(&def.sort_prop));
                    let right = files.record(*b).and_then(|r| r.lookup(&def.sort_prop));
                    compare_fields(left, right, def.reversed)
                });
                groups.insert(key.clone(), live);
            }
            indexes.insert(name.clone(), groups);
        }
        IndexSnapshot { indexes }
    }
}

/// Frozen, sorted index output shared by every record after a pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    indexes: BTreeMap<String, BTreeMap<String, Vec<RecordId>>>,
}

impl IndexSnapshot {
    pub fn get(&self, name: &str, key: &str) -> Option<&[RecordId]> {
        self.indexes.get(name)?.get(key).map(Vec::as_slice)
    }

    pub fn groups(&self, name: &str) -> Option<&BTreeMap<String, Vec<RecordId>>> {
        self.indexes.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<RecordId>>)> {
        self.indexes.iter().map(|(name, groups)| (name.as_str(), groups))
    }
}

/// Sort class of a value: numbers, then strings, then everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Text(_) => 1,
            SortKey::Missing => 2,
        }
    }
}

/// Numeric-aware ordering of two sort values.
///
/// Values that coerce to numbers compare numerically and sort before
/// non-numeric strings, which compare lexicographically (ISO dates sort
/// correctly). Missing values, and values that are neither, come last in
/// both directions; `reversed` only flips the order within a class.
pub fn compare_fields(
    left: Option<Field<'_>>,
    right: Option<Field<'_>>,
    reversed: bool,
) -> Ordering {
    let directed = |ordering: Ordering| if reversed { ordering.reverse() } else { ordering };
    match (sort_key(left), sort_key(right)) {
        (SortKey::Number(a), SortKey::Number(b)) => directed(a.total_cmp(&b)),
        (SortKey::Text(a), SortKey::Text(b)) => directed(a.cmp(b)),
        (a, b) => a.rank().cmp(&b.rank()),
    }
}

fn sort_key(field: Option<Field<'_>>) -> SortKey<'_> {
    let value = match field {
        Some(Field::Value(value)) => value,
        Some(Field::Ref(reference)) => &reference.value,
        None => return SortKey::Missing,
    };
    if let Some(number) = as_number(value) {
        return SortKey::Number(number);
    }
    match value {
        Value::String(s) => SortKey::Text(s),
        _ => SortKey::Missing,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
