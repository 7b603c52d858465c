//! Dotted property paths over record metadata.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::core::record::{Meta, Reference};

/// A sequence of field-access steps, parsed from `"a.b.c"`.
///
/// Steps into arrays use the decimal index (`"tags.0"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropPath {
    steps: Vec<String>,
}

/// A resolved property: plain data or a link to another record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Value(&'a Value),
    Ref(&'a Reference),
}

impl PropPath {
    pub fn parse(raw: &str) -> Self {
        Self {
            steps: raw.split('.').map(str::to_string).collect(),
        }
    }

    /// Follow the path through `meta`. References are leaves: a path that
    /// continues past one does not resolve.
    pub fn resolve<'a>(&self, meta: &'a BTreeMap<String, Meta>) -> Option<Field<'a>> {
        let (head, rest) = self.steps.split_first()?;
        match meta.get(head)? {
            Meta::Ref(reference) if rest.is_empty() => Some(Field::Ref(reference)),
            Meta::Ref(_) => None,
            Meta::Value(value) => {
                let mut current = value;
                for step in rest {
                    current = match current {
                        Value::Object(map) => map.get(step)?,
                        Value::Array(items) => items.get(step.parse::<usize>().ok()?)?,
                        _ => return None,
                    };
                }
                Some(Field::Value(current))
            }
        }
    }

    /// Write `value` at the path, creating intermediate objects as needed.
    ///
    /// Returns `false` when an intermediate step is a scalar or a reference.
    pub fn assign(&self, meta: &mut BTreeMap<String, Meta>, value: Value) -> bool {
        let Some((head, rest)) = self.steps.split_first() else {
            return false;
        };
        let Some((last, middle)) = rest.split_last() else {
            meta.insert(head.clone(), Meta::Value(value));
            return true;
        };

        let slot = meta
            .entry(head.clone())
            .or_insert_with(|| Meta::Value(Value::Object(Map::new())));
        let mut current = match slot {
            Meta::Value(value) => value,
            Meta::Ref(_) => return false,
        };
        for step in middle {
            current = match current {
                Value::Object(map) => map
                    .entry(step.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return false,
            };
        }
        match current {
            Value::Object(map) => {
                map.insert(last.clone(), value);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.steps.join("."))
    }
}
