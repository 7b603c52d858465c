//! Per-record validation and linking actions handed to walk callbacks.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::core::classify::PassConfig;
use crate::core::error::LoopError;
use crate::core::index::IndexTable;
use crate::core::naming::identity;
use crate::core::prop::{Field, PropPath};
use crate::core::record::{FileRecord, Meta, RecordId, Reference};
use crate::core::registry::FileSet;

const MISSING: &str = "<missing>";

/// State shared by every record visited in one walk.
///
/// Maps a unique property to `{value -> name of the first record seen with it}`.
#[derive(Debug, Default)]
pub struct ValidationContext {
    unique: HashMap<String, HashMap<String, String>>,
}

/// Actions bound to one record during a walk.
///
/// The record is addressed by id, so it stays reachable after `move_to`.
/// After `remove` it is gone and [`record`](Self::record) returns `None`.
pub struct FileActions<'a> {
    files: &'a mut FileSet,
    indexes: &'a mut IndexTable,
    context: &'a mut ValidationContext,
    config: &'a PassConfig,
    id: RecordId,
    name: String,
}

impl<'a> FileActions<'a> {
    pub(crate) fn new(
        files: &'a mut FileSet,
        indexes: &'a mut IndexTable,
        context: &'a mut ValidationContext,
        config: &'a PassConfig,
        id: RecordId,
    ) -> Self {
        let name = files
            .record(id)
            .map(|record| record.name.clone())
            .unwrap_or_default();
        Self {
            files,
            indexes,
            context,
            config,
            id,
            name,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// The record's name, as last seen by these actions.
    pub fn name(&self) -> &str {
        self.files
            .record(self.id)
            .map_or(self.name.as_str(), |record| record.name.as_str())
    }

    pub fn record(&self) -> Option<&FileRecord> {
        self.files.record(self.id)
    }

    /// Mutable access. Assigning `name` here renames the record once the
    /// callback returns, assets included.
    pub fn record_mut(&mut self) -> Option<&mut FileRecord> {
        self.files.record_mut(self.id)
    }

    /// Read-only view of the whole registry.
    pub fn files(&self) -> &FileSet {
        self.files
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.record()?.value(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if let Some(record) = self.record_mut() {
            record.set(key, value);
        }
    }

    pub fn remove(&mut self) -> bool {
        let Some(key) = self.current_key() else {
            return false;
        };
        self.name = key.clone();
        self.files.remove(&key).is_some()
    }

    /// Rename the record and carry its assets along. A trailing `/` names a
    /// directory index document.
    pub fn move_to(&mut self, new_name: &str) -> bool {
        let Some(key) = self.current_key() else {
            return false;
        };
        self.files.move_with_assets(&key, new_name)
    }

    /// Duplicate the record under `new_name`; assets are not copied.
    pub fn copy_to(
        &mut self,
        new_name: &str,
        overrides: impl IntoIterator<Item = (String, Value)>,
    ) -> Option<RecordId> {
        let key = self.current_key()?;
        if key == new_name {
            return None;
        }
        let overrides = overrides.into_iter().map(|(k, v)| (k, Meta::Value(v)));
        self.files.copy(&key, new_name, overrides)
    }

    /// Fail unless the property at `prop` is present.
    pub fn required(&mut self, prop: &str) -> Result<(), LoopError> {
        let path = PropPath::parse(prop);
        if self.lookup(&path).is_some() {
            return Ok(());
        }
        Err(self.missing(&path))
    }

    /// Write `default` at `prop` when absent.
    pub fn required_or(&mut self, prop: &str, default: impl Into<Value>) -> Result<(), LoopError> {
        let path = PropPath::parse(prop);
        if self.lookup(&path).is_some() {
            return Ok(());
        }
        let assigned = self
            .record_mut()
            .is_some_and(|record| path.assign(&mut record.meta, default.into()));
        if assigned {
            debug!(file = %self.name(), prop, "applied default");
            return Ok(());
        }
        Err(self.missing(&path))
    }

    /// Fail unless the property is one of `allowed`.
    pub fn one_of<I, V>(&mut self, prop: &str, allowed: I) -> Result<(), LoopError>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let path = PropPath::parse(prop);
        let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
        let value = self.lookup(&path).map(|field| match field {
            Field::Value(value) => value.clone(),
            Field::Ref(reference) => reference.value.clone(),
        });
        if let Some(value) = &value {
            if allowed.contains(value) {
                return Ok(());
            }
        }
        Err(LoopError::InvalidEnumeratedValue {
            file: self.name().to_string(),
            prop: path.to_string(),
            value: value.map_or_else(|| MISSING.to_string(), |v| v.to_string()),
            allowed: Value::Array(allowed).to_string(),
        })
    }

    /// Fail if another record in this walk already had the same value.
    ///
    /// Values compare by their string form, so `1` and `"1"` collide.
    /// Records without the property are not tracked.
    pub fn unique(&mut self, prop: &str) -> Result<(), LoopError> {
        let path = PropPath::parse(prop);
        let Some(value) = self.lookup(&path).map(|field| match field {
            Field::Value(Value::String(s)) => s.clone(),
            Field::Value(value) => value.to_string(),
            Field::Ref(reference) => reference.target.to_string(),
        }) else {
            return Ok(());
        };
        let name = self.name().to_string();
        let seen = self.context.unique.entry(path.to_string()).or_default();
        if let Some(first) = seen.get(&value) {
            return Err(LoopError::DuplicateUniqueValue {
                prop: path.to_string(),
                first: first.clone(),
                second: name,
            });
        }
        seen.insert(value, name);
        Ok(())
    }

    pub fn set_type(&mut self, kind: &str) {
        if let Some(record) = self.record_mut() {
            record.kind = kind.to_string();
        }
    }

    /// Replace the identifier in `prop` with a link to `kind/<id>.<page ext>`.
    ///
    /// The record is left untouched when the target does not exist.
    pub fn add_reference(&mut self, prop: &str, kind: &str) -> Result<(), LoopError> {
        let value = match self.record().and_then(|record| record.meta.get(prop)) {
            Some(Meta::Ref(_)) => return Ok(()),
            Some(Meta::Value(value)) => value.clone(),
            None => Value::Null,
        };
        let ident = match &value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        };
        let target_key = ident
            .as_ref()
            .map(|ident| format!("{kind}/{ident}.{}", self.config.page_extension));
        let target = target_key
            .as_deref()
            .and_then(|key| Some((key, self.files.id_of(key)?)));
        let Some((key, target)) = target else {
            return Err(LoopError::UnknownReference {
                file: self.name().to_string(),
                prop: prop.to_string(),
                value: ident.map_or_else(|| MISSING.to_string(), |_| value.to_string()),
                target: target_key.unwrap_or_else(|| format!("{kind}/{MISSING}")),
            });
        };
        let reference = Reference {
            target,
            key: key.to_string(),
            value,
        };
        if let Some(record) = self.record_mut() {
            record.meta.insert(prop.to_string(), Meta::Ref(reference));
        }
        Ok(())
    }

    /// Append this record to the `key` bucket of a declared index.
    pub fn add_index(&mut self, name: &str, key: &str) -> Result<(), LoopError> {
        self.indexes.push(name, key, self.id)
    }

    /// The (unsorted) bucket `key` of index `name`.
    pub fn index(&mut self, name: &str, key: &str) -> Result<&mut Vec<RecordId>, LoopError> {
        self.indexes.bucket(name, key)
    }

    /// Registry key of an asset owned by this record.
    pub fn asset_key(&self, local_name: &str) -> String {
        let base = self
            .current_key()
            .unwrap_or_else(|| self.name.clone());
        format!("{}/{local_name}", identity(&base))
    }

    pub fn asset_exists(&self, local_name: &str) -> bool {
        self.files.exists(&self.asset_key(local_name))
    }

    /// Copy an owned asset to the same local name under `target_content`.
    pub fn copy_asset(&mut self, local_name: &str, target_content: &str) -> Option<RecordId> {
        let (from, to) = self.asset_route(local_name, target_content)?;
        self.files.copy(&from, &to, [])
    }

    /// Hand an owned asset over to `target_content`, keeping its local name.
    pub fn move_asset(&mut self, local_name: &str, target_content: &str) -> bool {
        self.asset_route(local_name, target_content)
            .is_some_and(|(from, to)| self.files.move_file(&from, &to))
    }

    fn asset_route(&self, local_name: &str, target_content: &str) -> Option<(String, String)> {
        let from = self.asset_key(local_name);
        let to = format!("{}/{local_name}", identity(target_content));
        if from == to || self.current_key().as_deref() == Some(to.as_str()) {
            return None;
        }
        Some((from, to))
    }

    /// Build a plugin error attributed to this record.
    pub fn fail(&self, message: impl Into<String>) -> LoopError {
        LoopError::Plugin {
            file: self.name().to_string(),
            message: message.into(),
        }
    }

    fn current_key(&self) -> Option<String> {
        self.files.key_of(self.id).map(str::to_string)
    }

    fn lookup(&self, path: &PropPath) -> Option<Field<'_>> {
        self.record()?.lookup(path)
    }

    fn missing(&self, path: &PropPath) -> LoopError {
        LoopError::MissingRequiredProperty {
            file: self.name().to_string(),
            prop: path.to_string(),
        }
    }
}
