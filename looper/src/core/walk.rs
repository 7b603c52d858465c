//! Filtered walks over the registry, driven by plugin callbacks.

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::actions::{FileActions, ValidationContext};
use crate::core::classify::PassConfig;
use crate::core::error::LoopError;
use crate::core::index::IndexTable;
use crate::core::record::{FileRecord, RecordId};
use crate::core::registry::FileSet;

/// Whether a walk continues after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

/// `true` stops the walk, like a find.
impl From<bool> for Flow {
    fn from(stop: bool) -> Self {
        if stop { Flow::Stop } else { Flow::Continue }
    }
}

/// The action surface handed to a plugin for one build pass.
pub struct PluginActions<'a> {
    files: &'a mut FileSet,
    indexes: &'a mut IndexTable,
    config: &'a PassConfig,
}

impl<'a> PluginActions<'a> {
    pub fn new(files: &'a mut FileSet, indexes: &'a mut IndexTable, config: &'a PassConfig) -> Self {
        Self {
            files,
            indexes,
            config,
        }
    }

    pub fn files(&self) -> &FileSet {
        self.files
    }

    /// Visit every record matching `filter`.
    ///
    /// Keys are snapshotted up front. Keys that vanish before their turn are
    /// skipped. After each callback, a record whose `name` no longer matches
    /// its registry key is moved (with assets) to that name. Returns
    /// [`Flow::Stop`] when a callback asked to stop early.
    pub fn loop_files<P, F, R>(&mut self, filter: P, mut callback: F) -> Result<Flow, LoopError>
    where
        P: Fn(&FileRecord) -> bool,
        F: FnMut(&mut FileActions<'_>) -> Result<R, LoopError>,
        R: Into<Flow>,
    {
        let mut context = ValidationContext::default();
        for key in self.files.keys() {
            let Some(id) = self.files.id_of(&key) else {
                debug!(key = %key, "skipping key removed during walk");
                continue;
            };
            if !self.files.record(id).is_some_and(&filter) {
                continue;
            }

            let mut actions =
                FileActions::new(self.files, self.indexes, &mut context, self.config, id);
            let flow: Flow = callback(&mut actions)?.into();

            self.reconcile(id);
            if flow == Flow::Stop {
                debug!(key = %key, "walk stopped early");
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    /// Walk every content record.
    pub fn loop_content<F, R>(&mut self, callback: F) -> Result<Flow, LoopError>
    where
        F: FnMut(&mut FileActions<'_>) -> Result<R, LoopError>,
        R: Into<Flow>,
    {
        self.loop_files(|record| record.is_content, callback)
    }

    /// Walk every record whose type is `kind`.
    pub fn loop_on_type<F, R>(&mut self, kind: &str, callback: F) -> Result<Flow, LoopError>
    where
        F: FnMut(&mut FileActions<'_>) -> Result<R, LoopError>,
        R: Into<Flow>,
    {
        self.loop_files(|record| record.kind == kind, callback)
    }

    /// Declare an index. Redeclaring an existing name drops its entries.
    pub fn declare_index(&mut self, name: &str, sort_prop: &str, reversed: bool) {
        self.indexes.declare(name, sort_prop, reversed);
    }

    /// The (unsorted) bucket `key` of index `name`.
    pub fn index(&mut self, name: &str, key: &str) -> Result<&mut Vec<RecordId>, LoopError> {
        self.indexes.bucket(name, key)
    }

    /// Synthesize a content record at `kind/name`.
    pub fn create_item(
        &mut self,
        kind: &str,
        name: &str,
        data: Map<String, Value>,
        contents: Option<Vec<u8>>,
    ) -> RecordId {
        self.files
            .create(kind, name, &self.config.layout_extension, data, contents)
    }

    fn reconcile(&mut self, id: RecordId) {
        let Some(record) = self.files.record(id) else {
            return;
        };
        let Some(key) = self.files.key_of(id) else {
            return;
        };
        if record.name == key {
            return;
        }
        let (key, name) = (key.to_string(), record.name.clone());
        debug!(from = %key, to = %name, "reconciling renamed record");
        self.files.move_with_assets(&key, &name);
    }
}
