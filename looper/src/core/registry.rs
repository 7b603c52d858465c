//! The path → record map and the primitives allowed to change its keys.
//!
//! Primitives are lenient: a missing source key is logged and reported through
//! the return value, never raised.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::naming::{INDEX_FILE, dirname, identity, is_index_document};
use crate::core::record::{FileRecord, Meta, RecordId};

#[derive(Debug, Clone)]
struct Slot {
    key: String,
    record: FileRecord,
}

/// Insertion-ordered registry of virtual files.
///
/// Each record is reachable under exactly one key. Records also carry a
/// [`RecordId`] that survives renames, which is what references and index
/// entries hold on to.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    keys: IndexMap<String, RecordId>,
    slots: HashMap<RecordId, Slot>,
    next_id: u64,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Insert `record` under `key`, replacing any record already there.
    pub fn insert(&mut self, key: impl Into<String>, mut record: FileRecord) -> RecordId {
        let key = key.into();
        let id = RecordId(self.next_id);
        self.next_id += 1;
        record.name = key.clone();
        record.id = Some(id);
        if let Some(previous) = self.keys.insert(key.clone(), id) {
            warn!(key = %key, "replacing existing record");
            self.slots.remove(&previous);
        }
        self.slots.insert(id, Slot { key, record });
        id
    }

    pub fn exists(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn id_of(&self, key: &str) -> Option<RecordId> {
        self.keys.get(key).copied()
    }

    /// The key under which the registry currently stores `id`.
    pub fn key_of(&self, id: RecordId) -> Option<&str> {
        self.slots.get(&id).map(|slot| slot.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&FileRecord> {
        self.record(self.id_of(key)?)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FileRecord> {
        let id = self.id_of(key)?;
        self.record_mut(id)
    }

    pub fn record(&self, id: RecordId) -> Option<&FileRecord> {
        self.slots.get(&id).map(|slot| &slot.record)
    }

    pub fn record_mut(&mut self, id: RecordId) -> Option<&mut FileRecord> {
        self.slots.get_mut(&id).map(|slot| &mut slot.record)
    }

    /// Snapshot of the current keys, in registry order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.keys
            .iter()
            .filter_map(|(key, id)| Some((key.as_str(), &self.slots.get(id)?.record)))
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut FileRecord> {
        self.slots.values_mut().map(|slot| &mut slot.record)
    }

    /// Delete the record at `key`. Owned assets are left in place.
    pub fn remove(&mut self, key: &str) -> Option<FileRecord> {
        let Some(id) = self.keys.shift_remove(key) else {
            debug!(key, "remove skipped: no such key");
            return None;
        };
        debug!(key, "removed file");
        self.slots.remove(&id).map(|slot| slot.record)
    }

    /// Re-key a single record, without touching its assets.
    ///
    /// The record moves to the end of the registry order, unless `new` was
    /// already occupied, in which case the occupant is replaced in place.
    pub fn move_file(&mut self, old: &str, new: &str) -> bool {
        let Some(id) = self.id_of(old) else {
            debug!(from = old, to = new, "move skipped: no such key");
            return false;
        };
        if old != new {
            self.keys.shift_remove(old);
            if let Some(previous) = self.keys.insert(new.to_string(), id) {
                warn!(key = new, "move replaced existing record");
                self.slots.remove(&previous);
            }
        }
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.key = new.to_string();
            slot.record.name = new.to_string();
        }
        debug!(from = old, to = new, "moved file");
        true
    }

    /// Rename a content record and carry its owned assets along.
    ///
    /// A trailing `/` on `new` names a directory index document. Assets under
    /// `identity(old)/` move below the new owning directory: the directory of
    /// `new` for index documents, `identity(new)` otherwise.
    pub fn move_with_assets(&mut self, old: &str, new: &str) -> bool {
        let mut new = new.to_string();
        if new.ends_with('/') {
            new.push_str(INDEX_FILE);
        }
        if !self.move_file(old, &new) {
            return false;
        }

        let content_id = identity(old);
        let prefix = format!("{content_id}/");
        let base = if is_index_document(&new) {
            dirname(&new).to_string()
        } else {
            identity(&new)
        };

        for key in self.keys() {
            if !key.starts_with(&prefix) {
                continue;
            }
            if self.get(&key).is_none_or(|asset| asset.is_content) {
                continue;
            }
            let suffix = &key[content_id.len()..];
            let asset_key = if base.is_empty() {
                suffix.trim_start_matches('/').to_string()
            } else {
                format!("{base}{suffix}")
            };
            if asset_key != key {
                self.move_file(&key, &asset_key);
            }
        }
        true
    }

    /// Shallow-duplicate the record at `source` under `new`, applying
    /// `overrides` on top. Assets are not copied.
    pub fn copy(
        &mut self,
        source: &str,
        new: &str,
        overrides: impl IntoIterator<Item = (String, Meta)>,
    ) -> Option<RecordId> {
        let Some(original) = self.get(source) else {
            debug!(from = source, to = new, "copy skipped: no such key");
            return None;
        };
        let mut record = original.clone();
        record.id = None;
        record.indexes = None;
        record.meta.extend(overrides);
        debug!(from = source, to = new, "copied file");
        Some(self.insert(new, record))
    }

    /// Synthesize a content record at `kind/local_name`.
    ///
    /// A string `layout` entry in `data` wins over the default
    /// `kind.layout_extension`.
    pub fn create(
        &mut self,
        kind: &str,
        local_name: &str,
        layout_extension: &str,
        data: Map<String, Value>,
        contents: Option<Vec<u8>>,
    ) -> RecordId {
        let mut record = FileRecord {
            is_content: true,
            kind: kind.to_string(),
            layout: Some(format!("{kind}.{layout_extension}")),
            contents,
            ..FileRecord::default()
        };
        merge_data(&mut record, data);
        let key = format!("{kind}/{local_name}");
        debug!(key = %key, "created item");
        self.insert(key, record)
    }
}

/// Merge parsed key/value data into a record; `layout` feeds the layout field.
pub(crate) fn merge_data(record: &mut FileRecord, data: Map<String, Value>) {
    for (key, value) in data {
        if key == "layout" {
            if let Value::String(layout) = &value {
                record.layout = Some(layout.clone());
                continue;
            }
        }
        record.meta.insert(key, Meta::Value(value));
    }
}

impl FromIterator<(String, FileRecord)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
        let mut files = FileSet::new();
        for (key, record) in iter {
            files.insert(key, record);
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{asset, content, file_set};
    use serde_json::json;

    #[test]
    fn insert_sets_name_and_id() {
        let mut files = FileSet::new();
        let id = files.insert("a/b.html", FileRecord::new("x"));
        let record = files.get("a/b.html").expect("record");
        assert_eq!(record.name, "a/b.html");
        assert_eq!(record.id(), Some(id));
        assert_eq!(files.key_of(id), Some("a/b.html"));
    }

    #[test]
    fn remove_missing_key_is_a_no_op() {
        let mut files = file_set(vec![content("a/b.html")]);
        assert!(files.remove("nope.html").is_none());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn remove_leaves_assets_behind() {
        let mut files = file_set(vec![content("a/b.html"), asset("a/b/img.png")]);
        files.remove("a/b.html");
        assert!(files.exists("a/b/img.png"));
    }

    #[test]
    fn move_file_keeps_id_and_updates_name() {
        let mut files = file_set(vec![content("a/old.html")]);
        let id = files.id_of("a/old.html").expect("id");
        assert!(files.move_file("a/old.html", "a/new.html"));
        assert!(!files.exists("a/old.html"));
        assert_eq!(files.id_of("a/new.html"), Some(id));
        assert_eq!(files.record(id).expect("record").name, "a/new.html");
    }

    #[test]
    fn move_missing_source_reports_false() {
        let mut files = FileSet::new();
        assert!(!files.move_file("gone.html", "here.html"));
        assert!(!files.move_with_assets("gone.html", "here.html"));
        assert!(files.is_empty());
    }

    #[test]
    fn move_cascades_owned_assets() {
        let mut files = file_set(vec![
            content("a/old.html"),
            asset("a/old/img.png"),
            asset("a/old/deep/x.css"),
            asset("a/older/keep.png"),
        ]);
        assert!(files.move_with_assets("a/old.html", "a/new.html"));
        assert!(files.exists("a/new.html"));
        assert!(files.exists("a/new/img.png"));
        assert!(files.exists("a/new/deep/x.css"));
        assert!(!files.exists("a/old/img.png"));
        assert!(files.exists("a/older/keep.png"));
    }

    #[test]
    fn move_to_directory_places_assets_beside_index() {
        let mut files = file_set(vec![content("blog/post.html"), asset("blog/post/cover.jpg")]);
        files.move_with_assets("blog/post.html", "blog/2020/post/");
        assert!(files.exists("blog/2020/post/index.html"));
        assert!(files.exists("blog/2020/post/cover.jpg"));
    }

    #[test]
    fn move_does_not_touch_content_under_prefix() {
        let mut files = file_set(vec![content("a/old.html"), content("a/old/child.html")]);
        files.move_with_assets("a/old.html", "a/new.html");
        assert!(files.exists("a/old/child.html"));
    }

    #[test]
    fn copy_applies_overrides_without_assets() {
        let mut files = file_set(vec![content("a/b.html"), asset("a/b/img.png")]);
        files
            .get_mut("a/b.html")
            .expect("record")
            .set("title", "Original");
        let id = files
            .copy(
                "a/b.html",
                "a/c.html",
                [("title".to_string(), Meta::Value(json!("Copy")))],
            )
            .expect("copied");
        let copy = files.record(id).expect("record");
        assert_eq!(copy.name, "a/c.html");
        assert_eq!(copy.value("title"), Some(&json!("Copy")));
        assert_eq!(
            files.get("a/b.html").expect("original").value("title"),
            Some(&json!("Original"))
        );
        assert!(!files.exists("a/c/img.png"));
    }

    #[test]
    fn create_builds_content_record() {
        let mut files = FileSet::new();
        let mut data = Map::new();
        data.insert("page".to_string(), json!(2));
        let id = files.create("tags", "rust/2", "njk", data, None);
        let record = files.record(id).expect("record");
        assert_eq!(record.name, "tags/rust/2");
        assert!(record.is_content);
        assert_eq!(record.kind, "tags");
        assert_eq!(record.layout.as_deref(), Some("tags.njk"));
        assert_eq!(record.value("page"), Some(&json!(2)));
    }

    #[test]
    fn keys_follow_insertion_order_and_moves_go_last() {
        let mut files = file_set(vec![content("a.html"), content("b.html"), content("c.html")]);
        files.move_file("a.html", "z.html");
        assert_eq!(files.keys(), vec!["b.html", "c.html", "z.html"]);
    }
}
