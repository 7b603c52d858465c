//! Test-only helpers for building file sets and on-disk sites.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::naming::{identity, slice_path};
use crate::core::record::FileRecord;
use crate::core::registry::FileSet;

/// A raw, unclassified record as discovery would produce it.
pub fn raw(key: &str, contents: &str) -> (String, FileRecord) {
    (key.to_string(), FileRecord::new(contents))
}

/// An already classified content record; type is the first path segment.
pub fn content(key: &str) -> (String, FileRecord) {
    let kind = slice_path(&identity(key), 0, 1);
    let record = FileRecord {
        is_content: true,
        layout: Some(format!("{kind}.njk")),
        kind,
        ..FileRecord::new("")
    };
    (key.to_string(), record)
}

/// An asset record with empty contents.
pub fn asset(key: &str) -> (String, FileRecord) {
    (key.to_string(), FileRecord::new(""))
}

pub fn file_set(entries: Vec<(String, FileRecord)>) -> FileSet {
    entries.into_iter().collect()
}

/// A temporary source directory.
pub struct TestSite {
    temp: tempfile::TempDir,
}

impl TestSite {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { temp })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` at the relative `key`, creating parents.
    pub fn write(&self, key: &str, contents: &str) -> Result<()> {
        let path = self.root().join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }
}
