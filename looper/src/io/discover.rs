//! Load a directory tree into raw records.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::record::FileRecord;
use crate::core::registry::FileSet;

/// Read every file under `root` into a [`FileSet`], keyed by its relative
/// `/`-separated path. Keys are inserted in sorted order.
pub fn load_dir(root: &Path) -> Result<FileSet> {
    if !root.is_dir() {
        return Err(anyhow!("expected directory {}", root.display()));
    }
    let mut paths = Vec::new();
    collect(root, &mut paths)?;
    paths.sort();

    let mut files = FileSet::new();
    for path in paths {
        let relative = path
            .strip_prefix(root)
            .with_context(|| format!("relativize {}", path.display()))?;
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let contents = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        files.insert(key, FileRecord::new(contents));
    }
    debug!(root = %root.display(), files = files.len(), "loaded source directory");
    Ok(files)
}

fn collect(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat {}", path.display()))?;
        if file_type.is_dir() {
            collect(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
