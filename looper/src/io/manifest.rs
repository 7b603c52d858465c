//! Manifest output: the rendering contexts of a finished pass as JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::registry::FileSet;

/// Pretty JSON for every record's context, with trailing newline.
pub fn manifest_string(files: &FileSet) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(&files.manifest()).context("serialize manifest")?;
    buf.push('\n');
    Ok(buf)
}

/// Atomically write the manifest (temp file + rename).
pub fn write_manifest(path: &Path, files: &FileSet) -> Result<()> {
    let contents = manifest_string(files)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp manifest {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace manifest {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{content, file_set};
    use serde_json::Value;

    #[test]
    fn write_manifest_creates_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out/manifest.json");
        let files = file_set(vec![content("blog/a.html")]);
        write_manifest(&path, &files).expect("write");

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(written[0]["name"], "blog/a.html");
        assert!(!temp.path().join("out/manifest.json.tmp").exists());
    }
}
