//! Build pass controller: classify, run the plugin, renormalize keys,
//! finalize indexes, hand the result back.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::classify::{PassConfig, classify};
use crate::core::error::LoopError;
use crate::core::index::IndexTable;
use crate::core::naming::{normalize, to_path};
use crate::core::registry::FileSet;
use crate::core::walk::PluginActions;

/// Counts describing one finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Records left in the registry.
    pub records: usize,
    /// Content records left in the registry.
    pub content: usize,
    pub sidecars_merged: usize,
    /// Records whose key changed during renormalization.
    pub renormalized: usize,
    pub indexes: usize,
}

/// Run one build pass over `files`.
///
/// Index declarations and validation state live only for this call. `done`
/// is invoked exactly once, with the summary or with the error that aborted
/// the pass; the same result is returned.
pub fn run_pass<P, D>(
    files: &mut FileSet,
    config: &PassConfig,
    plugin: P,
    done: D,
) -> Result<PassSummary, LoopError>
where
    P: FnOnce(&mut PluginActions<'_>) -> Result<(), LoopError>,
    D: FnOnce(Result<&PassSummary, &LoopError>),
{
    let result = execute(files, config, plugin);
    done(result.as_ref());
    result
}

fn execute<P>(files: &mut FileSet, config: &PassConfig, plugin: P) -> Result<PassSummary, LoopError>
where
    P: FnOnce(&mut PluginActions<'_>) -> Result<(), LoopError>,
{
    let classified = classify(files, config)?;
    debug!(
        content = classified.content,
        sidecars = classified.sidecars_merged,
        "classified files"
    );

    let mut indexes = IndexTable::new();
    plugin(&mut PluginActions::new(files, &mut indexes, config))?;

    let renormalized = renormalize(files);

    let snapshot = Arc::new(indexes.finalize(files));
    for record in files.records_mut() {
        record.indexes = Some(Arc::clone(&snapshot));
    }

    let summary = PassSummary {
        records: files.len(),
        content: files.iter().filter(|(_, record)| record.is_content).count(),
        sidecars_merged: classified.sidecars_merged,
        renormalized,
        indexes: indexes.len(),
    };
    info!(
        records = summary.records,
        content = summary.content,
        indexes = summary.indexes,
        "build pass complete"
    );
    Ok(summary)
}

/// Re-key every record under the canonical form of its name.
fn renormalize(files: &mut FileSet) -> usize {
    let mut moved = 0;
    for key in files.keys() {
        let Some(record) = files.get(&key) else {
            continue;
        };
        let canonical = normalize(&to_path(&record.name));
        if canonical != key || record.name != key {
            files.move_file(&key, &canonical);
            moved += 1;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{file_set, raw};
    use serde_json::json;

    #[test]
    fn done_is_called_once_on_success() {
        let mut files = file_set(vec![raw("blog/a.html", "")]);
        let mut calls = 0;
        let summary = run_pass(&mut files, &PassConfig::default(), |_| Ok(()), |result| {
            calls += 1;
            assert!(result.is_ok());
        })
        .expect("pass");
        assert_eq!(calls, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.content, 1);
    }

    #[test]
    fn done_is_called_once_on_error() {
        let mut files = file_set(vec![raw("blog/a.html", "")]);
        let mut calls = 0;
        let result = run_pass(
            &mut files,
            &PassConfig::default(),
            |plugin| plugin.loop_content(|file| file.required("title")).map(|_| ()),
            |result| {
                calls += 1;
                assert!(matches!(result, Err(LoopError::MissingRequiredProperty { .. })));
            },
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn extensionless_names_become_index_documents() {
        let mut files = file_set(vec![raw("blog/a.html", "")]);
        let summary = run_pass(
            &mut files,
            &PassConfig::default(),
            |plugin| {
                plugin.loop_content(|file| {
                    file.move_to("blog/a/");
                    Ok(())
                })?;
                plugin.create_item("tags", "rust", serde_json::Map::new(), None);
                Ok(())
            },
            |_| {},
        )
        .expect("pass");
        assert!(files.exists("tags/rust/index.html"));
        assert!(files.exists("blog/a/index.html"));
        assert_eq!(summary.renormalized, 1);
    }

    #[test]
    fn host_separators_and_dot_segments_are_normalized() {
        let mut files = file_set(vec![raw("blog/./x//a.html", "")]);
        run_pass(&mut files, &PassConfig::default(), |_| Ok(()), |_| {}).expect("pass");
        assert_eq!(files.keys(), vec!["blog/x/a.html"]);
    }

    #[test]
    fn every_record_gets_the_same_index_snapshot() {
        let mut files = file_set(vec![
            raw("blog/a.html", ""),
            raw("blog/a/img.png", ""),
            raw("blog/b.html", ""),
        ]);
        run_pass(
            &mut files,
            &PassConfig::default(),
            |plugin| {
                plugin.declare_index("recent", "date", true);
                plugin
                    .loop_content(|file| {
                        let date = if file.name() == "blog/a.html" { 1 } else { 2 };
                        file.set("date", json!(date));
                        file.add_index("recent", "blog")
                    })
                    .map(|_| ())
            },
            |_| {},
        )
        .expect("pass");

        let a = files.get("blog/a.html").expect("a");
        let b = files.get("blog/b.html").expect("b");
        let img = files.get("blog/a/img.png").expect("img");
        let order = a.indexes().and_then(|i| i.get("recent", "blog")).expect("group");
        assert_eq!(order, &[b.id().expect("id"), a.id().expect("id")][..]);
        assert_eq!(img.indexes(), a.indexes());
    }

    #[test]
    fn indexes_do_not_leak_between_passes() {
        let mut files = file_set(vec![raw("blog/a.html", "")]);
        run_pass(
            &mut files,
            &PassConfig::default(),
            |plugin| {
                plugin.declare_index("recent", "date", false);
                Ok(())
            },
            |_| {},
        )
        .expect("first pass");
        let err = run_pass(
            &mut files,
            &PassConfig::default(),
            |plugin| plugin.index("recent", "k").map(|_| ()),
            |_| {},
        )
        .expect_err("index from the previous pass is gone");
        assert!(matches!(err, LoopError::UnknownIndex { .. }));
    }
}
