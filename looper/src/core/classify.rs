//! Classification of raw discovered files into content and assets.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::error::LoopError;
use crate::core::naming::{identity, slice_path};
use crate::core::record::Meta;
use crate::core::registry::{FileSet, merge_data};

/// File-name conventions used by a build pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PassConfig {
    /// Keys ending in `.<page_extension>` are content; references resolve to it.
    pub page_extension: String,
    /// Keys ending in `.<data_extension>` are sidecar metadata.
    pub data_extension: String,
    /// Default layout is `<type>.<layout_extension>`.
    pub layout_extension: String,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            page_extension: "html".to_string(),
            data_extension: "json".to_string(),
            layout_extension: "njk".to_string(),
        }
    }
}

impl PassConfig {
    pub fn default_layout(&self, kind: &str) -> String {
        format!("{kind}.{}", self.layout_extension)
    }
}

/// Counts from [`classify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classified {
    pub content: usize,
    pub sidecars_merged: usize,
    pub sidecars_dropped: usize,
}

/// Mark content records, default their type and layout, then fold sidecar
/// metadata into its sibling page.
///
/// - `<key>.<page ext>` is content; type is the first segment of its identity.
/// - A string `layout` already in the metadata wins over `<type>.<layout ext>`.
/// - `<base>.<data ext>` is parsed as a JSON object and merged into
///   `<base>.<page ext>` when that exists. The sidecar is always removed.
pub fn classify(files: &mut FileSet, config: &PassConfig) -> Result<Classified, LoopError> {
    let page_suffix = format!(".{}", config.page_extension);
    let data_suffix = format!(".{}", config.data_extension);
    let mut outcome = Classified::default();

    for key in files.keys() {
        if !key.ends_with(&page_suffix) {
            continue;
        }
        let Some(record) = files.get_mut(&key) else {
            continue;
        };
        record.is_content = true;
        record.kind = slice_path(&identity(&key), 0, 1);
        if record.layout.is_none() {
            record.layout = match record.meta.remove("layout") {
                Some(Meta::Value(Value::String(layout))) => Some(layout),
                Some(other) => {
                    record.meta.insert("layout".to_string(), other);
                    None
                }
                None => None,
            };
        }
        if record.layout.is_none() {
            record.layout = Some(config.default_layout(&record.kind));
        }
        outcome.content += 1;
    }

    for key in files.keys() {
        let Some(base) = key.strip_suffix(&data_suffix) else {
            continue;
        };
        let sibling = format!("{base}{page_suffix}");
        let Some(sidecar) = files.remove(&key) else {
            continue;
        };
        if !files.exists(&sibling) {
            debug!(sidecar = %key, "dropped sidecar without sibling page");
            outcome.sidecars_dropped += 1;
            continue;
        }
        let data = parse_sidecar(&key, sidecar.contents.as_deref())?;
        if let Some(page) = files.get_mut(&sibling) {
            merge_data(page, data);
        }
        debug!(sidecar = %key, page = %sibling, "merged sidecar metadata");
        outcome.sidecars_merged += 1;
    }

    Ok(outcome)
}

fn parse_sidecar(
    key: &str,
    contents: Option<&[u8]>,
) -> Result<serde_json::Map<String, Value>, LoopError> {
    let invalid = |reason: String| LoopError::InvalidSidecar {
        file: key.to_string(),
        reason,
    };
    let bytes = contents.ok_or_else(|| invalid("no contents".to_string()))?;
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("expected a JSON object".to_string())),
        Err(err) => Err(invalid(err.to_string())),
    }
}
