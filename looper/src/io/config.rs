//! Looper configuration, usually `looper.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::classify::PassConfig;
use crate::rules::{IndexConfig, RuleConfig, RulesPlugin};

/// Looper configuration (TOML).
///
/// Missing fields default to the conventions in [`PassConfig::default`] and
/// an empty rule set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LooperConfig {
    pub pass: PassConfig,

    #[serde(rename = "index")]
    pub indexes: Vec<IndexConfig>,

    #[serde(rename = "rule")]
    pub rules: Vec<RuleConfig>,
}

impl LooperConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("pass.page_extension", &self.pass.page_extension),
            ("pass.data_extension", &self.pass.data_extension),
            ("pass.layout_extension", &self.pass.layout_extension),
        ] {
            if value.trim().is_empty() || value.starts_with('.') {
                return Err(anyhow!("{field} must be a non-empty extension without a leading dot"));
            }
        }
        if self.pass.page_extension == self.pass.data_extension {
            return Err(anyhow!("pass.page_extension and pass.data_extension must differ"));
        }
        self.plugin().validate()
    }

    pub fn plugin(&self) -> RulesPlugin {
        RulesPlugin::new(self.indexes.clone(), self.rules.clone())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LooperConfig::default()`.
pub fn load_config(path: &Path) -> Result<LooperConfig> {
    if !path.exists() {
        let cfg = LooperConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LooperConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
