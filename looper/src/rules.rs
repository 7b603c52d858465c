//! A plugin assembled from declarative configuration.
//!
//! Each `[[rule]]` becomes one walk, so uniqueness is checked per rule.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::actions::FileActions;
use crate::core::error::LoopError;
use crate::core::prop::{Field, PropPath};
use crate::core::walk::PluginActions;

/// `[[index]]`: an index declared before any rule runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexConfig {
    pub name: String,
    pub sort_by: String,
    #[serde(default)]
    pub reversed: bool,
}

/// One index membership inside a rule: a literal `key` or the record's
/// `group_by` property value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IndexEntryConfig {
    pub name: String,
    pub key: Option<String>,
    pub group_by: Option<String>,
}

/// `[[rule]]`: checks and links applied to every record of a type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleConfig {
    /// Restrict to this type; every content record when absent.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub defaults: BTreeMap<String, Value>,
    pub required: Vec<String>,
    pub one_of: BTreeMap<String, Vec<Value>>,
    pub unique: Vec<String>,
    /// Property name -> type of the referenced records.
    pub references: BTreeMap<String, String>,
    pub indexes: Vec<IndexEntryConfig>,
}

/// Declared indexes plus rules, runnable as a build-pass plugin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulesPlugin {
    pub indexes: Vec<IndexConfig>,
    pub rules: Vec<RuleConfig>,
}

impl RulesPlugin {
    pub fn new(indexes: Vec<IndexConfig>, rules: Vec<RuleConfig>) -> Self {
        Self { indexes, rules }
    }

    /// Static checks that do not need any files.
    pub fn validate(&self) -> Result<()> {
        for index in &self.indexes {
            if index.name.trim().is_empty() {
                return Err(anyhow!("index name must not be empty"));
            }
            if index.sort_by.trim().is_empty() {
                return Err(anyhow!("index '{}': sort_by must not be empty", index.name));
            }
        }
        for (position, rule) in self.rules.iter().enumerate() {
            for entry in &rule.indexes {
                if !self.indexes.iter().any(|index| index.name == entry.name) {
                    return Err(anyhow!(
                        "rule {position}: index '{}' is not declared",
                        entry.name
                    ));
                }
                if entry.key.is_some() == entry.group_by.is_some() {
                    return Err(anyhow!(
                        "rule {position}: index '{}' needs exactly one of key or group_by",
                        entry.name
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn apply(&self, plugin: &mut PluginActions<'_>) -> Result<(), LoopError> {
        for index in &self.indexes {
            plugin.declare_index(&index.name, &index.sort_by, index.reversed);
        }
        for rule in &self.rules {
            debug!(kind = ?rule.kind, "applying rule");
            match &rule.kind {
                Some(kind) => plugin.loop_on_type(kind, |file| apply_rule(rule, file))?,
                None => plugin.loop_content(|file| apply_rule(rule, file))?,
            };
        }
        Ok(())
    }
}

fn apply_rule(rule: &RuleConfig, file: &mut FileActions<'_>) -> Result<(), LoopError> {
    for (prop, default) in &rule.defaults {
        file.required_or(prop, default.clone())?;
    }
    for prop in &rule.required {
        file.required(prop)?;
    }
    for (prop, allowed) in &rule.one_of {
        file.one_of(prop, allowed.iter().cloned())?;
    }
    for prop in &rule.unique {
        file.unique(prop)?;
    }
    for (prop, kind) in &rule.references {
        file.add_reference(prop, kind)?;
    }
    for entry in &rule.indexes {
        let key = match (&entry.key, &entry.group_by) {
            (Some(key), _) => Some(key.clone()),
            (None, Some(prop)) => group_key(file, prop),
            (None, None) => None,
        };
        match key {
            Some(key) => file.add_index(&entry.name, &key)?,
            None => debug!(file = %file.name(), index = %entry.name, "no group key; not indexed"),
        }
    }
    Ok(())
}

fn group_key(file: &FileActions<'_>, prop: &str) -> Option<String> {
    let value = match file.record()?.lookup(&PropPath::parse(prop))? {
        Field::Value(value) => value,
        Field::Ref(reference) => &reference.value,
    };
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::PassConfig;
    use crate::core::registry::FileSet;
    use crate::pass::run_pass;
    use crate::test_support::{file_set, raw};
    use serde_json::json;

    fn site() -> FileSet {
        let (a, post_a) = raw("blog/a.html", "");
        let (b, post_b) = raw("blog/b.html", "");
        file_set(vec![
            (a, post_a.with("title", "A").with("date", 1).with("category", "rust")),
            (b, post_b.with("title", "B").with("date", 2).with("category", "go")),
            raw("authors/ann.html", ""),
        ])
    }

    fn recent() -> IndexConfig {
        IndexConfig {
            name: "recent".to_string(),
            sort_by: "date".to_string(),
            reversed: true,
        }
    }

    #[test]
    fn rules_apply_defaults_checks_and_indexes() {
        let plugin = RulesPlugin::new(
            vec![recent()],
            vec![RuleConfig {
                kind: Some("blog".to_string()),
                defaults: BTreeMap::from([("draft".to_string(), json!(false))]),
                required: vec!["title".to_string()],
                unique: vec!["title".to_string()],
                indexes: vec![
                    IndexEntryConfig {
                        name: "recent".to_string(),
                        key: Some("all".to_string()),
                        group_by: None,
                    },
                    IndexEntryConfig {
                        name: "recent".to_string(),
                        key: None,
                        group_by: Some("category".to_string()),
                    },
                ],
                ..RuleConfig::default()
            }],
        );
        plugin.validate().expect("valid");

        let mut files = site();
        run_pass(&mut files, &PassConfig::default(), |p| plugin.apply(p), |_| {}).expect("pass");

        let a = files.get("blog/a.html").expect("a");
        assert_eq!(a.value("draft"), Some(&json!(false)));
        let snapshot = a.indexes().expect("indexes");
        let all: Vec<&str> = snapshot
            .get("recent", "all")
            .expect("all")
            .iter()
            .map(|id| files.record(*id).expect("record").name.as_str())
            .collect();
        assert_eq!(all, vec!["blog/b.html", "blog/a.html"]);
        assert_eq!(snapshot.get("recent", "rust").map(<[_]>::len), Some(1));
    }

    #[test]
    fn rule_violations_abort_the_pass() {
        let plugin = RulesPlugin::new(
            Vec::new(),
            vec![RuleConfig {
                required: vec!["summary".to_string()],
                ..RuleConfig::default()
            }],
        );
        let mut files = site();
        let err = run_pass(&mut files, &PassConfig::default(), |p| plugin.apply(p), |_| {})
            .expect_err("missing summary");
        assert!(matches!(err, LoopError::MissingRequiredProperty { ref prop, .. } if prop == "summary"));
    }

    #[test]
    fn validate_rejects_undeclared_index() {
        let plugin = RulesPlugin::new(
            Vec::new(),
            vec![RuleConfig {
                indexes: vec![IndexEntryConfig {
                    name: "nope".to_string(),
                    key: Some("k".to_string()),
                    group_by: None,
                }],
                ..RuleConfig::default()
            }],
        );
        let err = plugin.validate().expect_err("undeclared");
        assert!(err.to_string().contains("'nope' is not declared"));
    }

    #[test]
    fn validate_rejects_ambiguous_group() {
        let plugin = RulesPlugin::new(
            vec![recent()],
            vec![RuleConfig {
                indexes: vec![IndexEntryConfig {
                    name: "recent".to_string(),
                    ..IndexEntryConfig::default()
                }],
                ..RuleConfig::default()
            }],
        );
        assert!(plugin.validate().is_err());
    }
}
