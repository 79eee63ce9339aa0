//! Settings file for the command line tool.
//!
//! ```yaml
//! target_version: "1.20"
//! disabled_rules:
//!   - aggregators.minmax
//!   - string_to_number
//! extensions: [conf, toml]
//! backup_suffix: .bak
//! jobs: 8
//! ```

use crate::rules::{Registry, SchemaVersion};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Schema version to migrate towards, newest when unset
    pub target_version: Option<String>,
    /// Rule names, or `section.type` to disable every rule of a plugin
    pub disabled_rules: Vec<String>,
    /// File extensions picked up by `batch`
    pub extensions: Vec<String>,
    /// Keep a copy of every file rewritten in place
    pub backup_suffix: Option<String>,
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_version: None,
            disabled_rules: Vec::new(),
            extensions: vec!["conf".to_string(), "toml".to_string()],
            backup_suffix: None,
            jobs: 4,
        }
    }
}

impl Settings {
    pub fn target_version(&self) -> Result<SchemaVersion, String> {
        match &self.target_version {
            Some(v) => v.parse(),
            None => Ok(SchemaVersion::LATEST),
        }
    }

    pub fn is_disabled(&self, rule: &str, plugin: &str) -> bool {
        self.disabled_rules
            .iter()
            .any(|d| d == rule || d == plugin)
    }

    /// Built-in rules minus the disabled ones
    pub fn build_registry(&self) -> Registry {
        let mut registry = Registry::with_builtin();
        registry.retain(|key, rule| !self.is_disabled(rule.name(), &key.to_string()));
        registry
    }
}
