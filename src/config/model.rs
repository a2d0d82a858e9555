// src/config/model.rs

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use toml::Value;

use crate::config::ConfigLookup;

/// TOML-backed configuration store.
///
/// Sections map task families to parameter values:
///
/// ```toml
/// [CopyReport]
/// date = "2024-01-01"
/// retries = 3
/// ```
///
/// Keys are normalized at load time (`-` becomes `_`) so file conventions
/// and parameter names line up. Values are stored in their serialized string
/// form; the parameter kind decides how they parse.
#[derive(Debug, Clone, Default)]
pub struct TomlConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl TomlConfig {
    /// Parse TOML text into a config store.
    ///
    /// Every top-level entry must be a table (a family section).
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, Value>> =
            toml::from_str(contents).context("parsing TOML config sections")?;

        let mut sections = BTreeMap::new();
        for (family, items) in raw {
            let mut section = BTreeMap::new();
            for (key, value) in items {
                section.insert(key.replace('-', "_"), value_to_string(value));
            }
            sections.insert(family, section);
        }

        Ok(Self { sections })
    }

    /// Build directly from section data, mainly for tests and embedding.
    pub fn from_sections(
        sections: impl IntoIterator<Item = (String, Vec<(String, String)>)>,
    ) -> Self {
        Self {
            sections: sections
                .into_iter()
                .map(|(family, items)| {
                    (
                        family,
                        items
                            .into_iter()
                            .map(|(k, v)| (k.replace('-', "_"), v))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl ConfigLookup for TomlConfig {
    fn get_value(&self, family: &str, name: &str) -> Option<String> {
        self.sections.get(family)?.get(name).cloned()
    }

    fn sections(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    fn section_items(&self, family: &str) -> Vec<(String, String)> {
        self.sections
            .get(family)
            .map(|section| {
                section
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A lookup with no entries; the default installed config.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyConfig;

impl ConfigLookup for EmptyConfig {
    fn get_value(&self, _family: &str, _name: &str) -> Option<String> {
        None
    }

    fn sections(&self) -> Vec<String> {
        Vec::new()
    }

    fn section_items(&self, _family: &str) -> Vec<(String, String)> {
        Vec::new()
    }
}
