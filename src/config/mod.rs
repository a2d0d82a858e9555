// src/config/mod.rs

//! Configuration lookup for parameter default resolution.
//!
//! Responsibilities:
//! - Define the lookup capability consumed by task construction
//!   ([`ConfigLookup`]).
//! - Provide a TOML-backed store keyed by task family (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Hold the process-global installed lookup. Installation must happen
//!   before task definitions are built from it; entries are read-only
//!   afterwards.

pub mod loader;
pub mod model;

use std::sync::{Arc, LazyLock, RwLock};

pub use loader::load_from_path;
pub use model::{EmptyConfig, TomlConfig};

/// Capability consumed by the construction protocol: parameter values keyed
/// by task family and parameter name.
pub trait ConfigLookup: Send + Sync {
    /// Serialized value for `(family, name)`, if present.
    fn get_value(&self, family: &str, name: &str) -> Option<String>;

    fn has_value(&self, family: &str, name: &str) -> bool {
        self.get_value(family, name).is_some()
    }

    /// All known section (family) names.
    fn sections(&self) -> Vec<String>;

    /// All key/value pairs in a family's section, in key order.
    fn section_items(&self, family: &str) -> Vec<(String, String)>;
}

static INSTALLED: LazyLock<RwLock<Arc<dyn ConfigLookup>>> =
    LazyLock::new(|| RwLock::new(Arc::new(EmptyConfig)));

/// Install the process-global config lookup.
///
/// Call once during init, before building task instances that rely on
/// config-backed defaults.
pub fn install(config: Arc<dyn ConfigLookup>) {
    *INSTALLED.write().expect("config lock poisoned") = config;
}

/// The currently installed config lookup ([`EmptyConfig`] by default).
pub fn get() -> Arc<dyn ConfigLookup> {
    INSTALLED.read().expect("config lock poisoned").clone()
}
