// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::model::TomlConfig;

/// Load a configuration file from a given path into a [`TomlConfig`].
///
/// This only reads and deserializes; installing the result as the
/// process-global lookup is a separate, explicit step via
/// [`crate::config::install`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<TomlConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    TomlConfig::from_toml_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::ConfigLookup;

    #[test]
    fn loads_config_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[Report]\nday = \"monday\"").unwrap();

        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.get_value("Report", "day").as_deref(), Some("monday"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_from_path("/definitely/not/here.toml").is_err());
    }
}
