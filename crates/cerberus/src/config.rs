//! Process configuration.

use cerberus_error::{CerberusResult, ConfigError};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use typed_builder::TypedBuilder;

fn default_store_path() -> PathBuf {
    PathBuf::from("cerberus.json")
}

fn default_asset_dir() -> PathBuf {
    PathBuf::from("guild_assets")
}

fn default_module_grace_secs() -> u64 {
    60
}

fn default_tracker_capacity() -> usize {
    100
}

/// Configuration for the guard process.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct CerberusConfig {
    /// Principals who receive operator notifications and hold the highest
    /// command tier.
    #[builder(default)]
    #[serde(default)]
    operators: Vec<u64>,
    /// Where the configuration store document lives.
    #[builder(default = default_store_path(), setter(into))]
    #[serde(default = "default_store_path")]
    store_path: PathBuf,
    /// Root directory for icon and banner backups.
    #[builder(default = default_asset_dir(), setter(into))]
    #[serde(default = "default_asset_dir")]
    asset_dir: PathBuf,
    /// How long a module disable request is honored before re-arming.
    #[builder(default = default_module_grace_secs())]
    #[serde(default = "default_module_grace_secs")]
    module_grace_secs: u64,
    /// Bounded rate-accounting history per (guild, principal) key.
    #[builder(default = default_tracker_capacity())]
    #[serde(default = "default_tracker_capacity")]
    tracker_capacity: usize,
}

impl Default for CerberusConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CerberusConfig {
    /// Load configuration from a TOML file.
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> CerberusResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            cerberus_error::CerberusError::from(ConfigError::new(format!(
                "Failed to read config file: {}",
                e
            )))
        })?;

        toml::from_str(&content).map_err(|e| {
            cerberus_error::CerberusError::from(ConfigError::new(format!(
                "Failed to parse config: {}",
                e
            )))
        })
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> CerberusResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::info!("No config file; using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_file() {
        let raw = r#"
            operators = [1399234120214909010, 1425947830463365120]
            store_path = "state/guard.json"
            asset_dir = "state/assets"
            module_grace_secs = 120
            tracker_capacity = 50
        "#;
        let config: CerberusConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.operators().len(), 2);
        assert_eq!(config.store_path(), &PathBuf::from("state/guard.json"));
        assert_eq!(*config.module_grace_secs(), 120);
        assert_eq!(*config.tracker_capacity(), 50);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: CerberusConfig = toml::from_str("operators = [1]").unwrap();
        assert_eq!(*config.module_grace_secs(), 60);
        assert_eq!(*config.tracker_capacity(), 100);
        assert_eq!(config.asset_dir(), &PathBuf::from("guild_assets"));
    }

    #[test]
    fn load_or_default_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CerberusConfig::load_or_default(dir.path().join("missing.toml")).unwrap();
        assert!(config.operators().is_empty());
    }
}
