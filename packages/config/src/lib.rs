#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the data collaborators.
//!
//! Defaults are embedded at compile time from `config/default.toml`. A
//! user file is layered on top key by key, and a couple of environment
//! variables override the result. The loaded [`Config`] is handed to the
//! downloader, the Overpass client, and the store explicitly; nothing reads
//! global state after startup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a config file, used when none is passed.
pub const CONFIG_ENV: &str = "HOUSING_MAP_CONFIG";

/// Environment variable overriding [`StoreConfig::path`].
pub const DB_ENV: &str = "HOUSING_MAP_DB";

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A config document is not valid TOML.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Price-paid download settings.
    pub land_registry: LandRegistryConfig,
    /// Overpass API settings.
    pub overpass: OverpassConfig,
    /// Local store settings.
    pub store: StoreConfig,
}

/// Where and how price-paid CSVs are downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LandRegistryConfig {
    /// Base URL of the public data bucket (no trailing slash).
    pub base_url: String,
    /// Number of `partN` files published per year.
    pub parts_per_year: u32,
    /// Directory downloaded files are written to.
    pub download_dir: PathBuf,
}

/// Overpass API client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OverpassConfig {
    /// Interpreter endpoint.
    pub url: String,
    /// Server-side query timeout, also used as the HTTP timeout.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with each request.
    pub user_agent: String,
}

/// Local `DuckDB` store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Config {
    /// The embedded defaults.
    ///
    /// # Panics
    ///
    /// Panics if the embedded default TOML is malformed (this is a
    /// compile-time guarantee since the file is embedded and tested).
    #[must_use]
    pub fn defaults() -> Self {
        toml::from_str(DEFAULT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Loads the defaults, layers the config file on top (the explicit
    /// `path`, else the file named by [`CONFIG_ENV`], else none), then
    /// applies [`DB_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or either
    /// document does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let file = path.map(Path::to_path_buf).or(env_path);

        let overrides = match &file {
            Some(file) => {
                log::info!("Loading config from {}", file.display());
                Some(
                    std::fs::read_to_string(file).map_err(|source| ConfigError::Io {
                        path: file.display().to_string(),
                        source,
                    })?,
                )
            }
            None => None,
        };

        let mut config = Self::from_layers(overrides.as_deref())?;

        if let Some(db) = std::env::var_os(DB_ENV) {
            config.store.path = PathBuf::from(db);
            log::debug!("Store path overridden by {DB_ENV}: {}", config.store.path.display());
        }

        Ok(config)
    }

    /// Merges an optional override document onto the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if either document is invalid or the
    /// merged document does not match [`Config`].
    pub fn from_layers(overrides: Option<&str>) -> Result<Self, ConfigError> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_TOML)?;

        if let Some(text) = overrides {
            let layer: toml::Table = toml::from_str(text)?;
            merge_tables(&mut merged, layer);
        }

        Ok(toml::Value::Table(merged).try_into()?)
    }
}

/// Deep-merges `layer` into `base`; tables merge key by key, anything else
/// replaces.
fn merge_tables(base: &mut toml::Table, layer: toml::Table) {
    for (key, value) in layer {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_parse() {
        let config = Config::defaults();
        assert_eq!(config.land_registry.parts_per_year, 2);
        assert!(config.land_registry.base_url.starts_with("http://"));
        assert!(!config.land_registry.base_url.ends_with('/'));
        assert!(config.overpass.url.ends_with("/interpreter"));
        assert!(config.overpass.timeout_secs > 0);
        assert_eq!(config.store.path, PathBuf::from("data/housing_map.duckdb"));
    }

    #[test]
    fn overrides_replace_only_given_keys() {
        let config = Config::from_layers(Some(
            "[overpass]\ntimeout_secs = 25\n\n[store]\npath = \"/tmp/prices.duckdb\"\n",
        ))
        .unwrap();

        let defaults = Config::defaults();
        assert_eq!(config.overpass.timeout_secs, 25);
        assert_eq!(config.overpass.url, defaults.overpass.url);
        assert_eq!(config.store.path, PathBuf::from("/tmp/prices.duckdb"));
        assert_eq!(config.land_registry, defaults.land_registry);
    }

    #[test]
    fn no_overrides_equals_defaults() {
        assert_eq!(Config::from_layers(None).unwrap(), Config::defaults());
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        let result = Config::from_layers(Some("[land_registry]\nparts_per_year = \"two\"\n"));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        assert!(matches!(
            Config::from_layers(Some("[store\npath = 1")),
            Err(ConfigError::Parse(_))
        ));
    }
}
