//! Configuration types for the feed archive store.
//!
//! Configuration is loaded from TOML files and environment variables
//! (`FEEDARCHIVE__` prefix, `__` as the nesting separator, e.g.
//! `FEEDARCHIVE__ENGINE__SCAN_BATCH_SIZE=512`). Config structs validate their
//! values at construction time via fallible builders; after deserialization
//! call [`StoreConfig::validate`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::snowflake::WORKER_MASK;

/// Configuration error.
#[derive(Debug, Snafu)]
pub enum ConfigError {
    /// Configuration sources could not be read.
    #[snafu(display("failed to load config: {message}"))]
    Load {
        /// Description of the load failure.
        message: String,
    },

    /// Configuration sources could not be deserialized.
    #[snafu(display("failed to parse config: {message}"))]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// A configuration value is invalid.
    #[snafu(display("invalid config: {message}"))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },
}

/// Minimum number of entries fetched per iterator batch.
const MIN_SCAN_BATCH_SIZE: usize = 1;

/// Maximum number of entries fetched per iterator batch.
const MAX_SCAN_BATCH_SIZE: usize = 65_536;

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "FEEDARCHIVE";

/// Top-level store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key-value engine configuration.
    #[serde(default)]
    #[builder(default)]
    pub engine: EngineConfig,
    /// Time-ordered id generator configuration.
    #[serde(default)]
    #[builder(default)]
    pub ids: IdGeneratorConfig,
}

impl StoreConfig {
    /// Loads configuration from an optional TOML file plus environment overrides.
    ///
    /// Without a path, `feedarchive.toml` in the working directory is used if
    /// present. The result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be read,
    /// [`ConfigError::Parse`] if the merged sources do not deserialize, and
    /// [`ConfigError::Validation`] if a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = ::config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(::config::File::from(path)),
            None => builder.add_source(::config::File::with_name("feedarchive").required(false)),
        };
        let builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true),
        );

        let merged = builder.build().map_err(|e| ConfigError::Load { message: e.to_string() })?;
        let config: Self =
            merged.try_deserialize().map_err(|e| ConfigError::Parse { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input and
    /// [`ConfigError::Validation`] if a value is out of range.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let merged = ::config::Config::builder()
            .add_source(::config::File::from_str(contents, ::config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigError::Parse { message: e.to_string() })?;
        let config: Self =
            merged.try_deserialize().map_err(|e| ConfigError::Parse { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::Validation`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.ids.validate()
    }
}

/// Which key-value engine backs the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Volatile `BTreeMap` engine, for tests and tooling.
    #[default]
    InMemory,
    /// Persistent redb database file.
    Redb,
}

/// Key-value engine configuration.
///
/// # Validation Rules
///
/// - `path` is required when `backend` is [`BackendKind::Redb`]
/// - `scan_batch_size` must be 1-65536
///
/// # Example
///
/// ```no_run
/// # use feedarchive_types::config::{BackendKind, EngineConfig};
/// let config = EngineConfig::builder()
///     .backend(BackendKind::Redb)
///     .path("/var/lib/feedarchive/store.redb")
///     .scan_batch_size(512)
///     .build()
///     .expect("valid engine config");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine implementation.
    #[serde(default)]
    pub backend: BackendKind,
    /// Database file for persistent backends.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Number of pairs an iterator reads from the engine per batch.
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,
}

#[bon::bon]
impl EngineConfig {
    /// Creates a new engine configuration with validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if:
    /// - `backend` is redb and no `path` is given
    /// - `scan_batch_size` is outside 1-65536
    #[builder]
    pub fn new(
        #[builder(default)] backend: BackendKind,
        #[builder(into)] path: Option<PathBuf>,
        #[builder(default = default_scan_batch_size())] scan_batch_size: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self { backend, path, scan_batch_size };
        config.validate()?;
        Ok(config)
    }
}

impl EngineConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == BackendKind::Redb && self.path.is_none() {
            return Err(ConfigError::Validation {
                message: "engine.path is required for the redb backend".to_string(),
            });
        }
        if !(MIN_SCAN_BATCH_SIZE..=MAX_SCAN_BATCH_SIZE).contains(&self.scan_batch_size) {
            return Err(ConfigError::Validation {
                message: format!(
                    "scan_batch_size must be {}-{}, got {}",
                    MIN_SCAN_BATCH_SIZE, MAX_SCAN_BATCH_SIZE, self.scan_batch_size
                ),
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            scan_batch_size: default_scan_batch_size(),
        }
    }
}

fn default_scan_batch_size() -> usize {
    256
}

/// Time-ordered id generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
pub struct IdGeneratorConfig {
    /// Fixed worker id (0-4095). Drawn from OS entropy when unset.
    #[serde(default)]
    pub worker_id: Option<u16>,
}

impl IdGeneratorConfig {
    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if `worker_id` does not fit in 12 bits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.worker_id {
            Some(id) if u64::from(id) > WORKER_MASK => Err(ConfigError::Validation {
                message: format!("worker_id must be 0-{WORKER_MASK}, got {id}"),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_store_config_defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.backend, BackendKind::InMemory);
        assert_eq!(config.engine.scan_batch_size, 256);
        assert_eq!(config.ids.worker_id, None);
    }

    #[test]
    fn test_engine_config_builder_with_custom_values() {
        let config = EngineConfig::builder()
            .backend(BackendKind::Redb)
            .path("/tmp/feeds.redb")
            .scan_batch_size(32)
            .build()
            .expect("valid config");
        assert_eq!(config.path.as_deref(), Some(Path::new("/tmp/feeds.redb")));
        assert_eq!(config.scan_batch_size, 32);
    }

    #[test]
    fn test_engine_config_redb_requires_path() {
        let result = EngineConfig::builder().backend(BackendKind::Redb).build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("engine.path"));
    }

    #[test]
    fn test_engine_config_scan_batch_size_bounds() {
        assert!(EngineConfig::builder().scan_batch_size(0).build().is_err());
        assert!(EngineConfig::builder().scan_batch_size(1).build().is_ok());
        assert!(EngineConfig::builder().scan_batch_size(65_536).build().is_ok());
        assert!(EngineConfig::builder().scan_batch_size(65_537).build().is_err());
    }

    #[test]
    fn test_id_generator_worker_bounds() {
        assert!(IdGeneratorConfig { worker_id: Some(4095) }.validate().is_ok());
        assert!(IdGeneratorConfig { worker_id: Some(4096) }.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = StoreConfig::from_toml(
            r#"
            [engine]
            backend = "redb"
            path = "/data/feeds.redb"
            scan_batch_size = 1024

            [ids]
            worker_id = 17
            "#,
        )
        .expect("parse config");

        assert_eq!(config.engine.backend, BackendKind::Redb);
        assert_eq!(config.engine.path, Some(PathBuf::from("/data/feeds.redb")));
        assert_eq!(config.engine.scan_batch_size, 1024);
        assert_eq!(config.ids.worker_id, Some(17));
    }

    #[test]
    fn test_from_toml_fills_defaults() {
        let config = StoreConfig::from_toml("[engine]\nbackend = \"in_memory\"\n").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_from_toml_validates() {
        let err = StoreConfig::from_toml("[engine]\nbackend = \"redb\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[ids]\nworker_id = 9").unwrap();

        let config = StoreConfig::load(Some(&path)).expect("load config");
        assert_eq!(config.ids.worker_id, Some(9));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = StoreConfig::load(Some(Path::new("/nonexistent/feedarchive.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }
}
