//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles file discovery, environment
//! detection and layering of defaults, files and environment variables.

use super::error::{ConfigResult, ConfigurationError};
use super::TransferConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Base name of configuration files inside the configuration directory
pub const CONFIG_FILE_STEM: &str = "sheet-transfer";

/// Prefix of environment variable overrides, e.g. `SHEET_TRANSFER__PIPELINE__BATCH_SIZE`
pub const ENV_PREFIX: &str = "SHEET_TRANSFER";

/// Loaded, validated configuration plus the environment it was resolved for
#[derive(Debug)]
pub struct ConfigManager {
    config: TransferConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(None, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Missing files are fine; defaults and environment variables still apply.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let base = config_directory.join(CONFIG_FILE_STEM);
        let env_override = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}"));

        let builder = Config::builder()
            .add_source(Config::try_from(&TransferConfig::default())?)
            .add_source(File::from(base).required(false))
            .add_source(File::from(env_override).required(false))
            .add_source(Self::environment_source());

        Self::finish(builder.build()?, environment, config_directory)
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from_file(path: &Path, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        if !path.is_file() {
            return Err(ConfigurationError::config_file_not_found(path));
        }

        let builder = Config::builder()
            .add_source(Config::try_from(&TransferConfig::default())?)
            .add_source(File::from(path))
            .add_source(Self::environment_source());

        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::finish(builder.build()?, environment, directory)
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: TransferConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect the runtime environment from environment variables
    pub fn detect_environment() -> String {
        env::var("TRANSFER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("TRANSFER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn environment_source() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(
        merged: Config,
        environment: &str,
        config_directory: PathBuf,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config: TransferConfig =
            merged
                .try_deserialize()
                .map_err(|e| ConfigurationError::DeserializeError {
                    error: e.to_string(),
                })?;

        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&config)
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %environment,
            source_table = %config.source.table_id,
            batch_size = config.pipeline.batch_size,
            chunk_size = config.pipeline.chunk_size,
            max_attempts = config.retry.max_attempts,
            "🔧 Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DestinationPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_directory_layers_environment_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "sheet-transfer.toml",
            r#"
[source]
table_id = "jobs-table"
range = "Config!A2:D"

[pipeline]
batch_size = 5
chunk_size = 500
"#,
        );
        write(
            &dir,
            "sheet-transfer.staging.toml",
            r#"
[pipeline]
chunk_size = 250
destination_policy = "last_row"
"#,
        );

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "staging")
                .unwrap();
        let config = manager.config();

        assert_eq!(manager.environment(), "staging");
        assert_eq!(config.source.table_id, "jobs-table");
        assert_eq!(config.pipeline.batch_size, 5);
        assert_eq!(config.pipeline.chunk_size, 250);
        assert_eq!(config.pipeline.destination_policy, DestinationPolicy::LastRow);
        // Untouched sections keep their defaults
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_from_file_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ConfigManager::load_from_file(&missing, "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::ConfigFileNotFound { .. }));
    }

    #[test]
    fn test_load_from_file_validates() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "bad.toml",
            r#"
[source]
table_id = "jobs-table"

[pipeline]
batch_size = 0
"#,
        );

        let err = ConfigManager::load_from_file(&path, "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        assert!(ConfigManager::from_config(TransferConfig::default(), "test").is_err());
    }
}
