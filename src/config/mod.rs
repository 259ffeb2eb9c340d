//! Configuration management for iac-cache

pub mod schema;

pub use schema::Config;

use crate::error::{CacheError, CacheResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("iac-cache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("iac-cache")
    }

    /// Get the telemetry log path
    pub fn telemetry_log_path() -> PathBuf {
        Self::state_dir().join("telemetry.log")
    }

    /// Load the config file, or defaults when there is none
    ///
    /// Command-line and environment overrides are applied by the caller on
    /// top of the returned value. A file that parses but names no bundle
    /// URL, no API URL or an unknown log format is rejected here so the
    /// problem surfaces before any download starts.
    pub async fn load(&self) -> CacheResult<Config> {
        let path = &self.config_path;
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(CacheError::io(
                    format!("reading config from {}", path.display()),
                    e,
                ))
            }
        };

        let config: Config = toml::from_str(&content).map_err(|e| CacheError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        config
            .validate()
            .map_err(|reason| CacheError::ConfigInvalid {
                path: path.clone(),
                reason,
            })?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> CacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            CacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> CacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.bundle.url, crate::source::DEFAULT_BUNDLE_URL);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.api.org = Some("acme".to_string());

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.api.org.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn invalid_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[bundle\nurl = ").await.unwrap();

        let result = ConfigManager::with_path(path).load().await;

        assert!(matches!(result, Err(CacheError::ConfigInvalid { .. })));
    }

    #[tokio::test]
    async fn empty_bundle_url_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[bundle]\nurl = \"\"\n").await.unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();

        match err {
            CacheError::ConfigInvalid { reason, .. } => assert!(reason.contains("bundle.url")),
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_log_format_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[general]\nlog_format = \"xml\"\n")
            .await
            .unwrap();

        let result = ConfigManager::with_path(path).load().await;

        assert!(matches!(result, Err(CacheError::ConfigInvalid { .. })));
    }

    #[tokio::test]
    async fn unreadable_path_is_io_error() {
        let temp = TempDir::new().unwrap();

        // A directory where the file should be
        let result = ConfigManager::with_path(temp.path().to_path_buf())
            .load()
            .await;

        assert!(matches!(result, Err(CacheError::Io { .. })));
    }
}
