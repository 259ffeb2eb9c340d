//! Local telemetry for cache operations
//!
//! Writes JSON lines to `<state dir>/iac-cache/telemetry.log`. Events carry
//! the numeric error code of degraded or failed operations so they can be
//! counted without scraping log output.

use crate::config::{schema::Config, ConfigManager};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File-based telemetry sink that appends JSON lines
#[derive(Debug, Clone)]
pub struct Telemetry {
    enabled: bool,
    path: PathBuf,
}

impl Telemetry {
    /// Create a sink from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.telemetry,
            path: ConfigManager::telemetry_log_path(),
        }
    }

    /// Create a sink writing to `path`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    /// A sink that drops every event
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    /// Path of the telemetry log
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an event as a JSON line
    ///
    /// IO failures are logged and dropped; telemetry never fails the
    /// operation being measured.
    pub async fn record(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize telemetry event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write telemetry log: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_json_line() {
        let dir = TempDir::new().unwrap();
        let telemetry = Telemetry::with_path(dir.path().join("telemetry.log"));

        telemetry
            .record(
                "cache.cleanup_failed",
                &serde_json::json!({"error-code": 1001}),
            )
            .await;

        let content = tokio::fs::read_to_string(telemetry.path()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();

        assert_eq!(parsed["event"], "cache.cleanup_failed");
        assert_eq!(parsed["data"]["error-code"], 1001);
        assert!(parsed["timestamp"].is_string());
    }

    #[tokio::test]
    async fn appends_multiple_lines() {
        let dir = TempDir::new().unwrap();
        let telemetry = Telemetry::with_path(dir.path().join("nested/telemetry.log"));

        telemetry.record("event.one", &serde_json::json!({})).await;
        telemetry.record("event.two", &serde_json::json!({})).await;

        let content = tokio::fs::read_to_string(telemetry.path()).await.unwrap();
        assert_eq!(content.trim().lines().count(), 2);
    }

    #[tokio::test]
    async fn skips_when_disabled() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            general: crate::config::schema::GeneralConfig {
                telemetry: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let telemetry = Telemetry {
            path: dir.path().join("telemetry.log"),
            ..Telemetry::new(&config)
        };

        telemetry.record("should.not.appear", &serde_json::json!({})).await;

        assert!(!telemetry.path().exists());
    }
}
