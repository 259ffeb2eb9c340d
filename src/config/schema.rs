//! Configuration schema for iac-cache
//!
//! Configuration is stored at `~/.config/iac-cache/config.toml`

use crate::source::custom_rules::DEFAULT_API_URL;
use crate::source::DEFAULT_BUNDLE_URL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Default bundle download
    pub bundle: BundleConfig,

    /// Rules API (custom rules)
    pub api: ApiConfig,
}

impl Config {
    /// Check values that parse but cannot work
    pub fn validate(&self) -> Result<(), String> {
        if self.bundle.url.trim().is_empty() {
            return Err("bundle.url must not be empty".to_string());
        }
        if self.api.base_url.trim().is_empty() {
            return Err("api.base_url must not be empty".to_string());
        }
        if !matches!(
            self.general.log_format.to_ascii_lowercase().as_str(),
            "text" | "json"
        ) {
            return Err(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            ));
        }
        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record telemetry events locally
    pub telemetry: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            telemetry: true,
        }
    }
}

impl GeneralConfig {
    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Default bundle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// URL of the gzip-compressed bundle
    pub url: String,

    /// Upper bound on the whole download, 0 disables it
    pub timeout_secs: u64,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BUNDLE_URL.to_string(),
            timeout_secs: 300,
        }
    }
}

impl BundleConfig {
    pub fn timeout(&self) -> Option<Duration> {
        secs_to_timeout(self.timeout_secs)
    }
}

/// Rules API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, `/custom-rules` is appended
    pub base_url: String,

    /// API token sent as a bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Organization whose custom rules are installed by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// Request timeout, 0 disables it
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            org: None,
            timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        secs_to_timeout(self.timeout_secs)
    }
}

fn secs_to_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
