//! Error types for iac-cache
//!
//! Cache operations return `CacheResult<T>`. The extraction and download
//! layers have their own error types which are wrapped into `CacheError`
//! at the point where the lifecycle manager knows which step failed.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// All errors that can occur while managing the cache
#[derive(Error, Debug)]
pub enum CacheError {
    // Lifecycle errors
    #[error("Failed to initialize local cache at {path}")]
    CacheDirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch custom rules for organization {org}")]
    CustomRulesFetchFailed {
        org: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to extract custom rules from {origin}")]
    CustomRulesExtractionFailed {
        origin: String,
        #[source]
        source: BundleError,
    },

    #[error("Failed to download policies from {url}")]
    DefaultBundleDownloadFailed {
        url: String,
        #[source]
        source: BundleError,
    },

    #[error("Failed to clean local cache at {path}")]
    CacheCleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Numeric error code reported to telemetry
    pub fn code(&self) -> u32 {
        match self {
            Self::CacheDirectoryUnavailable { .. } => 1000,
            Self::CacheCleanupFailed { .. } => 1001,
            Self::DefaultBundleDownloadFailed { .. } => 1002,
            Self::CustomRulesExtractionFailed { .. } => 1003,
            Self::CustomRulesFetchFailed { .. } => 1004,
            Self::ConfigInvalid { .. } | Self::ConfigDirCreate { .. } => 1100,
            Self::Io { .. } | Self::Task(_) => 1200,
            Self::Json(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => 1300,
        }
    }

    /// Stable machine-readable code
    pub fn str_code(&self) -> &'static str {
        match self {
            Self::CacheDirectoryUnavailable { .. } => "FAILED_TO_INIT_LOCAL_CACHE",
            Self::CacheCleanupFailed { .. } => "FAILED_TO_CLEAN_LOCAL_CACHE",
            Self::DefaultBundleDownloadFailed { .. } => "FAILED_TO_DOWNLOAD_RULES",
            Self::CustomRulesExtractionFailed { .. } => "FAILED_TO_EXTRACT_CUSTOM_RULES",
            Self::CustomRulesFetchFailed { .. } => "FAILED_TO_FETCH_CUSTOM_RULES",
            Self::ConfigInvalid { .. } | Self::ConfigDirCreate { .. } => "INVALID_CONFIG",
            Self::Io { .. } | Self::Task(_) => "IO_ERROR",
            Self::Json(_) | Self::TomlParse(_) | Self::TomlSerialize(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Message shown to the user instead of the raw cause
    pub fn user_message(&self) -> String {
        match self {
            Self::CacheDirectoryUnavailable { .. } => "We were unable to create a local directory \
                to store the test assets, please ensure that the current working directory is \
                writable"
                .to_string(),
            Self::CustomRulesFetchFailed { org, .. } => format!(
                "We were unable to fetch the custom rules configured for organization {}",
                org
            ),
            Self::CustomRulesExtractionFailed { origin, .. } => {
                format!("We were unable to extract the rules provided at: {}", origin)
            }
            Self::DefaultBundleDownloadFailed { url, .. } => format!(
                "We were unable to download the security rules, please ensure the network can \
                 access {}",
                url
            ),
            // Cleanup failures are never surfaced to the user
            Self::CacheCleanupFailed { .. } => String::new(),
            other => other.to_string(),
        }
    }

    /// Whether the cache can still be used after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::CustomRulesFetchFailed { .. }
                | Self::CustomRulesExtractionFailed { .. }
                | Self::CacheCleanupFailed { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CacheDirectoryUnavailable { .. } => {
                Some("Check permissions on the working directory or pass --dir")
            }
            Self::DefaultBundleDownloadFailed { .. } => {
                Some("Set --bundle-url (or IAC_CACHE_BUNDLE_URL) to use a mirror")
            }
            Self::CustomRulesFetchFailed { .. } => {
                Some("Check the API token (IAC_CACHE_TOKEN) and organization id")
            }
            Self::ConfigInvalid { .. } => Some("Run: iac-cache config init --force"),
            _ => None,
        }
    }
}

/// Errors raised while unpacking a tar stream
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Malformed archive: {context}")]
    Malformed {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive entry escapes the destination directory: {entry}")]
    PathTraversal { entry: String },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn malformed(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Malformed {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while acquiring an archive stream
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response payload from {url}: {reason}")]
    InvalidPayload { url: String, reason: String },

    #[error("No API token configured")]
    MissingToken,

    #[error("Failed to open {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn transport(url: impl Into<String>, source: ureq::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source: Box::new(source),
        }
    }
}

/// Failure of one fetch-and-extract pass
#[derive(Error, Debug)]
pub enum BundleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}
