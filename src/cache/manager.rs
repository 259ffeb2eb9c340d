//! Cache lifecycle: create, populate, tear down
//!
//! Population is a sequence of extraction passes into the same directory.
//! Custom rules go first and the default bundle last, so on a filename
//! collision the default bundle wins. Each pass is a blocking pipeline
//! (source reader, gzip decoder, tar reader, file writer) run on the
//! blocking pool.

use crate::cache::extract::{extract_gzip, ExtractSummary};
use crate::cache::paths::{ArtifactPaths, CacheRoot, PlatformKind};
use crate::config::Config;
use crate::error::{BundleError, CacheError, CacheResult, FetchError};
use crate::source::{
    ApiCustomRulesSource, BundleSource, CustomRulesSource, LocalArchiveSource,
    RemoteBundleSource,
};
use crate::telemetry::Telemetry;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to install on top of the default bundle
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Organization whose custom rules are fetched from the API
    pub organization_id: Option<String>,
    /// Local custom rule bundle (`.tar.gz`)
    pub custom_rules_path: Option<PathBuf>,
}

/// One completed extraction pass
#[derive(Debug, Clone)]
pub struct PassReport {
    /// Where the archive came from
    pub origin: String,
    pub summary: ExtractSummary,
}

/// Outcome of a successful `initialize`
#[derive(Debug, Default)]
pub struct InitReport {
    /// Custom rule passes that completed, in order
    pub custom_passes: Vec<PassReport>,
    /// The default bundle pass
    pub default_pass: Option<PassReport>,
    /// Custom rule failures that were skipped over
    pub degraded: Vec<CacheError>,
}

impl InitReport {
    /// Whether any custom rule pass failed
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Total files written across all passes
    pub fn files_written(&self) -> usize {
        self.custom_passes
            .iter()
            .chain(self.default_pass.iter())
            .map(|p| p.summary.files)
            .sum()
    }
}

/// Owns one cache root and the sources that populate it
pub struct CacheManager {
    root: CacheRoot,
    bundle: Arc<dyn BundleSource>,
    custom_rules: Arc<dyn CustomRulesSource>,
    telemetry: Telemetry,
}

impl CacheManager {
    /// Create a manager with explicit sources and telemetry disabled
    pub fn new(
        root: CacheRoot,
        bundle: Arc<dyn BundleSource>,
        custom_rules: Arc<dyn CustomRulesSource>,
    ) -> Self {
        Self {
            root,
            bundle,
            custom_rules,
            telemetry: Telemetry::disabled(),
        }
    }

    /// Create a manager backed by the HTTP sources described in `config`
    pub fn from_config(root: CacheRoot, config: &Config) -> Self {
        let bundle = RemoteBundleSource::new(config.bundle.url.clone(), config.bundle.timeout());
        let custom_rules = ApiCustomRulesSource::new(
            config.api.base_url.clone(),
            config.api.token.clone(),
            config.api.timeout(),
        );

        Self::new(root, Arc::new(bundle), Arc::new(custom_rules))
            .with_telemetry(Telemetry::new(config))
    }

    /// Replace the telemetry sink
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// The managed cache root
    pub fn root(&self) -> &CacheRoot {
        &self.root
    }

    /// Artifact locations for `platform` in this cache
    pub fn resolve(&self, platform: PlatformKind) -> ArtifactPaths {
        self.root.resolve(platform)
    }

    /// Create and populate the cache
    ///
    /// Fails only if the directory cannot be created or the default bundle
    /// cannot be installed. Custom rule failures are collected in
    /// `InitReport::degraded`.
    pub async fn initialize(&self, options: &InitOptions) -> CacheResult<InitReport> {
        let root = self.root.path();
        info!("Initializing policy cache at {}", root.display());

        tokio::fs::create_dir_all(root)
            .await
            .map_err(|e| CacheError::CacheDirectoryUnavailable {
                path: root.to_path_buf(),
                source: e,
            })?;

        let mut report = InitReport::default();

        if let Some(org) = &options.organization_id {
            match self.install_org_rules(org).await? {
                Ok(pass) => report.custom_passes.push(pass),
                Err(e) => self.degrade(&mut report, e).await,
            }
        }

        if let Some(path) = &options.custom_rules_path {
            let source = LocalArchiveSource::new(path);
            let origin = source.location();
            match self.run_pass(move || source.fetch()).await? {
                Ok(summary) => report.custom_passes.push(PassReport { origin, summary }),
                Err(e) => {
                    let err = CacheError::CustomRulesExtractionFailed { origin, source: e };
                    self.degrade(&mut report, err).await;
                }
            }
        }

        // Always last so these files win any collision
        let url = self.bundle.location();
        let bundle = Arc::clone(&self.bundle);
        let summary = self
            .run_pass(move || bundle.fetch())
            .await?
            .map_err(|e| CacheError::DefaultBundleDownloadFailed {
                url: url.clone(),
                source: e,
            })?;

        info!(
            "Installed default bundle: {} files from {}",
            summary.files, url
        );
        report.default_pass = Some(PassReport {
            origin: url,
            summary,
        });

        self.telemetry
            .record(
                "cache.initialized",
                &serde_json::json!({
                    "custom-passes": report.custom_passes.len(),
                    "degraded": report.degraded.len(),
                    "files": report.files_written(),
                }),
            )
            .await;

        Ok(report)
    }

    /// Remove the cache directory
    ///
    /// Best effort: a missing directory is fine and any other failure is
    /// only logged and recorded.
    pub async fn teardown(&self) {
        let root = self.root.path();

        match tokio::fs::remove_dir_all(root).await {
            Ok(()) => info!("Removed policy cache at {}", root.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No policy cache at {}", root.display());
            }
            Err(e) => {
                let err = CacheError::CacheCleanupFailed {
                    path: root.to_path_buf(),
                    source: e,
                };
                debug!("The local cache directory could not be deleted: {:?}", err);
                self.telemetry
                    .record(
                        "cache.cleanup_failed",
                        &serde_json::json!({ "error-code": err.code() }),
                    )
                    .await;
            }
        }
    }

    /// Fetch and extract the organization's custom rules
    ///
    /// The outer result carries task failures, the inner one the degraded
    /// custom-rules condition.
    async fn install_org_rules(&self, org: &str) -> CacheResult<Result<PassReport, CacheError>> {
        let source = Arc::clone(&self.custom_rules);
        let org_id = org.to_string();
        let result = self.run_pass(move || source.fetch(Some(&org_id))).await?;

        Ok(match result {
            Ok(summary) => {
                info!("Installed custom rules for {}: {} files", org, summary.files);
                Ok(PassReport {
                    origin: format!("organization {}", org),
                    summary,
                })
            }
            Err(BundleError::Fetch(e)) => Err(CacheError::CustomRulesFetchFailed {
                org: org.to_string(),
                source: e,
            }),
            Err(e @ BundleError::Extract(_)) => Err(CacheError::CustomRulesExtractionFailed {
                origin: format!("organization {}", org),
                source: e,
            }),
        })
    }

    async fn degrade(&self, report: &mut InitReport, err: CacheError) {
        warn!("{}; continuing with the default bundle", err);
        debug!("Custom rules failure detail: {:?}", err);
        self.telemetry
            .record(
                "cache.custom_rules_failed",
                &serde_json::json!({ "error-code": err.code() }),
            )
            .await;
        report.degraded.push(err);
    }

    /// Open a compressed stream and extract it into the root, off the
    /// async runtime
    async fn run_pass<F>(&self, open: F) -> CacheResult<Result<ExtractSummary, BundleError>>
    where
        F: FnOnce() -> Result<Box<dyn Read>, FetchError> + Send + 'static,
    {
        let destination = self.root.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || -> Result<ExtractSummary, BundleError> {
            let stream = open()?;
            Ok(extract_gzip(stream, &destination)?)
        })
        .await?;
        Ok(result)
    }
}
