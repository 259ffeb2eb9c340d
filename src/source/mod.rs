//! Archive sources feeding the cache
//!
//! A source only acquires bytes: every stream it returns is still
//! gzip-compressed, and decompression happens in the extraction pipeline.
//!
//! Sources are blocking (`ureq`, `std::fs`); the lifecycle manager drives
//! them from `spawn_blocking` so the read side of the pipeline can stream
//! straight from the socket into the tar reader.

pub mod custom_rules;
pub mod local;
pub mod remote;

pub use custom_rules::ApiCustomRulesSource;
pub use local::LocalArchiveSource;
pub use remote::{RemoteBundleSource, DEFAULT_BUNDLE_URL};

use crate::error::FetchError;
use std::io::Read;
use std::time::Duration;
use ureq::Agent;

/// A gzip-compressed bundle that needs no caller-supplied context
pub trait BundleSource: Send + Sync {
    /// Where the bundle comes from, for logs and error messages
    fn location(&self) -> String;

    /// Open the compressed bundle as a lazy byte stream
    fn fetch(&self) -> Result<Box<dyn Read>, FetchError>;
}

/// Organization-scoped custom rules
pub trait CustomRulesSource: Send + Sync {
    /// Fetch the compressed custom-rules bundle for `organization_id`
    fn fetch(&self, organization_id: Option<&str>) -> Result<Box<dyn Read>, FetchError>;
}

/// Build an agent that reports HTTP status codes instead of failing on them
///
/// Status handling stays with the caller so non-2xx responses can be
/// reported with the URL that produced them.
pub(crate) fn http_agent(timeout: Option<Duration>) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build();
    Agent::new_with_config(config)
}
