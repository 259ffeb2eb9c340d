//! Default policy bundle served from a static URL

use super::{http_agent, BundleSource};
use crate::error::FetchError;
use std::io::Read;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Location of the default bundle for all built-in platforms
pub const DEFAULT_BUNDLE_URL: &str = "https://static.snyk.io/cli/wasm/bundle.tar.gz";

/// Streams the default bundle over HTTP
///
/// One GET per fetch, no retries.
pub struct RemoteBundleSource {
    url: String,
    agent: Agent,
}

impl RemoteBundleSource {
    /// Create a source for `url`; `timeout` bounds the whole transfer
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            agent: http_agent(timeout),
        }
    }
}

impl Default for RemoteBundleSource {
    fn default() -> Self {
        Self::new(DEFAULT_BUNDLE_URL, None)
    }
}

impl BundleSource for RemoteBundleSource {
    fn location(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Box<dyn Read>, FetchError> {
        debug!("Downloading policy bundle from {}", self.url);

        let response = self
            .agent
            .get(&self.url)
            .call()
            .map_err(|e| FetchError::transport(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(Box::new(response.into_body().into_reader()))
    }
}
