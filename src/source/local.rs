//! Custom rule bundles read from a local `.tar.gz`

use super::BundleSource;
use crate::error::FetchError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

/// A bundle file on disk, typically the output of `opa build`
#[derive(Debug, Clone)]
pub struct LocalArchiveSource {
    path: PathBuf,
}

impl LocalArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BundleSource for LocalArchiveSource {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Box<dyn Read>, FetchError> {
        let file = File::open(&self.path).map_err(|e| FetchError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}
