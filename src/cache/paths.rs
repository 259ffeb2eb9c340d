//! Platform artifact locations inside the cache root
//!
//! Every platform needs exactly two files: a compiled policy module and its
//! data document. Custom bundles use the generic names written by
//! `opa build`, so bundles produced outside this tool can be dropped in as-is.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Directory name of the cache, relative to the working directory
pub const CACHE_DIR_NAME: &str = ".iac-data";

/// Supported infrastructure-as-code platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Kubernetes manifests
    #[value(alias = "k8s")]
    Kubernetes,
    /// Terraform templates
    #[value(alias = "tf")]
    Terraform,
    /// CloudFormation templates
    #[value(name = "cloudformation", alias = "cfn")]
    CloudFormation,
    /// User-supplied rule bundle
    Custom,
}

impl PlatformKind {
    /// All platforms, in display order
    pub fn all() -> &'static [Self] {
        &[
            Self::Kubernetes,
            Self::Terraform,
            Self::CloudFormation,
            Self::Custom,
        ]
    }

    /// File names of the (policy module, data file) pair
    fn file_names(&self) -> (&'static str, &'static str) {
        match self {
            Self::Kubernetes => ("k8s_policy.wasm", "k8s_data.json"),
            Self::Terraform => ("tf_policy.wasm", "tf_data.json"),
            Self::CloudFormation => ("cloudformation_policy.wasm", "cloudformation_data.json"),
            Self::Custom => ("policy.wasm", "data.json"),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Kubernetes => "kubernetes",
            Self::Terraform => "terraform",
            Self::CloudFormation => "cloudformation",
            Self::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// Locations of the two artifacts for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    /// Compiled policy module (`.wasm`)
    pub module_path: PathBuf,
    /// Data document consumed alongside the module (`.json`)
    pub data_path: PathBuf,
}

impl ArtifactPaths {
    /// Whether both files are present on disk
    pub fn exists(&self) -> bool {
        self.module_path.is_file() && self.data_path.is_file()
    }

    /// The paths that are not present on disk
    pub fn missing(&self) -> Vec<&Path> {
        [self.module_path.as_path(), self.data_path.as_path()]
            .into_iter()
            .filter(|p| !p.is_file())
            .collect()
    }
}

/// Absolute path of the cache directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoot {
    path: PathBuf,
}

impl CacheRoot {
    /// Use `dir` itself as the cache root, made absolute against the
    /// current directory if needed
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            path: std::path::absolute(dir)?,
        })
    }

    /// The `.iac-data` directory inside `working_dir`
    pub fn in_dir(working_dir: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(working_dir.as_ref().join(CACHE_DIR_NAME))
    }

    /// The `.iac-data` directory inside the process working directory
    pub fn current() -> io::Result<Self> {
        Self::in_dir(std::env::current_dir()?)
    }

    /// Path of the cache directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Artifact locations for `platform`
    pub fn resolve(&self, platform: PlatformKind) -> ArtifactPaths {
        let (module, data) = platform.file_names();
        ArtifactPaths {
            module_path: self.path.join(module),
            data_path: self.path.join(data),
        }
    }
}
