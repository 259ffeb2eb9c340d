//! Local policy cache
//!
//! Compiled policy bundles are unpacked into `.iac-data` under the working
//! directory, where the policy engine picks them up by fixed file names.
//!
//! # Precedence
//!
//! | Pass | Source | Overwritten by |
//! |------|--------|----------------|
//! | 1 | Organization custom rules (API) | 2, 3 |
//! | 2 | Local custom rule bundle | 3 |
//! | 3 | Default bundle | - |
//!
//! Files from earlier passes that the later ones don't contain are kept.

pub mod extract;
pub mod manager;
pub mod paths;

pub use extract::{extract, extract_gzip, ExtractSummary};
pub use manager::{CacheManager, InitOptions, InitReport, PassReport};
pub use paths::{ArtifactPaths, CacheRoot, PlatformKind, CACHE_DIR_NAME};
