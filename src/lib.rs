//! iac-cache - local policy bundle cache for IaC scanning
//!
//! Downloads compiled policy bundles (a default bundle plus optional
//! organization custom rules) into `.iac-data` and resolves the per-platform
//! artifact paths the policy engine loads.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod source;
pub mod telemetry;
pub mod ui;

pub use error::{CacheError, CacheResult};
