//! CLI argument definitions using clap derive

use crate::cache::PlatformKind;
use crate::config::Config;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// iac-cache - local policy bundle cache for IaC scanning
///
/// Downloads the compiled policy bundles used to scan Kubernetes,
/// Terraform and CloudFormation files into `.iac-data`.
#[derive(Parser, Debug)]
#[command(name = "iac-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "IAC_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Working directory whose .iac-data cache is managed
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Override the default bundle URL
    #[arg(long, global = true, env = "IAC_CACHE_BUNDLE_URL")]
    pub bundle_url: Option<String>,

    /// Override the rules API base URL
    #[arg(long, global = true, env = "IAC_CACHE_API")]
    pub api_url: Option<String>,

    /// API token for custom rules
    #[arg(long, global = true, env = "IAC_CACHE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl Cli {
    /// Apply command-line and environment overrides on top of the file config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.bundle_url {
            config.bundle.url = url.clone();
        }
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api.token = Some(token.clone());
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download policy bundles into the local cache
    Init(InitArgs),

    /// Delete the local cache
    Clean,

    /// Print artifact paths for a platform
    Path(PathArgs),

    /// Show which platform artifacts are cached
    Status(StatusArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Organization whose custom rules are installed
    #[arg(short, long, env = "IAC_CACHE_ORG")]
    pub org: Option<String>,

    /// Local custom rule bundle (.tar.gz) to install
    #[arg(short, long)]
    pub rules: Option<PathBuf>,
}

/// Arguments for the path command
#[derive(Parser, Debug)]
pub struct PathArgs {
    /// Target platform
    pub platform: PlatformKind,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for path and status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
