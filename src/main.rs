//! iac-cache - local policy bundle cache for IaC scanning
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use iac_cache::cache::CacheRoot;
use iac_cache::cli::{Cli, Commands};
use iac_cache::config::ConfigManager;
use iac_cache::error::{CacheError, CacheResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Command failed: {:?}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e.user_message());
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let mut config = config_manager.load().await?;
    cli.apply_overrides(&mut config);

    // 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("iac_cache=warn"),
        1 => EnvFilter::new("iac_cache=info"),
        _ => EnvFilter::new("iac_cache=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.json_logs() {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Using config {}", config_manager.path().display());

    let root = match &cli.dir {
        Some(dir) => CacheRoot::in_dir(dir),
        None => CacheRoot::current(),
    }
    .map_err(|e| CacheError::io("resolving the working directory", e))?;

    match cli.command {
        Commands::Init(args) => iac_cache::cli::commands::init(args, &config, root).await,
        Commands::Clean => iac_cache::cli::commands::clean(&config, root).await,
        Commands::Path(args) => iac_cache::cli::commands::path(args, &root),
        Commands::Status(args) => iac_cache::cli::commands::status(args, &root),
        Commands::Config(args) => {
            iac_cache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
