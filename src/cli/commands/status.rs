//! Status command - show which platforms are ready to scan

use crate::cache::{CacheRoot, PlatformKind};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::error::CacheResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the status command
pub fn execute(args: StatusArgs, root: &CacheRoot) -> CacheResult<()> {
    let present = root.path().is_dir();
    let platforms: Vec<(PlatformKind, bool)> = PlatformKind::all()
        .iter()
        .map(|p| (*p, root.resolve(*p).exists()))
        .collect();

    match args.format {
        OutputFormat::Json => {
            let entries: Vec<_> = platforms
                .iter()
                .map(|(platform, cached)| {
                    serde_json::json!({ "platform": platform, "cached": cached })
                })
                .collect();
            let json = serde_json::json!({
                "root": root.path(),
                "present": present,
                "platforms": entries,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            for (platform, cached) in &platforms {
                if *cached {
                    println!("{}", platform);
                }
            }
        }
        OutputFormat::Table => print_table(root, present, &platforms),
    }

    Ok(())
}

fn print_table(root: &CacheRoot, present: bool, platforms: &[(PlatformKind, bool)]) {
    let ctx = UiContext::detect();
    println!("{}", style("Policy Cache").bold().cyan());
    ui::key_value(&ctx, "root", &root.path().display().to_string());

    if !present {
        ui::step_warn_hint(&ctx, "Cache not initialized", "Run: iac-cache init");
        return;
    }

    for (platform, cached) in platforms {
        let value = if *cached { "cached" } else { "missing" };
        ui::key_value_status(&ctx, &platform.to_string(), value, *cached);
    }
}
