//! Path command - print artifact locations for one platform

use crate::cache::CacheRoot;
use crate::cli::args::{OutputFormat, PathArgs};
use crate::error::CacheResult;
use crate::ui::{self, UiContext};

/// Execute the path command
pub fn execute(args: PathArgs, root: &CacheRoot) -> CacheResult<()> {
    let paths = root.resolve(args.platform);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "platform": args.platform,
                "module": &paths.module_path,
                "data": &paths.data_path,
                "cached": paths.exists(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Plain => {
            println!("{}", paths.module_path.display());
            println!("{}", paths.data_path.display());
        }
        OutputFormat::Table => {
            let ctx = UiContext::detect();
            ui::key_value(&ctx, "platform", &args.platform.to_string());
            ui::key_value_status(
                &ctx,
                "module",
                &paths.module_path.display().to_string(),
                paths.module_path.is_file(),
            );
            ui::key_value_status(
                &ctx,
                "data",
                &paths.data_path.display().to_string(),
                paths.data_path.is_file(),
            );
        }
    }

    Ok(())
}
